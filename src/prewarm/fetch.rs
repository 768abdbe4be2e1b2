//! Page fetching for prewarm runs.
//!
//! Each queued path is requested through the accelerator's own public
//! listener so the response flows through the normal capture path.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

const USER_AGENT: &str = concat!("vitrine-prewarm/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid prewarm url `{path}`: {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to `{url}` timed out")]
    Timeout { url: String },
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
    #[error("`{url}` answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl FetchError {
    /// Label for the fetch outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } | Self::Client(_) => "invalid",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
        }
    }
}

/// Requests one page so it lands in the cache.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `path` and return the response status on success.
    async fn fetch(&self, path: &str) -> Result<u16, FetchError>;
}

/// Anonymous HTTP GETs against a base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self { client, base })
    }

    fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|source| FetchError::InvalidUrl {
                path: path.to_string(),
                source,
            })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<u16, FetchError> {
        let url = self.resolve(path)?;
        let classify = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: err.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        // Drain the body so the origin render and capture run to completion.
        response.bytes().await.map_err(classify)?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(status.as_u16())
    }
}
