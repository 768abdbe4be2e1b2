//! Reverse proxy to the storefront origin.
//!
//! Requests are buffered and replayed against the origin. Responses come
//! back uncompressed so the page cache can inspect and store the markup.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;
use url::Url;

use crate::{
    application::error::{AppError, HttpError},
    config::OriginSettings,
    infra::error::InfraError,
};

const SOURCE: &str = "infra::origin";

static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Debug, Clone)]
pub struct OriginProxy {
    client: reqwest::Client,
    base: Url,
    max_request_bytes: usize,
}

impl OriginProxy {
    pub fn new(settings: &OriginSettings) -> Result<Self, InfraError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| InfraError::configuration(format!("origin client: {err}")))?;

        Ok(Self {
            client,
            base: settings.url.clone(),
            max_request_bytes: usize::try_from(settings.max_request_bytes.get())
                .unwrap_or(usize::MAX),
        })
    }

    /// Origin URL for a request path and query.
    pub fn target(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.base.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{path}"));
        url.set_query(query);
        url
    }

    /// Replay `request` against the origin and return its buffered response.
    pub async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, self.max_request_bytes)
            .await
            .map_err(|err| AppError::validation(format!("request body rejected: {err}")))?;

        let url = self.target(parts.uri.path(), parts.uri.query());
        let mut headers = forwardable(&parts.headers);
        headers.remove(header::HOST);
        headers.remove(header::ACCEPT_ENCODING);
        if let Some(host) = parts.headers.get(header::HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }

        debug!(
            target = SOURCE,
            op = "forward",
            method = %parts.method,
            url = %url,
            "forwarding request to origin"
        );

        let upstream = self
            .client
            .request(parts.method, url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|err| InfraError::upstream(format!("{url}: {err}")))?;

        let status = upstream.status();
        let headers = forwardable(upstream.headers());
        let body = upstream
            .bytes()
            .await
            .map_err(|err| InfraError::upstream(format!("{url}: body: {err}")))?;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Fallback handler for every public path the accelerator does not own.
pub async fn proxy_to_origin(State(proxy): State<OriginProxy>, request: Request) -> Response {
    match proxy.forward(request).await {
        Ok(response) => response,
        Err(AppError::Validation(message)) => HttpError::new(
            "infra::origin::proxy_to_origin",
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
            message,
        )
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Copy of `headers` without hop-by-hop fields and framing.
fn forwardable(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroU64, time::Duration};

    use axum::http::HeaderValue;

    use super::*;

    fn proxy(base: &str) -> OriginProxy {
        OriginProxy::new(&OriginSettings {
            url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(1),
            max_request_bytes: NonZeroU64::new(16).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn target_keeps_origin_prefix_and_query() {
        let proxy = proxy("http://origin.internal:8000/store/");
        assert_eq!(
            proxy.target("/product/widget/", Some("color=red")).as_str(),
            "http://origin.internal:8000/store/product/widget/?color=red"
        );
        assert_eq!(
            proxy.target("/", None).as_str(),
            "http://origin.internal:8000/store/"
        );
    }

    #[test]
    fn forwardable_drops_hop_by_hop_and_keeps_repeats() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let out = forwardable(&headers);
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(out.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_forwarding() {
        let proxy = proxy("http://127.0.0.1:9/");
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/checkout/")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let response = proxy_to_origin(State(proxy), request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unreachable_origin_is_bad_gateway() {
        let proxy = proxy("http://127.0.0.1:9/");
        let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = proxy_to_origin(State(proxy), request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
