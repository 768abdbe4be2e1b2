//! Page cache middleware.
//!
//! Wraps the origin handler: answers eligible requests from disk, and on a
//! miss renders through the origin, buffers the body, runs the post-render
//! safety check and hands the bytes to the store.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use metrics::counter;
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig,
    gate::{RequestContext, SafetyGate},
    store::{CachedPage, ResponseStore, format_timestamp},
};

/// Observability header carrying `HIT <timestamp>` or `MISS`.
pub const CACHE_STATUS_HEADER: &str = "x-vitrine-cache";
pub(crate) const METRIC_CACHE_BYPASS: &str = "vitrine_cache_bypass_total";

const MISS: &str = "MISS";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub gate: Arc<SafetyGate>,
    pub store: Arc<ResponseStore>,
}

impl CacheState {
    pub fn new(config: CacheConfig) -> Self {
        let gate = Arc::new(SafetyGate::new(&config));
        let store = Arc::new(ResponseStore::new(&config));
        Self {
            config,
            gate,
            store,
        }
    }

    pub fn with_store(config: CacheConfig, store: Arc<ResponseStore>) -> Self {
        Self {
            gate: Arc::new(SafetyGate::new(&config)),
            config,
            store,
        }
    }
}

/// Middleware for the on-disk page cache.
///
/// Only anonymous GET requests for HTML pages are served from or written to
/// the cache; everything else passes straight through to the origin.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled {
        return next.run(request).await;
    }

    let context = RequestContext::from_request(request.method(), request.uri(), request.headers());

    if let Some(reason) = cache.gate.rejection(&context) {
        debug!(
            cache = "page",
            outcome = "bypass",
            reason = reason.as_str(),
            "request not eligible for cache"
        );
        counter!(METRIC_CACHE_BYPASS, "reason" => reason.as_str()).increment(1);
        return next.run(request).await;
    }

    let key = context.key();

    if let Some(page) = cache.store.try_serve(&key).await {
        debug!(cache = "page", outcome = "hit", key = key.digest(), "serving cached page");
        return hit_response(page);
    }

    debug!(cache = "page", outcome = "miss", "cache miss, rendering through origin");

    let response = next.run(request).await;

    if response.status() != StatusCode::OK || !is_html(response.headers()) {
        cache.store.record_skipped();
        return with_status_header(response, HeaderValue::from_static(MISS));
    }

    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(
                cache = "page",
                op = "buffer_body",
                error = %err,
                "failed to buffer rendered body"
            );
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let rendered = context.with_response_cookies(&parts.headers);
    if bytes.len() > cache.config.body_limit_bytes {
        debug!(
            cache = "page",
            outcome = "skip",
            reason = "too_large",
            body_len = bytes.len(),
            "rendered body exceeds cache limit"
        );
        cache.store.record_skipped();
    } else if let Some(reason) = cache.gate.store_rejection(&bytes, parts.status, &rendered) {
        debug!(
            cache = "page",
            outcome = "skip",
            reason = reason.as_str(),
            "rendered response not cacheable"
        );
        cache.store.record_skipped();
    } else {
        cache.store.capture(&key, &bytes).await;
    }

    let response = Response::from_parts(parts, Body::from(bytes));
    with_status_header(response, HeaderValue::from_static(MISS))
}

fn hit_response(page: CachedPage) -> Response {
    let marker = format!("HIT {}", format_timestamp(page.captured_at));
    let status = HeaderValue::from_str(&marker).unwrap_or_else(|_| HeaderValue::from_static("HIT"));

    let mut response = Response::new(Body::from(page.body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(HTML_CONTENT_TYPE),
    );
    with_status_header(response, status)
}

fn with_status_header(mut response: Response, value: HeaderValue) -> Response {
    response.headers_mut().insert(CACHE_STATUS_HEADER, value);
    response
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .get(..9)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/html"))
        })
}
