use axum::{Router, middleware};

use crate::{
    cache::{CacheState, response_cache_layer},
    infra::origin::{OriginProxy, proxy_to_origin},
};

use super::middleware::{log_responses, set_request_context};

/// Public storefront router: every path goes to the origin, through the
/// page cache.
pub fn build_public_router(cache: CacheState, origin: OriginProxy) -> Router {
    Router::new()
        .fallback(proxy_to_origin)
        .with_state(origin)
        .layer(middleware::from_fn_with_state(cache, response_cache_layer))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
