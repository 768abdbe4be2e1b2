mod cache;
mod health;
mod prewarm;
mod state;

pub use state::AdminState;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::middleware::{log_responses, set_request_context};

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/cache/clear", post(cache::clear_cache))
        .route("/cache/invalidate", post(cache::invalidate_url))
        .route("/cache/status", get(cache::cache_status))
        .route("/cache/health", get(health::cache_health))
        .route("/events", post(cache::dispatch_event))
        .route("/prewarm/start", post(prewarm::prewarm_start))
        .route("/prewarm/stop", post(prewarm::prewarm_stop))
        .route("/prewarm/status", get(prewarm::prewarm_status))
        .route("/prewarm/auto", put(prewarm::prewarm_auto))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
