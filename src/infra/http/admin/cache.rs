use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::{
    application::error::AppError,
    cache::{CacheStatsSnapshot, CleanupLogEntry, EventKind},
};

use super::AdminState;

#[derive(Debug, Deserialize)]
pub(super) struct InvalidateRequest {
    url: String,
}

#[derive(Debug, Serialize)]
struct InvalidateResponse {
    url: String,
    removed: bool,
}

#[derive(Debug, Serialize)]
struct CacheStatusResponse {
    enabled: bool,
    directory: String,
    ttl_seconds: u64,
    stats: CacheStatsSnapshot,
    cleanup_log: Vec<CleanupLogEntry>,
}

pub(super) async fn clear_cache(State(state): State<AdminState>) -> impl IntoResponse {
    Json(state.trigger.clear_all().await)
}

pub(super) async fn invalidate_url(
    State(state): State<AdminState>,
    Json(request): Json<InvalidateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::validation("url must not be empty"));
    }

    let removed = state.trigger.store().invalidate_url(url).await;
    Ok(Json(InvalidateResponse {
        url: url.to_string(),
        removed,
    }))
}

pub(super) async fn dispatch_event(
    State(state): State<AdminState>,
    Json(kind): Json<EventKind>,
) -> impl IntoResponse {
    Json(state.trigger.dispatch(kind).await)
}

pub(super) async fn cache_status(State(state): State<AdminState>) -> impl IntoResponse {
    let store = state.trigger.store();
    Json(CacheStatusResponse {
        enabled: state.cache.enabled,
        directory: store.root().display().to_string(),
        ttl_seconds: store.ttl().as_secs(),
        stats: store.stats(),
        cleanup_log: store.cleanup_log(),
    })
}
