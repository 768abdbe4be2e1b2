use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::application::error::HttpError;

use super::AdminState;

#[derive(Debug, Deserialize)]
pub(super) struct AutoRequest {
    enabled: bool,
}

pub(super) async fn prewarm_start(
    State(state): State<AdminState>,
) -> Result<impl IntoResponse, HttpError> {
    let snapshot = state.prewarm.start().await?;
    Ok(Json(snapshot))
}

pub(super) async fn prewarm_stop(State(state): State<AdminState>) -> impl IntoResponse {
    Json(state.prewarm.stop().await)
}

pub(super) async fn prewarm_status(State(state): State<AdminState>) -> impl IntoResponse {
    Json(state.prewarm.snapshot().await)
}

pub(super) async fn prewarm_auto(
    State(state): State<AdminState>,
    Json(request): Json<AutoRequest>,
) -> impl IntoResponse {
    Json(state.prewarm.set_auto(request.enabled).await)
}
