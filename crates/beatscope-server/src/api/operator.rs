//! Operator actions: an on-demand collection cycle and clearing the
//! video source's demo-mode latch.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CollectAccepted {
    status: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct SourceState {
    demo_mode: bool,
}

pub(super) async fn trigger_collection(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<CollectAccepted>>), ApiError> {
    if !state.collector.spawn_cycle() {
        return Err(ApiError::new(
            req_id.0,
            "already_running",
            "a collection cycle is already in progress",
        ));
    }
    tracing::info!(request_id = %req_id.0, "operator triggered collection cycle");
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(req_id.0, CollectAccepted { status: "started" })),
    ))
}

/// Without a configured API key the source stays in demo mode.
pub(super) async fn reset_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SourceState>> {
    let source = state.collector.source();
    source.reset_to_live();
    let demo_mode = source.is_demo_mode();
    tracing::info!(request_id = %req_id.0, demo_mode, "operator reset video source");
    Json(ApiResponse::new(req_id.0, SourceState { demo_mode }))
}
