use axum::{extract::State, Extension, Json};
use beatscope_collector::TrendPredictions;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

/// Never fails: a store outage yields the default prediction set.
pub(super) async fn next_trending(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<TrendPredictions>> {
    let predictions = state.insights.predict_next_trending().await;
    Json(ApiResponse::new(req_id.0, predictions))
}
