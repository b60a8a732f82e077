use axum::{
    extract::{Query, State},
    Extension, Json,
};
use beatscope_db::{EntityTable, StoredEntity};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

const DEFAULT_ORDER: &str = "-created_at";

#[derive(Debug, Deserialize)]
pub(super) struct EntityListQuery {
    pub limit: Option<i64>,
    /// `[-]field`; a leading `-` sorts descending.
    pub order: Option<String>,
}

async fn list(
    state: &AppState,
    req_id: RequestId,
    table: EntityTable,
    query: EntityListQuery,
) -> Result<Json<ApiResponse<Vec<StoredEntity>>>, ApiError> {
    let order = query.order.as_deref().unwrap_or(DEFAULT_ORDER);
    let rows = state
        .store
        .list(table, order, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, rows)))
}

pub(super) async fn list_artists(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<EntityListQuery>,
) -> Result<Json<ApiResponse<Vec<StoredEntity>>>, ApiError> {
    list(&state, req_id, EntityTable::Artists, query).await
}

pub(super) async fn list_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<EntityListQuery>,
) -> Result<Json<ApiResponse<Vec<StoredEntity>>>, ApiError> {
    list(&state, req_id, EntityTable::Keywords, query).await
}
