//! Statistics REST API Route

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use revu_core::AssignmentStats;
use revu_engine::AllocationEngine;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// GET /api/stats - Assignment counters
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Statistics",
    responses(
        (status = 200, description = "Assignment statistics", body = AssignmentStats),
        (status = 500, description = "Store failure", body = ApiError),
    ),
)]
pub async fn get_stats(
    State(engine): State<Arc<AllocationEngine>>,
) -> ApiResult<Json<AssignmentStats>> {
    Ok(Json(engine.stats().await?))
}

/// Create the statistics router.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
