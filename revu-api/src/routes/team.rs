//! Team REST API Routes
//!
//! Team creation, lookup and bulk deactivation of members.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use revu_core::TeamWithMembers;
use revu_engine::AllocationEngine;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{require, ValidJson, ValidQuery},
    state::AppState,
};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TeamResponse {
    pub team: TeamWithMembers,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct TeamQuery {
    pub team_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkDeactivateRequest {
    pub team_name: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkDeactivateResponse {
    /// Requested team members that were active before the call.
    pub deactivated_users: u64,
    /// Pull requests whose reviewer set changed, without duplicates.
    pub reassigned_prs: Vec<String>,
    pub processing_time_ms: u64,
    pub message: String,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /team/add - Create a team with its members
#[utoipa::path(
    post,
    path = "/team/add",
    tag = "Teams",
    request_body = TeamWithMembers,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Invalid request or team exists", body = ApiError),
    ),
)]
pub async fn add_team(
    State(engine): State<Arc<AllocationEngine>>,
    ValidJson(req): ValidJson<TeamWithMembers>,
) -> ApiResult<impl IntoResponse> {
    let team = engine.create_team(&req.team_name, req.members).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get - Get a team with members ordered by username
#[utoipa::path(
    get,
    path = "/team/get",
    tag = "Teams",
    params(TeamQuery),
    responses(
        (status = 200, description = "Team found", body = TeamWithMembers),
        (status = 400, description = "Missing team_name", body = ApiError),
        (status = 404, description = "Team not found", body = ApiError),
    ),
)]
pub async fn get_team(
    State(engine): State<Arc<AllocationEngine>>,
    ValidQuery(query): ValidQuery<TeamQuery>,
) -> ApiResult<Json<TeamWithMembers>> {
    require("team_name", &query.team_name)?;
    Ok(Json(engine.get_team(&query.team_name).await?))
}

/// POST /team/massDeactivate - Deactivate members and move their reviews
#[utoipa::path(
    post,
    path = "/team/massDeactivate",
    tag = "Teams",
    request_body = BulkDeactivateRequest,
    responses(
        (status = 200, description = "Users deactivated", body = BulkDeactivateResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 500, description = "Store failure part way through", body = ApiError),
    ),
)]
pub async fn mass_deactivate(
    State(engine): State<Arc<AllocationEngine>>,
    ValidJson(req): ValidJson<BulkDeactivateRequest>,
) -> ApiResult<Json<BulkDeactivateResponse>> {
    require("team_name", &req.team_name)?;

    let result = engine
        .handle_bulk_deactivation(&req.team_name, &req.user_ids)
        .await?;

    Ok(Json(BulkDeactivateResponse {
        deactivated_users: result.deactivated_users,
        reassigned_prs: result.touched_pull_requests,
        processing_time_ms: u64::try_from(result.processing_time.as_millis()).unwrap_or(u64::MAX),
        message: "Bulk deactivation completed successfully".to_string(),
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the team routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_team))
        .route("/get", get(get_team))
        .route("/massDeactivate", post(mass_deactivate))
}
