//! Pull Request REST API Routes
//!
//! Creation with automatic reviewer assignment, merge, single-reviewer
//! reassignment and manual reviewer addition.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use revu_core::PullRequestWithReviewers;
use revu_engine::{AllocationEngine, BackfillOutcome};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{require, ValidJson},
    state::AppState,
};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatePullRequestResponse {
    pub pr: PullRequestWithReviewers,
    /// Set when reviewer assignment failed after the pull request was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PullRequestResponse {
    pub pr: PullRequestWithReviewers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReassignResponse {
    pub pr: PullRequestWithReviewers,
    pub replaced_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddReviewerRequest {
    pub reviewer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddReviewerResponse {
    pub message: String,
    pub pr: PullRequestWithReviewers,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /pullRequest/create - Create a pull request and assign reviewers
///
/// A failed assignment still returns 201 with a `warning`.
#[utoipa::path(
    post,
    path = "/pullRequest/create",
    tag = "Pull Requests",
    request_body = CreatePullRequestRequest,
    responses(
        (status = 201, description = "Pull request created", body = CreatePullRequestResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Author not found", body = ApiError),
        (status = 409, description = "Pull request exists", body = ApiError),
    ),
)]
pub async fn create_pull_request(
    State(engine): State<Arc<AllocationEngine>>,
    ValidJson(req): ValidJson<CreatePullRequestRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = engine
        .create_pull_request(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePullRequestResponse {
            pr: created.pull_request,
            warning: created.warning,
        }),
    ))
}

/// POST /pullRequest/merge - Merge a pull request (idempotent)
#[utoipa::path(
    post,
    path = "/pullRequest/merge",
    tag = "Pull Requests",
    request_body = MergePullRequestRequest,
    responses(
        (status = 200, description = "Pull request merged", body = PullRequestResponse),
        (status = 404, description = "Pull request not found", body = ApiError),
    ),
)]
pub async fn merge_pull_request(
    State(engine): State<Arc<AllocationEngine>>,
    ValidJson(req): ValidJson<MergePullRequestRequest>,
) -> ApiResult<Json<PullRequestResponse>> {
    require("pull_request_id", &req.pull_request_id)?;
    let pr = engine.merge_pull_request(&req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign - Replace one reviewer
#[utoipa::path(
    post,
    path = "/pullRequest/reassign",
    tag = "Pull Requests",
    request_body = ReassignRequest,
    responses(
        (status = 200, description = "Reviewer replaced", body = ReassignResponse),
        (status = 404, description = "Pull request or user not found", body = ApiError),
        (status = 409, description = "Merged, not assigned or no candidate", body = ApiError),
    ),
)]
pub async fn reassign(
    State(engine): State<Arc<AllocationEngine>>,
    ValidJson(req): ValidJson<ReassignRequest>,
) -> ApiResult<Json<ReassignResponse>> {
    require("pull_request_id", &req.pull_request_id)?;
    require("old_user_id", &req.old_user_id)?;

    let result = engine
        .reassign_one(&req.pull_request_id, &req.old_user_id)
        .await?;
    if let BackfillOutcome::Failed(reason) = &result.backfill {
        tracing::warn!(
            pull_request_id = %result.pull_request_id,
            reason = %reason,
            "Reassignment left pull request short of reviewers"
        );
    }

    let pr = engine.pull_request_view(&req.pull_request_id).await?;
    Ok(Json(ReassignResponse {
        pr,
        replaced_by: result.replaced_by,
    }))
}

/// POST /api/pull-requests/{id}/reviewers - Attach a specific reviewer
#[utoipa::path(
    post,
    path = "/api/pull-requests/{id}/reviewers",
    tag = "Pull Requests",
    params(("id" = String, Path, description = "Pull request ID")),
    request_body = AddReviewerRequest,
    responses(
        (status = 200, description = "Reviewer added", body = AddReviewerResponse),
        (status = 400, description = "Cap reached, inactive, author or duplicate", body = ApiError),
        (status = 404, description = "Pull request or user not found", body = ApiError),
        (status = 409, description = "Pull request merged", body = ApiError),
    ),
)]
pub async fn add_reviewer(
    State(engine): State<Arc<AllocationEngine>>,
    Path(pull_request_id): Path<String>,
    ValidJson(req): ValidJson<AddReviewerRequest>,
) -> ApiResult<Json<AddReviewerResponse>> {
    require("reviewer_id", &req.reviewer_id)?;
    let pr = engine.add_reviewer(&pull_request_id, &req.reviewer_id).await?;
    Ok(Json(AddReviewerResponse {
        message: "Reviewer added successfully".to_string(),
        pr,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Routes under `/pullRequest`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_pull_request))
        .route("/merge", post(merge_pull_request))
        .route("/reassign", post(reassign))
}

/// Routes under `/api/pull-requests`.
pub fn create_reviewer_router() -> Router<AppState> {
    Router::new().route("/:id/reviewers", post(add_reviewer))
}
