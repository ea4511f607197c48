//! User REST API Routes
//!
//! Activity toggling and the list of open reviews assigned to a user.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use revu_core::{PullRequestShort, User};
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
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ReviewQuery {
    pub user_id: String,
}

/// Open pull requests a user reviews, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /users/setIsActive - Toggle a user's active flag
///
/// Existing reviewer assignments are left in place.
#[utoipa::path(
    post,
    path = "/users/setIsActive",
    tag = "Users",
    request_body = SetIsActiveRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
    ),
)]
pub async fn set_is_active(
    State(engine): State<Arc<AllocationEngine>>,
    ValidJson(req): ValidJson<SetIsActiveRequest>,
) -> ApiResult<Json<UserResponse>> {
    require("user_id", &req.user_id)?;
    let user = engine.set_user_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/getReview - Open pull requests assigned to a reviewer
#[utoipa::path(
    get,
    path = "/users/getReview",
    tag = "Users",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Open reviews", body = UserReviewsResponse),
        (status = 400, description = "Missing user_id", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
    ),
)]
pub async fn get_review(
    State(engine): State<Arc<AllocationEngine>>,
    ValidQuery(query): ValidQuery<ReviewQuery>,
) -> ApiResult<Json<UserReviewsResponse>> {
    require("user_id", &query.user_id)?;
    let reviews = engine.reviews_for(&query.user_id).await?;
    Ok(Json(UserReviewsResponse {
        user_id: reviews.user_id,
        pull_requests: reviews.pull_requests,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the user routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/setIsActive", post(set_is_active))
        .route("/getReview", get(get_review))
}
