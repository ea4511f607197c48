//! OpenAPI document for REVU API
//!
//! Generated with utoipa from the route annotations and schema derives.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorBody, ErrorCode};
use crate::routes::{health, pull_request, stats, team, users};

use revu_core::{
    AssignmentStats, PullRequest, PullRequestShort, PullRequestStatus, PullRequestWithReviewers,
    TeamMember, TeamWithMembers, User,
};

/// OpenAPI document for REVU API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "REVU API",
        version = "0.1.0",
        description = "Reviewer assignment for pull requests",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Teams", description = "Teams and bulk deactivation"),
        (name = "Users", description = "User activity and review lists"),
        (name = "Pull Requests", description = "Pull request lifecycle and reviewer assignment"),
        (name = "Statistics", description = "Assignment counters"),
        (name = "Health", description = "Liveness"),
    ),
    paths(
        team::add_team,
        team::get_team,
        team::mass_deactivate,
        users::set_is_active,
        users::get_review,
        pull_request::create_pull_request,
        pull_request::merge_pull_request,
        pull_request::reassign,
        pull_request::add_reviewer,
        stats::get_stats,
        health::liveness,
    ),
    components(schemas(
        ApiError,
        ErrorBody,
        ErrorCode,
        User,
        TeamMember,
        TeamWithMembers,
        PullRequest,
        PullRequestShort,
        PullRequestStatus,
        PullRequestWithReviewers,
        AssignmentStats,
        team::TeamResponse,
        team::BulkDeactivateRequest,
        team::BulkDeactivateResponse,
        users::SetIsActiveRequest,
        users::UserResponse,
        users::UserReviewsResponse,
        pull_request::CreatePullRequestRequest,
        pull_request::CreatePullRequestResponse,
        pull_request::MergePullRequestRequest,
        pull_request::PullRequestResponse,
        pull_request::ReassignRequest,
        pull_request::ReassignResponse,
        pull_request::AddReviewerRequest,
        pull_request::AddReviewerResponse,
        health::HealthResponse,
        health::HealthStatus,
    ))
)]
pub struct ApiDoc;
