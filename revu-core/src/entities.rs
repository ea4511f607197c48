//! Core entity structures

use crate::{PullRequestStatus, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// USERS AND TEAMS
// ============================================================================

/// A person who can author pull requests and review them.
///
/// Users are never deleted; they are deactivated. An empty `team_name`
/// means the user is unaffiliated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl User {
    /// Create an active user belonging to `team_name`.
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active: true,
        }
    }

    /// Set the active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn has_team(&self) -> bool {
        !self.team_name.is_empty()
    }

    pub fn is_member_of(&self, team_name: &str) -> bool {
        !team_name.is_empty() && self.team_name == team_name
    }
}

/// A team. Membership is a back-reference from `User::team_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Team {
    pub team_name: String,
}

impl Team {
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
        }
    }
}

/// Team member as seen from the team side (no team name repeated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    /// Materialize the member as a user of `team_name`.
    pub fn into_user(self, team_name: &str) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            team_name: team_name.to_string(),
            is_active: self.is_active,
        }
    }
}

impl From<&User> for TeamMember {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            is_active: user.is_active,
        }
    }
}

/// A team together with its members, ordered by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TeamWithMembers {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

// ============================================================================
// PULL REQUESTS
// ============================================================================

/// A unit of proposed change requiring reviewer sign-off.
///
/// `merged_at` is set if and only if `status` is `Merged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub merged_at: Option<Timestamp>,
}

impl PullRequest {
    /// Create a new open pull request.
    pub fn open(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            created_at,
            merged_at: None,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}

/// Listing view of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

impl From<&PullRequest> for PullRequestShort {
    fn from(pr: &PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id.clone(),
            pull_request_name: pr.pull_request_name.clone(),
            author_id: pr.author_id.clone(),
            status: pr.status,
        }
    }
}

/// Pull request with its reviewers ordered by assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PullRequestWithReviewers {
    #[serde(flatten)]
    pub pull_request: PullRequest,
    pub assigned_reviewers: Vec<String>,
}

impl PullRequestWithReviewers {
    pub fn new(pull_request: PullRequest, assigned_reviewers: Vec<UserId>) -> Self {
        Self {
            pull_request,
            assigned_reviewers,
        }
    }
}

// ============================================================================
// REVIEWER ASSIGNMENTS
// ============================================================================

/// Edge between a pull request and a reviewing user.
///
/// Keyed by `(pull_request_id, reviewer_user_id)`; `assigned_at` orders the
/// reviewers of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewerAssignment {
    pub pull_request_id: String,
    pub reviewer_user_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub assigned_at: Timestamp,
}

/// Aggregate assignment counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignmentStats {
    /// Number of assignments per reviewer.
    pub user_assignments: HashMap<String, u64>,
    /// Number of reviewers per pull request.
    pub pr_assignments: HashMap<String, u64>,
    pub total_assignments: u64,
    /// Pull requests in `OPEN` status.
    pub active_prs: u64,
    pub merged_prs: u64,
}
