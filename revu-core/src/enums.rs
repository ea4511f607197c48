//! Enum types for REVU entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity type discriminator used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    User,
    Team,
    PullRequest,
    ReviewerAssignment,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::User => "User",
            EntityType::Team => "Team",
            EntityType::PullRequest => "PullRequest",
            EntityType::ReviewerAssignment => "ReviewerAssignment",
        };
        write!(f, "{}", value)
    }
}

/// Status of a pull request.
///
/// The only transition is `Open -> Merged`; merged pull requests never
/// reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    /// Database representation (`OPEN` / `MERGED`).
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "OPEN",
            PullRequestStatus::Merged => "MERGED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, PullRequestStatusParseError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(PullRequestStatus::Open),
            "MERGED" => Ok(PullRequestStatus::Merged),
            _ => Err(PullRequestStatusParseError(s.to_string())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PullRequestStatus::Merged)
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for PullRequestStatus {
    type Err = PullRequestStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid pull request status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestStatusParseError(pub String);

impl fmt::Display for PullRequestStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid pull request status: {}", self.0)
    }
}

impl std::error::Error for PullRequestStatusParseError {}
