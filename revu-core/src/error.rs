//! Error types for REVU operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Query failed for {entity_type:?}: {reason}")]
    QueryFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Coarse classification shared by every allocation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    NoCandidateAvailable,
    Internal,
}

/// Domain failures of the allocation engine and the operations around it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Team not found: {team_name}")]
    TeamNotFound { team_name: String },

    #[error("Pull request not found: {pull_request_id}")]
    PullRequestNotFound { pull_request_id: String },

    #[error("Author {author_id} cannot be resolved: {reason}")]
    AuthorUnresolvable { author_id: String, reason: String },

    #[error("Cannot modify merged pull request {pull_request_id}")]
    PullRequestMerged { pull_request_id: String },

    #[error("Reviewer {user_id} is not assigned to pull request {pull_request_id}")]
    ReviewerNotAssigned {
        pull_request_id: String,
        user_id: String,
    },

    #[error("Reviewer {user_id} has no team")]
    ReviewerHasNoTeam { user_id: String },

    #[error("No active replacement candidate in team {team_name}")]
    NoCandidateAvailable { team_name: String },

    #[error("Pull request {pull_request_id} already has the maximum of {max} reviewers")]
    ReviewerCapReached { pull_request_id: String, max: usize },

    #[error("User {user_id} is inactive")]
    UserInactive { user_id: String },

    #[error("Author {user_id} cannot review their own pull request")]
    AuthorSelfReview { user_id: String },

    #[error("User {user_id} is already assigned to pull request {pull_request_id}")]
    AlreadyAssigned {
        pull_request_id: String,
        user_id: String,
    },

    #[error("Team already exists: {team_name}")]
    TeamExists { team_name: String },

    #[error("Pull request already exists: {pull_request_id}")]
    PullRequestExists { pull_request_id: String },
}

impl AllocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AllocationError::UserNotFound { .. }
            | AllocationError::TeamNotFound { .. }
            | AllocationError::PullRequestNotFound { .. }
            | AllocationError::AuthorUnresolvable { .. } => ErrorKind::NotFound,
            AllocationError::NoCandidateAvailable { .. } => ErrorKind::NoCandidateAvailable,
            AllocationError::PullRequestMerged { .. }
            | AllocationError::ReviewerNotAssigned { .. }
            | AllocationError::ReviewerHasNoTeam { .. }
            | AllocationError::ReviewerCapReached { .. }
            | AllocationError::UserInactive { .. }
            | AllocationError::AuthorSelfReview { .. }
            | AllocationError::AlreadyAssigned { .. }
            | AllocationError::TeamExists { .. }
            | AllocationError::PullRequestExists { .. } => ErrorKind::Conflict,
        }
    }
}

/// Master error type for all REVU errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevuError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl RevuError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RevuError::Allocation(err) => err.kind(),
            RevuError::Validation(_) => ErrorKind::Validation,
            RevuError::Storage(_) | RevuError::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for REVU operations.
pub type RevuResult<T> = Result<T, RevuError>;

// =============================================================================
// TESTS
// =============================================================================
