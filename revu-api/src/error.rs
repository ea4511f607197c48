//! Error Types for REVU API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum naming every failure a client can observe
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Errors are serialized as `{"error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use revu_core::{AllocationError, RevuError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Request Errors (400)
    // ========================================================================
    /// Request body or query is malformed or missing a field
    ValidationError,

    /// A team with the same name already exists
    TeamExists,

    /// Pull request already has the maximum number of reviewers
    MaxReviewers,

    /// Inactive users cannot be assigned
    UserInactive,

    /// Authors cannot review their own pull request
    AuthorSelfReview,

    /// User is already a reviewer of the pull request
    AlreadyAssigned,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested user, team or pull request does not exist
    NotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// A pull request with the same id already exists
    PrExists,

    /// Pull request is merged and can no longer change
    PrMerged,

    /// User is not a reviewer of the pull request
    NotAssigned,

    /// No active replacement reviewer exists
    NoCandidate,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::TeamExists
            | ErrorCode::MaxReviewers
            | ErrorCode::UserInactive
            | ErrorCode::AuthorSelfReview
            | ErrorCode::AlreadyAssigned => StatusCode::BAD_REQUEST,

            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::PrExists
            | ErrorCode::PrMerged
            | ErrorCode::NotAssigned
            | ErrorCode::NoCandidate => StatusCode::CONFLICT,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::TeamExists => "team_name already exists",
            ErrorCode::MaxReviewers => "Pull request already has maximum reviewers",
            ErrorCode::UserInactive => "Cannot assign inactive user as reviewer",
            ErrorCode::AuthorSelfReview => "Cannot assign author as reviewer",
            ErrorCode::AlreadyAssigned => "User is already assigned as reviewer",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::PrExists => "PR id already exists",
            ErrorCode::PrMerged => "Cannot modify merged pull request",
            ErrorCode::NotAssigned => "Reviewer is not assigned to this pull request",
            ErrorCode::NoCandidate => "No active replacement candidate in team",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Envelope the error is wrapped in on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: ApiError,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::validation(format!("{} is required", field))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody { error: self });
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<&AllocationError> for ErrorCode {
    fn from(err: &AllocationError) -> Self {
        match err {
            AllocationError::UserNotFound { .. }
            | AllocationError::TeamNotFound { .. }
            | AllocationError::PullRequestNotFound { .. }
            | AllocationError::AuthorUnresolvable { .. } => ErrorCode::NotFound,
            AllocationError::PullRequestMerged { .. } => ErrorCode::PrMerged,
            AllocationError::ReviewerNotAssigned { .. } => ErrorCode::NotAssigned,
            // A reviewer without a team has nobody to be replaced by.
            AllocationError::ReviewerHasNoTeam { .. }
            | AllocationError::NoCandidateAvailable { .. } => ErrorCode::NoCandidate,
            AllocationError::ReviewerCapReached { .. } => ErrorCode::MaxReviewers,
            AllocationError::UserInactive { .. } => ErrorCode::UserInactive,
            AllocationError::AuthorSelfReview { .. } => ErrorCode::AuthorSelfReview,
            AllocationError::AlreadyAssigned { .. } => ErrorCode::AlreadyAssigned,
            AllocationError::TeamExists { .. } => ErrorCode::TeamExists,
            AllocationError::PullRequestExists { .. } => ErrorCode::PrExists,
        }
    }
}

impl From<RevuError> for ApiError {
    fn from(err: RevuError) -> Self {
        match err {
            RevuError::Allocation(err) => ApiError::new(ErrorCode::from(&err), err.to_string()),
            RevuError::Validation(err) => ApiError::validation(err.to_string()),
            RevuError::Storage(err) => {
                tracing::error!(error = %err, "Storage error");
                ApiError::from_code(ErrorCode::InternalError)
            }
            RevuError::Config(err) => {
                tracing::error!(error = %err, "Configuration error");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);

        // Generic message to avoid leaking internal details
        ApiError::database_error("Database operation failed")
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use revu_core::{StorageError, ValidationError};

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::TeamExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::PrMerged.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::NoCandidate.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_allocation_error_mapping() {
        let cases = [
            (
                AllocationError::PullRequestNotFound {
                    pull_request_id: "pr-1".to_string(),
                },
                ErrorCode::NotFound,
            ),
            (
                AllocationError::ReviewerNotAssigned {
                    pull_request_id: "pr-1".to_string(),
                    user_id: "u1".to_string(),
                },
                ErrorCode::NotAssigned,
            ),
            (
                AllocationError::ReviewerHasNoTeam {
                    user_id: "u1".to_string(),
                },
                ErrorCode::NoCandidate,
            ),
            (
                AllocationError::ReviewerCapReached {
                    pull_request_id: "pr-1".to_string(),
                    max: 2,
                },
                ErrorCode::MaxReviewers,
            ),
            (
                AllocationError::PullRequestExists {
                    pull_request_id: "pr-1".to_string(),
                },
                ErrorCode::PrExists,
            ),
        ];
        for (err, code) in cases {
            let api: ApiError = RevuError::from(err).into();
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn test_storage_error_is_hidden() {
        let err: ApiError = RevuError::from(StorageError::QueryFailed {
            entity_type: revu_core::EntityType::User,
            reason: "relation \"users\" does not exist".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("relation"));
    }

    #[test]
    fn test_validation_error_mapping() {
        let err: ApiError = RevuError::from(ValidationError::RequiredFieldMissing {
            field: "author_id".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("author_id"));
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let body = ErrorBody {
            error: ApiError::from_code(ErrorCode::PrExists),
        };
        let json = serde_json::to_value(&body)?;
        assert_eq!(json["error"]["code"], "PR_EXISTS");
        assert_eq!(json["error"]["message"], "PR id already exists");

        let deserialized: ErrorBody = serde_json::from_value(json)?;
        assert_eq!(deserialized, body);
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::database_error("Connection failed");
        let display = format!("{}", err);

        assert!(display.contains("DatabaseError"));
        assert!(display.contains("Connection failed"));
    }
}
