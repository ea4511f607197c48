//! REVU Core - Entity Types
//!
//! Pure data structures shared by every REVU crate. Users, teams, pull
//! requests and reviewer assignments live here together with the error and
//! configuration types. This crate contains no store access and no
//! allocation logic.

mod config;
mod entities;
mod enums;
mod error;

pub use config::*;
pub use entities::*;
pub use enums::*;
pub use error::*;

use chrono::{DateTime, Utc};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// User identifier as supplied by the calling system.
pub type UserId = String;

/// Team identifier. Teams are keyed by their unique name.
pub type TeamName = String;

/// Pull request identifier as supplied by the calling system.
pub type PullRequestId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Maximum number of reviewers concurrently assigned to one pull request.
pub const MAX_REVIEWERS: usize = 2;

/// Current UTC time.
pub fn now() -> Timestamp {
    Utc::now()
}
