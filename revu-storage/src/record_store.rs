//! Async record store trait.
//!
//! Every allocation flow reads and writes through this trait. Implementations
//! give read-your-writes within one call but no transactional isolation
//! across calls.

use ::async_trait::async_trait;
use revu_core::{
    AssignmentStats, PullRequest, PullRequestStatus, RevuResult, Team, Timestamp, User,
};

/// Persistence for users, teams, pull requests and reviewer assignments.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Get a user by ID.
    async fn user_get(&self, user_id: &str) -> RevuResult<Option<User>>;

    /// List the members of a team ordered by username.
    async fn user_list_by_team(&self, team_name: &str) -> RevuResult<Vec<User>>;

    /// Set the active flag. Returns the updated user, or `None` if unknown.
    async fn user_set_active(&self, user_id: &str, is_active: bool) -> RevuResult<Option<User>>;

    /// Deactivate every listed user that belongs to `team_name`.
    ///
    /// Returns the number of users whose flag actually changed. Users outside
    /// the team or already inactive are left untouched and not counted.
    async fn user_bulk_deactivate(&self, team_name: &str, user_ids: &[String]) -> RevuResult<u64>;

    /// Insert a user or overwrite name, team and active flag of an existing one.
    async fn user_upsert(&self, user: &User) -> RevuResult<()>;

    // ========================================================================
    // TEAM OPERATIONS
    // ========================================================================

    async fn team_get(&self, team_name: &str) -> RevuResult<Option<Team>>;

    async fn team_exists(&self, team_name: &str) -> RevuResult<bool>;

    /// Insert a new team. Fails if the name is taken.
    async fn team_insert(&self, team: &Team) -> RevuResult<()>;

    // ========================================================================
    // PULL REQUEST OPERATIONS
    // ========================================================================

    async fn pull_request_get(&self, pull_request_id: &str) -> RevuResult<Option<PullRequest>>;

    async fn pull_request_exists(&self, pull_request_id: &str) -> RevuResult<bool>;

    /// Insert a new pull request. Fails if the ID is taken.
    async fn pull_request_insert(&self, pr: &PullRequest) -> RevuResult<()>;

    /// Overwrite status and merge time. Returns the updated pull request.
    async fn pull_request_update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<Timestamp>,
    ) -> RevuResult<Option<PullRequest>>;

    /// Open pull requests the user reviews, newest first.
    async fn pull_request_list_open_for_reviewer(
        &self,
        user_id: &str,
    ) -> RevuResult<Vec<PullRequest>>;

    // ========================================================================
    // REVIEWER ASSIGNMENT OPERATIONS
    // ========================================================================

    /// Attach a reviewer. Attaching an existing pair is a no-op.
    async fn reviewer_add(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()>;

    /// Detach a reviewer. Detaching a missing pair is a no-op.
    async fn reviewer_remove(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()>;

    /// Reviewer IDs ordered by assignment time.
    async fn reviewer_list(&self, pull_request_id: &str) -> RevuResult<Vec<String>>;

    // ========================================================================
    // STATISTICS
    // ========================================================================

    async fn assignment_stats(&self) -> RevuResult<AssignmentStats>;
}
