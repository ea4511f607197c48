//! REVU Test Utilities
//!
//! Centralized test infrastructure for the REVU workspace:
//! - Fault-injecting record store
//! - Proptest generators for entity types and team rosters
//! - Test fixtures for common scenarios
//! - Custom assertions for allocation invariants

// Re-export the in-memory store from its source crate
pub use revu_storage::{InMemoryStore, RecordStore};

// Re-export core types for convenience
pub use revu_core::{
    now, AllocationError, AssignmentStats, EntityType, ErrorKind, PullRequest, PullRequestStatus,
    RevuError, RevuResult, StorageError, Team, TeamMember, Timestamp, User, MAX_REVIEWERS,
};

use async_trait::async_trait;
use std::sync::Mutex;

// ============================================================================
// FAULT-INJECTING STORE
// ============================================================================

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    UserGet,
    UserListByTeam,
    UserBulkDeactivate,
    UserUpsert,
    PullRequestInsert,
    PullRequestListOpenForReviewer,
    ReviewerAdd,
    ReviewerRemove,
    ReviewerList,
}

impl FaultPoint {
    fn entity_type(self) -> EntityType {
        match self {
            FaultPoint::UserGet
            | FaultPoint::UserListByTeam
            | FaultPoint::UserBulkDeactivate
            | FaultPoint::UserUpsert => EntityType::User,
            FaultPoint::PullRequestInsert | FaultPoint::PullRequestListOpenForReviewer => {
                EntityType::PullRequest
            }
            FaultPoint::ReviewerAdd | FaultPoint::ReviewerRemove | FaultPoint::ReviewerList => {
                EntityType::ReviewerAssignment
            }
        }
    }
}

#[derive(Debug)]
struct Fault {
    point: FaultPoint,
    user_id: Option<String>,
    passes_left: usize,
}

/// `InMemoryStore` wrapper that fails selected operations.
///
/// A fault lets a number of matching calls through, then fails every
/// matching call after that. Faults can be narrowed to one user ID.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    faults: Mutex<Vec<Fault>>,
}

impl FaultyStore {
    /// The wrapped store, for seeding and inspection without faults.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Fail every call to `point`.
    pub fn fail_on(&self, point: FaultPoint) {
        self.push(point, None, 0);
    }

    /// Let `passes` calls to `point` succeed, then fail the rest.
    pub fn fail_after(&self, point: FaultPoint, passes: usize) {
        self.push(point, None, passes);
    }

    /// Fail calls to `point` that concern `user_id`.
    pub fn fail_for_user(&self, point: FaultPoint, user_id: &str) {
        self.push(point, Some(user_id.to_string()), 0);
    }

    /// Remove every fault.
    pub fn heal(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    fn push(&self, point: FaultPoint, user_id: Option<String>, passes_left: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(Fault {
                point,
                user_id,
                passes_left,
            });
        }
    }

    fn check(&self, point: FaultPoint, user_id: Option<&str>) -> RevuResult<()> {
        let mut faults = self.faults.lock().map_err(|_| StorageError::LockPoisoned)?;
        for fault in faults.iter_mut().filter(|f| f.point == point) {
            if fault.user_id.is_some() && fault.user_id.as_deref() != user_id {
                continue;
            }
            if fault.passes_left > 0 {
                fault.passes_left -= 1;
                continue;
            }
            return Err(StorageError::QueryFailed {
                entity_type: point.entity_type(),
                reason: format!("injected failure at {point:?}"),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn user_get(&self, user_id: &str) -> RevuResult<Option<User>> {
        self.check(FaultPoint::UserGet, Some(user_id))?;
        self.inner.user_get(user_id).await
    }

    async fn user_list_by_team(&self, team_name: &str) -> RevuResult<Vec<User>> {
        self.check(FaultPoint::UserListByTeam, None)?;
        self.inner.user_list_by_team(team_name).await
    }

    async fn user_set_active(&self, user_id: &str, is_active: bool) -> RevuResult<Option<User>> {
        self.inner.user_set_active(user_id, is_active).await
    }

    async fn user_bulk_deactivate(&self, team_name: &str, user_ids: &[String]) -> RevuResult<u64> {
        self.check(FaultPoint::UserBulkDeactivate, None)?;
        self.inner.user_bulk_deactivate(team_name, user_ids).await
    }

    async fn user_upsert(&self, user: &User) -> RevuResult<()> {
        self.check(FaultPoint::UserUpsert, Some(&user.user_id))?;
        self.inner.user_upsert(user).await
    }

    async fn team_get(&self, team_name: &str) -> RevuResult<Option<Team>> {
        self.inner.team_get(team_name).await
    }

    async fn team_exists(&self, team_name: &str) -> RevuResult<bool> {
        self.inner.team_exists(team_name).await
    }

    async fn team_insert(&self, team: &Team) -> RevuResult<()> {
        self.inner.team_insert(team).await
    }

    async fn pull_request_get(&self, pull_request_id: &str) -> RevuResult<Option<PullRequest>> {
        self.inner.pull_request_get(pull_request_id).await
    }

    async fn pull_request_exists(&self, pull_request_id: &str) -> RevuResult<bool> {
        self.inner.pull_request_exists(pull_request_id).await
    }

    async fn pull_request_insert(&self, pr: &PullRequest) -> RevuResult<()> {
        self.check(FaultPoint::PullRequestInsert, None)?;
        self.inner.pull_request_insert(pr).await
    }

    async fn pull_request_update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<Timestamp>,
    ) -> RevuResult<Option<PullRequest>> {
        self.inner
            .pull_request_update_status(pull_request_id, status, merged_at)
            .await
    }

    async fn pull_request_list_open_for_reviewer(
        &self,
        user_id: &str,
    ) -> RevuResult<Vec<PullRequest>> {
        self.check(FaultPoint::PullRequestListOpenForReviewer, Some(user_id))?;
        self.inner.pull_request_list_open_for_reviewer(user_id).await
    }

    async fn reviewer_add(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()> {
        self.check(FaultPoint::ReviewerAdd, Some(user_id))?;
        self.inner.reviewer_add(pull_request_id, user_id).await
    }

    async fn reviewer_remove(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()> {
        self.check(FaultPoint::ReviewerRemove, Some(user_id))?;
        self.inner.reviewer_remove(pull_request_id, user_id).await
    }

    async fn reviewer_list(&self, pull_request_id: &str) -> RevuResult<Vec<String>> {
        self.check(FaultPoint::ReviewerList, None)?;
        self.inner.reviewer_list(pull_request_id).await
    }

    async fn assignment_stats(&self) -> RevuResult<AssignmentStats> {
        self.inner.assignment_stats().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating REVU entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a team roster of `1..=max` members with unique IDs.
    ///
    /// Member `m0` is always active so it can author pull requests.
    pub fn arb_roster(max: usize) -> impl Strategy<Value = Vec<TeamMember>> {
        prop::collection::vec(("[a-z]{2,8}", any::<bool>()), 1..=max.max(1)).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, active))| TeamMember {
                    user_id: format!("m{i}"),
                    username: name,
                    is_active: active || i == 0,
                })
                .collect()
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Upsert `members` as users of `team_name`, creating the team first.
    pub async fn seed_team(
        store: &dyn RecordStore,
        team_name: &str,
        members: &[(&str, &str, bool)],
    ) -> RevuResult<()> {
        store.team_insert(&Team::new(team_name)).await?;
        for (user_id, username, is_active) in members {
            store
                .user_upsert(&User::new(*user_id, *username, team_name).with_active(*is_active))
                .await?;
        }
        Ok(())
    }

    /// Insert an open pull request and attach `reviewers` in order.
    pub async fn seed_pull_request(
        store: &dyn RecordStore,
        pull_request_id: &str,
        author_id: &str,
        reviewers: &[&str],
    ) -> RevuResult<PullRequest> {
        let pr = PullRequest::open(pull_request_id, "Test change", author_id, now());
        store.pull_request_insert(&pr).await?;
        for reviewer in reviewers {
            store.reviewer_add(pull_request_id, reviewer).await?;
        }
        Ok(pr)
    }

    /// Team `t` with author `a` and active reviewers `r1..=rn`.
    pub async fn author_and_reviewers(store: &dyn RecordStore, n: usize) -> RevuResult<()> {
        let ids: Vec<String> = (1..=n).map(|i| format!("r{i}")).collect();
        let mut members = vec![("a", "author", true)];
        members.extend(ids.iter().map(|id| (id.as_str(), id.as_str(), true)));
        seed_team(store, "t", &members).await
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for REVU-specific validation.

    use super::*;

    /// Assert that a RevuResult failed with the given kind.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &RevuResult<T>, kind: ErrorKind) {
        match result {
            Err(err) => assert_eq!(err.kind(), kind, "Wrong kind for {err}"),
            Ok(value) => panic!("Expected {kind:?} error, got Ok({value:?})"),
        }
    }

    /// Check the reviewer invariants of one pull request: at most
    /// `MAX_REVIEWERS`, no duplicates, author never reviewing.
    pub async fn check_reviewer_invariants(
        store: &dyn RecordStore,
        pull_request_id: &str,
    ) -> Result<(), String> {
        let pr = store
            .pull_request_get(pull_request_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("pull request {pull_request_id} missing"))?;
        let reviewers = store
            .reviewer_list(pull_request_id)
            .await
            .map_err(|e| e.to_string())?;

        if reviewers.len() > MAX_REVIEWERS {
            return Err(format!(
                "{pull_request_id} has {} reviewers: {reviewers:?}",
                reviewers.len()
            ));
        }
        if reviewers.iter().any(|r| *r == pr.author_id) {
            return Err(format!("{pull_request_id} is reviewed by its author"));
        }
        let mut unique = reviewers.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != reviewers.len() {
            return Err(format!("{pull_request_id} has duplicate reviewers: {reviewers:?}"));
        }
        Ok(())
    }
}
