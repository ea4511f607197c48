//! In-memory record store.

use crate::RecordStore;
use ::async_trait::async_trait;
use revu_core::{
    now, AssignmentStats, EntityType, PullRequest, PullRequestStatus, ReviewerAssignment,
    RevuResult, StorageError, Team, Timestamp, User,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory store used by tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    teams: Arc<RwLock<HashMap<String, Team>>>,
    pull_requests: Arc<RwLock<HashMap<String, PullRequest>>>,
    // Kept in assignment order.
    reviewers: Arc<RwLock<Vec<ReviewerAssignment>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StorageError> {
    lock.read().map_err(|_| StorageError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StorageError> {
    lock.write().map_err(|_| StorageError::LockPoisoned)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored users.
    pub fn user_count(&self) -> RevuResult<usize> {
        Ok(read(&self.users)?.len())
    }

    /// Get count of stored reviewer assignments.
    pub fn assignment_count(&self) -> RevuResult<usize> {
        Ok(read(&self.reviewers)?.len())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    // === User Operations ===

    async fn user_get(&self, user_id: &str) -> RevuResult<Option<User>> {
        Ok(read(&self.users)?.get(user_id).cloned())
    }

    async fn user_list_by_team(&self, team_name: &str) -> RevuResult<Vec<User>> {
        let users = read(&self.users)?;
        let mut members: Vec<User> = users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            a.username
                .cmp(&b.username)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(members)
    }

    async fn user_set_active(&self, user_id: &str, is_active: bool) -> RevuResult<Option<User>> {
        let mut users = write(&self.users)?;
        Ok(users.get_mut(user_id).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn user_bulk_deactivate(&self, team_name: &str, user_ids: &[String]) -> RevuResult<u64> {
        let mut users = write(&self.users)?;
        let mut changed = 0;
        for user in users.values_mut() {
            if user.is_active && user.team_name == team_name && user_ids.contains(&user.user_id) {
                user.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn user_upsert(&self, user: &User) -> RevuResult<()> {
        write(&self.users)?.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    // === Team Operations ===

    async fn team_get(&self, team_name: &str) -> RevuResult<Option<Team>> {
        Ok(read(&self.teams)?.get(team_name).cloned())
    }

    async fn team_exists(&self, team_name: &str) -> RevuResult<bool> {
        Ok(read(&self.teams)?.contains_key(team_name))
    }

    async fn team_insert(&self, team: &Team) -> RevuResult<()> {
        let mut teams = write(&self.teams)?;
        if teams.contains_key(&team.team_name) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Team,
                reason: format!("team {} already exists", team.team_name),
            }
            .into());
        }
        teams.insert(team.team_name.clone(), team.clone());
        Ok(())
    }

    // === Pull Request Operations ===

    async fn pull_request_get(&self, pull_request_id: &str) -> RevuResult<Option<PullRequest>> {
        Ok(read(&self.pull_requests)?.get(pull_request_id).cloned())
    }

    async fn pull_request_exists(&self, pull_request_id: &str) -> RevuResult<bool> {
        Ok(read(&self.pull_requests)?.contains_key(pull_request_id))
    }

    async fn pull_request_insert(&self, pr: &PullRequest) -> RevuResult<()> {
        let mut pull_requests = write(&self.pull_requests)?;
        if pull_requests.contains_key(&pr.pull_request_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::PullRequest,
                reason: format!("pull request {} already exists", pr.pull_request_id),
            }
            .into());
        }
        pull_requests.insert(pr.pull_request_id.clone(), pr.clone());
        Ok(())
    }

    async fn pull_request_update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<Timestamp>,
    ) -> RevuResult<Option<PullRequest>> {
        let mut pull_requests = write(&self.pull_requests)?;
        Ok(pull_requests.get_mut(pull_request_id).map(|pr| {
            pr.status = status;
            pr.merged_at = merged_at;
            pr.clone()
        }))
    }

    async fn pull_request_list_open_for_reviewer(
        &self,
        user_id: &str,
    ) -> RevuResult<Vec<PullRequest>> {
        let reviewers = read(&self.reviewers)?;
        let pull_requests = read(&self.pull_requests)?;
        let mut open: Vec<PullRequest> = reviewers
            .iter()
            .filter(|a| a.reviewer_user_id == user_id)
            .filter_map(|a| pull_requests.get(&a.pull_request_id))
            .filter(|pr| pr.status == PullRequestStatus::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
        });
        Ok(open)
    }

    // === Reviewer Assignment Operations ===

    async fn reviewer_add(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()> {
        let mut reviewers = write(&self.reviewers)?;
        let exists = reviewers
            .iter()
            .any(|a| a.pull_request_id == pull_request_id && a.reviewer_user_id == user_id);
        if !exists {
            reviewers.push(ReviewerAssignment {
                pull_request_id: pull_request_id.to_string(),
                reviewer_user_id: user_id.to_string(),
                assigned_at: now(),
            });
        }
        Ok(())
    }

    async fn reviewer_remove(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()> {
        write(&self.reviewers)?
            .retain(|a| !(a.pull_request_id == pull_request_id && a.reviewer_user_id == user_id));
        Ok(())
    }

    async fn reviewer_list(&self, pull_request_id: &str) -> RevuResult<Vec<String>> {
        Ok(read(&self.reviewers)?
            .iter()
            .filter(|a| a.pull_request_id == pull_request_id)
            .map(|a| a.reviewer_user_id.clone())
            .collect())
    }

    // === Statistics ===

    async fn assignment_stats(&self) -> RevuResult<AssignmentStats> {
        let mut stats = AssignmentStats::default();
        for assignment in read(&self.reviewers)?.iter() {
            *stats
                .user_assignments
                .entry(assignment.reviewer_user_id.clone())
                .or_default() += 1;
            *stats
                .pr_assignments
                .entry(assignment.pull_request_id.clone())
                .or_default() += 1;
            stats.total_assignments += 1;
        }
        for pr in read(&self.pull_requests)?.values() {
            match pr.status {
                PullRequestStatus::Open => stats.active_prs += 1,
                PullRequestStatus::Merged => stats.merged_prs += 1,
            }
        }
        Ok(stats)
    }
}

// ============================================================================
// TESTS
// ============================================================================
