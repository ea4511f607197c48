//! Cascade reassignment on bulk deactivation.

use crate::AllocationEngine;
use revu_core::{PullRequest, RevuResult};
use std::time::{Duration, Instant};

/// Result of a bulk team deactivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeactivation {
    pub team_name: String,
    /// Active team members switched to inactive by this call.
    pub deactivated_users: u64,
    /// Open pull requests that lost a reviewer, in processing order, without
    /// duplicates. Each one either got a replacement or ended a reviewer short.
    pub touched_pull_requests: Vec<String>,
    pub processing_time: Duration,
}

impl AllocationEngine {
    /// Deactivate `user_ids` within `team_name` and move their open reviews
    /// to other members of each pull request author's team.
    ///
    /// Only requested users that belong to the team are processed. Any store
    /// failure aborts the call; writes made before the failure stay.
    pub async fn handle_bulk_deactivation(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> RevuResult<BulkDeactivation> {
        let started = Instant::now();

        let deactivated_users = self
            .store
            .user_bulk_deactivate(team_name, user_ids)
            .await?;
        let members = self.store.user_list_by_team(team_name).await?;

        let mut processed: Vec<&str> = Vec::new();
        let mut touched_pull_requests: Vec<String> = Vec::new();
        for user_id in user_ids {
            if processed.contains(&user_id.as_str())
                || !members.iter().any(|m| &m.user_id == user_id)
            {
                continue;
            }
            processed.push(user_id);

            for pr in self
                .store
                .pull_request_list_open_for_reviewer(user_id)
                .await?
            {
                if self.replace_departed_reviewer(&pr, user_id).await?
                    && !touched_pull_requests.contains(&pr.pull_request_id)
                {
                    touched_pull_requests.push(pr.pull_request_id);
                }
            }
        }

        let processing_time = started.elapsed();
        tracing::info!(
            team = team_name,
            deactivated_users,
            touched = touched_pull_requests.len(),
            elapsed_ms = processing_time.as_millis() as u64,
            "Bulk deactivation completed"
        );

        Ok(BulkDeactivation {
            team_name: team_name.to_string(),
            deactivated_users,
            touched_pull_requests,
            processing_time,
        })
    }

    /// Swap `departed` out of `pr`. Returns `false` when the pull request
    /// changed underneath and there was nothing to do.
    async fn replace_departed_reviewer(&self, pr: &PullRequest, departed: &str) -> RevuResult<bool> {
        let _guard = self.locks.acquire(&pr.pull_request_id).await;

        let current = self.store.reviewer_list(&pr.pull_request_id).await?;
        if !current.iter().any(|r| r == departed) {
            return Ok(false);
        }
        match self.store.pull_request_get(&pr.pull_request_id).await? {
            Some(latest) if !latest.is_merged() => {}
            _ => return Ok(false),
        }

        let replacement = self.first_replacement(pr, departed, &current).await?;

        self.store
            .reviewer_remove(&pr.pull_request_id, departed)
            .await?;
        match replacement {
            Some(new_reviewer) => {
                self.store
                    .reviewer_add(&pr.pull_request_id, &new_reviewer)
                    .await?;
                tracing::info!(
                    pull_request_id = %pr.pull_request_id,
                    old_reviewer_id = departed,
                    new_reviewer_id = %new_reviewer,
                    "Moved review off deactivated user"
                );
            }
            None => {
                tracing::warn!(
                    pull_request_id = %pr.pull_request_id,
                    old_reviewer_id = departed,
                    "No replacement for deactivated reviewer; pull request left short"
                );
            }
        }
        Ok(true)
    }

    /// First qualifying member of the author's team, in team order.
    async fn first_replacement(
        &self,
        pr: &PullRequest,
        departed: &str,
        current: &[String],
    ) -> RevuResult<Option<String>> {
        let Some(author) = self.store.user_get(&pr.author_id).await? else {
            return Ok(None);
        };
        if !author.has_team() {
            return Ok(None);
        }

        let members = self.store.user_list_by_team(&author.team_name).await?;
        Ok(members
            .into_iter()
            .find(|m| {
                m.is_active
                    && m.user_id != pr.author_id
                    && m.user_id != departed
                    && !current.contains(&m.user_id)
            })
            .map(|m| m.user_id))
    }
}
