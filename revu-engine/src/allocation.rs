//! Allocation engine: initial assignment, reassignment and backfill.

use crate::eligibility::eligible;
use crate::locks::PullRequestLocks;
use crate::selector::{selector_from_config, CandidateSelector};
use revu_core::{AllocationConfig, AllocationError, PullRequest, RevuResult, MAX_REVIEWERS};
use revu_storage::RecordStore;
use std::fmt;
use std::sync::Arc;

/// Outcome of the shortfall backfill that follows a reassignment.
///
/// Backfill never fails the enclosing reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// The pull request did not end with exactly one reviewer.
    NotNeeded,
    /// A second reviewer was attached.
    Added(String),
    /// Nobody on the author's team qualified.
    NoCandidate,
    /// Lookup or persist failed; the reason is kept for reporting.
    Failed(String),
}

/// Result of replacing one reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub pull_request_id: String,
    pub replaced: String,
    pub replaced_by: String,
    pub backfill: BackfillOutcome,
}

/// Entry point for every reviewer allocation flow.
///
/// Holds the record store, the candidate selector and the per-pull-request
/// lock map. Lifecycle, directory and cascade operations are implemented on
/// this type in their own modules.
pub struct AllocationEngine {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) selector: Arc<dyn CandidateSelector>,
    pub(crate) locks: PullRequestLocks,
}

impl fmt::Debug for AllocationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationEngine")
            .field("selector", &self.selector)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl AllocationEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        selector: Arc<dyn CandidateSelector>,
        config: &AllocationConfig,
    ) -> Self {
        Self {
            store,
            selector,
            locks: PullRequestLocks::new(config.serialize_pull_requests),
        }
    }

    /// Build an engine whose selector follows `config.selector_seed`.
    pub fn from_config(store: Arc<dyn RecordStore>, config: &AllocationConfig) -> Self {
        Self::new(store, selector_from_config(config), config)
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // ========================================================================
    // INITIAL ASSIGNMENT
    // ========================================================================

    /// Attach up to two reviewers from the author's team.
    ///
    /// An empty pool is a success with no reviewers. A failed persist aborts
    /// the call; reviewers attached before the failure stay attached.
    pub async fn assign_initial(&self, pr: &PullRequest) -> RevuResult<Vec<String>> {
        let _guard = self.locks.acquire(&pr.pull_request_id).await;
        self.assign_initial_locked(pr).await
    }

    pub(crate) async fn assign_initial_locked(&self, pr: &PullRequest) -> RevuResult<Vec<String>> {
        let author = self
            .store
            .user_get(&pr.author_id)
            .await?
            .ok_or_else(|| AllocationError::AuthorUnresolvable {
                author_id: pr.author_id.clone(),
                reason: "author not found".to_string(),
            })?;
        if !author.has_team() {
            return Err(AllocationError::AuthorUnresolvable {
                author_id: author.user_id,
                reason: "author has no team".to_string(),
            }
            .into());
        }

        let current = self.store.reviewer_list(&pr.pull_request_id).await?;
        let open_slots = MAX_REVIEWERS.saturating_sub(current.len());
        let mut exclude: Vec<&str> = current.iter().map(String::as_str).collect();
        exclude.push(&author.user_id);

        let pool = eligible(self.store.as_ref(), &author.team_name, &exclude).await?;
        if pool.is_empty() || open_slots == 0 {
            tracing::warn!(
                pull_request_id = %pr.pull_request_id,
                team = %author.team_name,
                open_slots,
                "No reviewers available for initial assignment"
            );
            return Ok(Vec::new());
        }

        let mut attached = Vec::new();
        for reviewer in self.selector.select(pool, open_slots) {
            self.store
                .reviewer_add(&pr.pull_request_id, &reviewer.user_id)
                .await?;
            attached.push(reviewer.user_id);
        }

        tracing::info!(
            pull_request_id = %pr.pull_request_id,
            reviewers = ?attached,
            "Assigned initial reviewers"
        );
        Ok(attached)
    }

    // ========================================================================
    // REASSIGNMENT
    // ========================================================================

    /// Replace `old_reviewer_id` with a random eligible member of the old
    /// reviewer's team.
    ///
    /// Reviewers already on the pull request are not excluded from the pool,
    /// so the replacement may be the other current reviewer. In that case the
    /// pull request drops to one reviewer and the backfill tops it up.
    pub async fn reassign_one(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> RevuResult<Reassignment> {
        let _guard = self.locks.acquire(pull_request_id).await;

        let pr = self
            .store
            .pull_request_get(pull_request_id)
            .await?
            .ok_or_else(|| AllocationError::PullRequestNotFound {
                pull_request_id: pull_request_id.to_string(),
            })?;
        if pr.is_merged() {
            return Err(AllocationError::PullRequestMerged {
                pull_request_id: pull_request_id.to_string(),
            }
            .into());
        }

        let reviewers = self.store.reviewer_list(pull_request_id).await?;
        if !reviewers.iter().any(|r| r == old_reviewer_id) {
            return Err(AllocationError::ReviewerNotAssigned {
                pull_request_id: pull_request_id.to_string(),
                user_id: old_reviewer_id.to_string(),
            }
            .into());
        }

        let old_reviewer = self
            .store
            .user_get(old_reviewer_id)
            .await?
            .ok_or_else(|| AllocationError::UserNotFound {
                user_id: old_reviewer_id.to_string(),
            })?;
        if !old_reviewer.has_team() {
            return Err(AllocationError::ReviewerHasNoTeam {
                user_id: old_reviewer_id.to_string(),
            }
            .into());
        }

        let pool = eligible(
            self.store.as_ref(),
            &old_reviewer.team_name,
            &[pr.author_id.as_str(), old_reviewer_id],
        )
        .await?;
        let no_candidate = || AllocationError::NoCandidateAvailable {
            team_name: old_reviewer.team_name.clone(),
        };
        if pool.is_empty() {
            return Err(no_candidate().into());
        }
        let replacement = self
            .selector
            .select(pool, 1)
            .into_iter()
            .next()
            .ok_or_else(no_candidate)?;

        self.store
            .reviewer_remove(pull_request_id, old_reviewer_id)
            .await?;
        if let Err(err) = self
            .store
            .reviewer_add(pull_request_id, &replacement.user_id)
            .await
        {
            if let Err(restore_err) = self
                .store
                .reviewer_add(pull_request_id, old_reviewer_id)
                .await
            {
                tracing::error!(
                    pull_request_id,
                    old_reviewer_id,
                    error = %restore_err,
                    "Failed to restore reviewer after failed reassignment"
                );
            }
            return Err(err);
        }

        tracing::info!(
            pull_request_id,
            old_reviewer_id,
            new_reviewer_id = %replacement.user_id,
            "Reassigned reviewer"
        );

        let current = self.store.reviewer_list(pull_request_id).await?;
        let backfill = match current.as_slice() {
            [sole] => self.backfill(&pr, sole).await,
            _ => BackfillOutcome::NotNeeded,
        };

        Ok(Reassignment {
            pull_request_id: pull_request_id.to_string(),
            replaced: old_reviewer_id.to_string(),
            replaced_by: replacement.user_id,
            backfill,
        })
    }

    /// Top a pull request with a single reviewer back up to two, drawing from
    /// the author's team.
    async fn backfill(&self, pr: &PullRequest, sole_reviewer: &str) -> BackfillOutcome {
        let outcome = match self.try_backfill(pr, sole_reviewer).await {
            Ok(Some(user_id)) => BackfillOutcome::Added(user_id),
            Ok(None) => BackfillOutcome::NoCandidate,
            Err(err) => BackfillOutcome::Failed(err.to_string()),
        };
        match &outcome {
            BackfillOutcome::Added(user_id) => {
                tracing::info!(pull_request_id = %pr.pull_request_id, reviewer = %user_id, "Backfilled second reviewer");
            }
            BackfillOutcome::NoCandidate => {
                tracing::warn!(pull_request_id = %pr.pull_request_id, "No candidate to backfill second reviewer");
            }
            BackfillOutcome::Failed(reason) => {
                tracing::warn!(pull_request_id = %pr.pull_request_id, reason = %reason, "Backfill failed");
            }
            BackfillOutcome::NotNeeded => {}
        }
        outcome
    }

    async fn try_backfill(&self, pr: &PullRequest, sole_reviewer: &str) -> RevuResult<Option<String>> {
        let author = self
            .store
            .user_get(&pr.author_id)
            .await?
            .ok_or_else(|| AllocationError::AuthorUnresolvable {
                author_id: pr.author_id.clone(),
                reason: "author not found".to_string(),
            })?;
        if !author.has_team() {
            return Err(AllocationError::AuthorUnresolvable {
                author_id: author.user_id,
                reason: "author has no team".to_string(),
            }
            .into());
        }

        let pool = eligible(
            self.store.as_ref(),
            &author.team_name,
            &[author.user_id.as_str(), sole_reviewer],
        )
        .await?;
        let Some(pick) = self.selector.select(pool, 1).into_iter().next() else {
            return Ok(None);
        };
        self.store
            .reviewer_add(&pr.pull_request_id, &pick.user_id)
            .await?;
        Ok(Some(pick.user_id))
    }
}
