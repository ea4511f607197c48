//! Pull request lifecycle: create, merge, manual reviewer add.

use crate::AllocationEngine;
use revu_core::{
    now, AllocationError, PullRequest, PullRequestStatus, PullRequestWithReviewers, RevuResult,
    ValidationError, MAX_REVIEWERS,
};

/// A freshly created pull request and the outcome of its initial assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPullRequest {
    pub pull_request: PullRequestWithReviewers,
    /// Set when automatic assignment failed; the pull request still exists.
    pub warning: Option<String>,
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(())
}

impl AllocationEngine {
    /// Create an open pull request and assign its initial reviewers.
    ///
    /// Assignment failures do not fail creation; they come back as a warning.
    pub async fn create_pull_request(
        &self,
        pull_request_id: &str,
        pull_request_name: &str,
        author_id: &str,
    ) -> RevuResult<CreatedPullRequest> {
        require("pull_request_id", pull_request_id)?;
        require("pull_request_name", pull_request_name)?;
        require("author_id", author_id)?;

        let _guard = self.locks.acquire(pull_request_id).await;

        if self.store.pull_request_exists(pull_request_id).await? {
            return Err(AllocationError::PullRequestExists {
                pull_request_id: pull_request_id.to_string(),
            }
            .into());
        }
        if self.store.user_get(author_id).await?.is_none() {
            return Err(AllocationError::UserNotFound {
                user_id: author_id.to_string(),
            }
            .into());
        }

        let pr = PullRequest::open(pull_request_id, pull_request_name, author_id, now());
        self.store.pull_request_insert(&pr).await?;
        tracing::info!(pull_request_id, author_id, "Created pull request");

        let warning = match self.assign_initial_locked(&pr).await {
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(pull_request_id, error = %err, "Reviewer assignment failed");
                Some(format!("PR created but reviewers assignment failed: {err}"))
            }
        };

        let reviewers = self.store.reviewer_list(pull_request_id).await?;
        Ok(CreatedPullRequest {
            pull_request: PullRequestWithReviewers::new(pr, reviewers),
            warning,
        })
    }

    /// Mark a pull request merged. Merging twice returns the stored state
    /// unchanged.
    pub async fn merge_pull_request(
        &self,
        pull_request_id: &str,
    ) -> RevuResult<PullRequestWithReviewers> {
        let _guard = self.locks.acquire(pull_request_id).await;

        let pr = self.require_pull_request(pull_request_id).await?;
        let pr = if pr.is_merged() {
            pr
        } else {
            let merged = self
                .store
                .pull_request_update_status(pull_request_id, PullRequestStatus::Merged, Some(now()))
                .await?
                .ok_or_else(|| AllocationError::PullRequestNotFound {
                    pull_request_id: pull_request_id.to_string(),
                })?;
            tracing::info!(pull_request_id, "Merged pull request");
            merged
        };

        let reviewers = self.store.reviewer_list(pull_request_id).await?;
        self.locks.release(pull_request_id).await;
        Ok(PullRequestWithReviewers::new(pr, reviewers))
    }

    /// Attach a specific reviewer, enforcing the cap and eligibility rules.
    pub async fn add_reviewer(
        &self,
        pull_request_id: &str,
        user_id: &str,
    ) -> RevuResult<PullRequestWithReviewers> {
        let _guard = self.locks.acquire(pull_request_id).await;

        let pr = self.require_pull_request(pull_request_id).await?;
        if pr.is_merged() {
            return Err(AllocationError::PullRequestMerged {
                pull_request_id: pull_request_id.to_string(),
            }
            .into());
        }

        let reviewers = self.store.reviewer_list(pull_request_id).await?;
        if reviewers.len() >= MAX_REVIEWERS {
            return Err(AllocationError::ReviewerCapReached {
                pull_request_id: pull_request_id.to_string(),
                max: MAX_REVIEWERS,
            }
            .into());
        }

        let user = self
            .store
            .user_get(user_id)
            .await?
            .ok_or_else(|| AllocationError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        if !user.is_active {
            return Err(AllocationError::UserInactive {
                user_id: user_id.to_string(),
            }
            .into());
        }
        if pr.is_authored_by(user_id) {
            return Err(AllocationError::AuthorSelfReview {
                user_id: user_id.to_string(),
            }
            .into());
        }
        if reviewers.iter().any(|r| r == user_id) {
            return Err(AllocationError::AlreadyAssigned {
                pull_request_id: pull_request_id.to_string(),
                user_id: user_id.to_string(),
            }
            .into());
        }

        self.store.reviewer_add(pull_request_id, user_id).await?;
        tracing::info!(pull_request_id, reviewer = user_id, "Added reviewer manually");

        let reviewers = self.store.reviewer_list(pull_request_id).await?;
        Ok(PullRequestWithReviewers::new(pr, reviewers))
    }

    /// A pull request with its reviewers in assignment order.
    pub async fn pull_request_view(
        &self,
        pull_request_id: &str,
    ) -> RevuResult<PullRequestWithReviewers> {
        let pr = self.require_pull_request(pull_request_id).await?;
        let reviewers = self.store.reviewer_list(pull_request_id).await?;
        Ok(PullRequestWithReviewers::new(pr, reviewers))
    }

    async fn require_pull_request(&self, pull_request_id: &str) -> RevuResult<PullRequest> {
        self.store
            .pull_request_get(pull_request_id)
            .await?
            .ok_or_else(|| {
                AllocationError::PullRequestNotFound {
                    pull_request_id: pull_request_id.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::selector::SeededSelector;
    use crate::AllocationEngine;
    use revu_core::{AllocationConfig, AllocationError, PullRequestStatus, RevuError, User};
    use revu_storage::{InMemoryStore, RecordStore};
    use std::sync::Arc;

    async fn setup(users: &[User]) -> (AllocationEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        for user in users {
            store.user_upsert(user).await.unwrap();
        }
        let engine = AllocationEngine::new(
            store.clone(),
            Arc::new(SeededSelector::new(5)),
            &AllocationConfig::default(),
        );
        (engine, store)
    }

    fn team() -> Vec<User> {
        vec![
            User::new("a", "author", "t"),
            User::new("r1", "r1", "t"),
            User::new("r2", "r2", "t"),
            User::new("r3", "r3", "t"),
            User::new("idle", "idle", "t").with_active(false),
        ]
    }

    fn allocation(err: RevuError) -> AllocationError {
        match err {
            RevuError::Allocation(inner) => inner,
            other => panic!("expected allocation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_two_reviewers() {
        let (engine, _) = setup(&team()).await;
        let created = engine.create_pull_request("pr-1", "Search", "a").await.unwrap();
        assert!(created.warning.is_none());
        assert_eq!(created.pull_request.assigned_reviewers.len(), 2);
        assert!(!created
            .pull_request
            .assigned_reviewers
            .contains(&"a".to_string()));
        assert_eq!(created.pull_request.pull_request.status, PullRequestStatus::Open);
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let (engine, _) = setup(&team()).await;
        engine.create_pull_request("pr-1", "Search", "a").await.unwrap();
        let err = engine.create_pull_request("pr-1", "Again", "a").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::PullRequestExists { .. }));
    }

    #[tokio::test]
    async fn test_create_unknown_author() {
        let (engine, _) = setup(&team()).await;
        let err = engine.create_pull_request("pr-1", "Search", "ghost").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let (engine, _) = setup(&team()).await;
        let err = engine.create_pull_request(" ", "Search", "a").await.unwrap_err();
        assert!(matches!(err, RevuError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_with_teamless_author_warns() {
        let (engine, store) = setup(&[User::new("solo", "solo", "")]).await;
        let created = engine.create_pull_request("pr-1", "Search", "solo").await.unwrap();
        assert!(created
            .warning
            .as_deref()
            .is_some_and(|w| w.starts_with("PR created but reviewers assignment failed")));
        assert!(store.pull_request_exists("pr-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let (engine, _) = setup(&team()).await;
        engine.create_pull_request("pr-1", "Search", "a").await.unwrap();
        let first = engine.merge_pull_request("pr-1").await.unwrap();
        let second = engine.merge_pull_request("pr-1").await.unwrap();
        assert_eq!(first.pull_request.status, PullRequestStatus::Merged);
        assert!(first.pull_request.merged_at.is_some());
        assert_eq!(first.pull_request.merged_at, second.pull_request.merged_at);
    }

    #[tokio::test]
    async fn test_merge_releases_pull_request_lock() {
        let (engine, _) = setup(&team()).await;
        engine.create_pull_request("pr-1", "Search", "a").await.unwrap();
        engine.create_pull_request("pr-2", "Index", "a").await.unwrap();
        assert_eq!(engine.locks.tracked().await, 2);

        engine.merge_pull_request("pr-1").await.unwrap();
        assert_eq!(engine.locks.tracked().await, 1);
        let err = engine.reassign_one("pr-1", "r1").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::PullRequestMerged { .. }));
    }

    #[tokio::test]
    async fn test_merge_unknown() {
        let (engine, _) = setup(&team()).await;
        let err = engine.merge_pull_request("nope").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::PullRequestNotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_reviewer_rules() {
        let (engine, store) = setup(&team()).await;
        store
            .pull_request_insert(&revu_core::PullRequest::open("pr-1", "x", "a", revu_core::now()))
            .await
            .unwrap();

        let err = engine.add_reviewer("pr-1", "ghost").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::UserNotFound { .. }));
        let err = engine.add_reviewer("pr-1", "idle").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::UserInactive { .. }));
        let err = engine.add_reviewer("pr-1", "a").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::AuthorSelfReview { .. }));

        engine.add_reviewer("pr-1", "r1").await.unwrap();
        let err = engine.add_reviewer("pr-1", "r1").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::AlreadyAssigned { .. }));

        let view = engine.add_reviewer("pr-1", "r2").await.unwrap();
        assert_eq!(view.assigned_reviewers, vec!["r1", "r2"]);

        let err = engine.add_reviewer("pr-1", "r3").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::ReviewerCapReached { max: 2, .. }));
    }

    #[tokio::test]
    async fn test_add_reviewer_to_merged() {
        let (engine, _) = setup(&team()).await;
        engine.create_pull_request("pr-1", "Search", "a").await.unwrap();
        engine.merge_pull_request("pr-1").await.unwrap();
        let err = engine.add_reviewer("pr-1", "r3").await.unwrap_err();
        assert!(matches!(allocation(err), AllocationError::PullRequestMerged { .. }));
    }

    #[tokio::test]
    async fn test_view_orders_reviewers() {
        let (engine, store) = setup(&team()).await;
        store
            .pull_request_insert(&revu_core::PullRequest::open("pr-1", "x", "a", revu_core::now()))
            .await
            .unwrap();
        store.reviewer_add("pr-1", "r2").await.unwrap();
        store.reviewer_add("pr-1", "r1").await.unwrap();
        let view = engine.pull_request_view("pr-1").await.unwrap();
        assert_eq!(view.assigned_reviewers, vec!["r2", "r1"]);
    }
}
