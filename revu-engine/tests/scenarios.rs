//! End-to-end allocation scenarios against the in-memory store.

use revu_core::{AllocationConfig, ErrorKind, PullRequestStatus};
use revu_engine::{AllocationEngine, BackfillOutcome, RandomSelector, SeededSelector};
use revu_storage::{InMemoryStore, RecordStore};
use revu_test_utils::assertions::{assert_kind, check_reviewer_invariants};
use revu_test_utils::fixtures::{author_and_reviewers, seed_pull_request, seed_team};
use revu_test_utils::{FaultPoint, FaultyStore};
use std::collections::HashSet;
use std::sync::Arc;

fn engine_over(store: Arc<dyn RecordStore>) -> AllocationEngine {
    AllocationEngine::new(store, Arc::new(RandomSelector), &AllocationConfig::default())
}

#[tokio::test]
async fn initial_assignment_picks_two_of_three() {
    let store = Arc::new(InMemoryStore::new());
    author_and_reviewers(store.as_ref(), 3).await.unwrap();
    let engine = engine_over(store.clone());

    for i in 0..20 {
        let id = format!("pr-{i}");
        let created = engine.create_pull_request(&id, "Change", "a").await.unwrap();
        let reviewers: HashSet<_> = created
            .pull_request
            .assigned_reviewers
            .iter()
            .cloned()
            .collect();
        assert_eq!(reviewers.len(), 2);
        assert!(reviewers.is_subset(&["r1", "r2", "r3"].iter().map(|s| s.to_string()).collect()));
        check_reviewer_invariants(store.as_ref(), &id).await.unwrap();
    }
}

#[tokio::test]
async fn reassigning_onto_other_reviewer_then_backfilling() {
    let store = Arc::new(InMemoryStore::new());
    author_and_reviewers(store.as_ref(), 2).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1", "r2"])
        .await
        .unwrap();
    let engine = engine_over(store.clone());

    let result = engine.reassign_one("pr-1", "r1").await.unwrap();
    assert_eq!(result.replaced_by, "r2");
    assert_eq!(result.backfill, BackfillOutcome::Added("r1".to_string()));
    assert_eq!(store.reviewer_list("pr-1").await.unwrap(), vec!["r2", "r1"]);
}

#[tokio::test]
async fn reassigning_in_two_person_team_has_no_candidate() {
    let store = Arc::new(InMemoryStore::new());
    author_and_reviewers(store.as_ref(), 1).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1"])
        .await
        .unwrap();
    let engine = engine_over(store.clone());

    assert_kind(
        &engine.reassign_one("pr-1", "r1").await,
        ErrorKind::NoCandidateAvailable,
    );
    assert_eq!(store.reviewer_list("pr-1").await.unwrap(), vec!["r1"]);
}

#[tokio::test]
async fn sole_reviewer_deactivated_in_bulk() {
    let store = Arc::new(InMemoryStore::new());
    author_and_reviewers(store.as_ref(), 1).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1"])
        .await
        .unwrap();
    let engine = engine_over(store.clone());

    let result = engine
        .handle_bulk_deactivation("t", &["r1".to_string()])
        .await
        .unwrap();
    assert_eq!(result.touched_pull_requests, vec!["pr-1"]);
    assert!(store.reviewer_list("pr-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn merging_twice_keeps_merge_time() {
    let store = Arc::new(InMemoryStore::new());
    author_and_reviewers(store.as_ref(), 2).await.unwrap();
    let engine = engine_over(store.clone());
    engine.create_pull_request("pr-1", "Change", "a").await.unwrap();

    let first = engine.merge_pull_request("pr-1").await.unwrap();
    let second = engine.merge_pull_request("pr-1").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second.pull_request.status, PullRequestStatus::Merged);

    assert_kind(&engine.reassign_one("pr-1", "r1").await, ErrorKind::Conflict);
}

#[tokio::test]
async fn failed_add_restores_old_reviewer() {
    let store = Arc::new(FaultyStore::default());
    author_and_reviewers(store.inner(), 2).await.unwrap();
    seed_pull_request(store.inner(), "pr-1", "a", &["r1"])
        .await
        .unwrap();
    store.fail_for_user(FaultPoint::ReviewerAdd, "r2");
    let engine = engine_over(store.clone());

    let result = engine.reassign_one("pr-1", "r1").await;
    assert_kind(&result, ErrorKind::Internal);
    assert_eq!(store.inner().reviewer_list("pr-1").await.unwrap(), vec!["r1"]);
}

#[tokio::test]
async fn failed_restore_leaves_pull_request_short() {
    let store = Arc::new(FaultyStore::default());
    author_and_reviewers(store.inner(), 2).await.unwrap();
    seed_pull_request(store.inner(), "pr-1", "a", &["r1"])
        .await
        .unwrap();
    store.fail_on(FaultPoint::ReviewerAdd);
    let engine = engine_over(store.clone());

    assert_kind(&engine.reassign_one("pr-1", "r1").await, ErrorKind::Internal);
    assert!(store.inner().reviewer_list("pr-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_backfill_does_not_fail_reassignment() {
    let store = Arc::new(FaultyStore::default());
    author_and_reviewers(store.inner(), 3).await.unwrap();
    seed_pull_request(store.inner(), "pr-1", "a", &["r1"])
        .await
        .unwrap();
    // First add is the replacement, the second one is the backfill.
    store.fail_after(FaultPoint::ReviewerAdd, 1);
    let engine = engine_over(store.clone());

    let result = engine.reassign_one("pr-1", "r1").await.unwrap();
    assert!(matches!(result.backfill, BackfillOutcome::Failed(_)));
    assert_eq!(
        store.inner().reviewer_list("pr-1").await.unwrap(),
        vec![result.replaced_by]
    );
}

#[tokio::test]
async fn partial_initial_assignment_keeps_first_reviewer() {
    let store = Arc::new(FaultyStore::default());
    author_and_reviewers(store.inner(), 3).await.unwrap();
    store.fail_after(FaultPoint::ReviewerAdd, 1);
    let engine = engine_over(store.clone());

    let created = engine.create_pull_request("pr-1", "Change", "a").await.unwrap();
    assert!(created.warning.is_some());
    assert_eq!(created.pull_request.assigned_reviewers.len(), 1);
}

#[tokio::test]
async fn cascade_store_failure_aborts() {
    let store = Arc::new(FaultyStore::default());
    author_and_reviewers(store.inner(), 3).await.unwrap();
    seed_pull_request(store.inner(), "pr-1", "a", &["r1"])
        .await
        .unwrap();
    store.fail_on(FaultPoint::PullRequestListOpenForReviewer);
    let engine = engine_over(store.clone());

    let result = engine
        .handle_bulk_deactivation("t", &["r1".to_string()])
        .await;
    assert_kind(&result, ErrorKind::Internal);
    // The deactivation itself is not rolled back.
    assert!(!store.inner().user_get("r1").await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn cross_team_reassignment_uses_old_reviewers_team() {
    let store = Arc::new(InMemoryStore::new());
    seed_team(store.as_ref(), "t", &[("a", "author", true), ("r1", "r1", true)])
        .await
        .unwrap();
    seed_team(store.as_ref(), "web", &[("w1", "w1", true), ("w2", "w2", true)])
        .await
        .unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["w1"])
        .await
        .unwrap();
    let engine = AllocationEngine::new(
        store.clone(),
        Arc::new(SeededSelector::new(9)),
        &AllocationConfig::default(),
    );

    let result = engine.reassign_one("pr-1", "w1").await.unwrap();
    assert_eq!(result.replaced_by, "w2");
    // Backfill draws from the author's team.
    assert_eq!(result.backfill, BackfillOutcome::Added("r1".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reassignments_keep_invariants() {
    let store = Arc::new(InMemoryStore::new());
    author_and_reviewers(store.as_ref(), 6).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1", "r2"])
        .await
        .unwrap();
    let engine = Arc::new(engine_over(store.clone()));

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let reviewers = store.reviewer_list("pr-1").await.unwrap();
            if let Some(old) = reviewers.get(i % reviewers.len().max(1)) {
                // Losing the race to another reassignment is fine.
                let _ = engine.reassign_one("pr-1", old).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    check_reviewer_invariants(store.as_ref(), "pr-1").await.unwrap();
    assert_eq!(store.reviewer_list("pr-1").await.unwrap().len(), 2);
}
