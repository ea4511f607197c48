//! Router tests against the in-memory store.
//!
//! Requests go through the full Axum stack with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use revu_api::{create_api_router, ApiConfig, AppState};
use revu_core::AllocationConfig;
use revu_engine::{AllocationEngine, SeededSelector};
use revu_test_utils::fixtures::{author_and_reviewers, seed_pull_request};
use revu_test_utils::{FaultPoint, FaultyStore, InMemoryStore, RecordStore};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_over(store: Arc<dyn RecordStore>) -> Router {
    let engine = AllocationEngine::new(
        store,
        Arc::new(SeededSelector::new(7)),
        &AllocationConfig::default(),
    );
    create_api_router(AppState::new(engine), &ApiConfig::default())
}

fn app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    (app_over(store.clone()), store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn create_core_team(app: &Router) {
    let (status, _) = post(
        app,
        "/team/add",
        json!({
            "team_name": "core",
            "members": [
                {"user_id": "a", "username": "alice", "is_active": true},
                {"user_id": "r1", "username": "bob", "is_active": true},
                {"user_id": "r2", "username": "carol", "is_active": true},
                {"user_id": "r3", "username": "dave", "is_active": true},
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn reviewers(pr: &Value) -> Vec<String> {
    pr["assigned_reviewers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// TEAMS
// ============================================================================

#[tokio::test]
async fn team_add_and_get() {
    let (app, _) = app();
    create_core_team(&app).await;

    let (status, body) = get(&app, "/team/get?team_name=core").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_name"], "core");
    let names: Vec<&str> = body["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "bob", "carol", "dave"]);
}

#[tokio::test]
async fn team_add_twice_is_rejected() {
    let (app, _) = app();
    create_core_team(&app).await;

    let (status, body) = post(&app, "/team/add", json!({"team_name": "core", "members": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "TEAM_EXISTS");
}

#[tokio::test]
async fn team_get_errors() {
    let (app, _) = app();

    let (status, body) = get(&app, "/team/get").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = get(&app, "/team/get?team_name=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn mass_deactivate_moves_reviews() {
    let (app, store) = app();
    author_and_reviewers(store.as_ref(), 3).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1"])
        .await
        .unwrap();

    let (status, body) = post(
        &app,
        "/team/massDeactivate",
        json!({"team_name": "t", "user_ids": ["r1", "stranger"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deactivated_users"], 1);
    assert_eq!(body["reassigned_prs"], json!(["pr-1"]));
    assert_eq!(body["message"], "Bulk deactivation completed successfully");
    assert!(body["processing_time_ms"].is_u64());

    let remaining = store.reviewer_list("pr-1").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0], "r1");
}

// ============================================================================
// USERS
// ============================================================================

#[tokio::test]
async fn set_is_active_and_get_review() {
    let (app, store) = app();
    author_and_reviewers(store.as_ref(), 2).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1", "r2"])
        .await
        .unwrap();

    let (status, body) = post(
        &app,
        "/users/setIsActive",
        json!({"user_id": "r1", "is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], false);

    // Deactivation alone keeps existing assignments.
    let (status, body) = get(&app, "/users/getReview?user_id=r1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "r1");
    assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");
    assert_eq!(body["pull_requests"][0]["status"], "OPEN");

    let (status, body) = post(
        &app,
        "/users/setIsActive",
        json!({"user_id": "ghost", "is_active": true}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// PULL REQUESTS
// ============================================================================

#[tokio::test]
async fn create_assigns_two_teammates() {
    let (app, _) = app();
    create_core_team(&app).await;

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Add search", "author_id": "a"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("warning").is_none());
    assert_eq!(body["pr"]["status"], "OPEN");
    let assigned = reviewers(&body["pr"]);
    assert_eq!(assigned.len(), 2);
    assert!(!assigned.contains(&"a".to_string()));

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Again", "author_id": "a"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_EXISTS");
}

#[tokio::test]
async fn create_with_unknown_author() {
    let (app, _) = app();
    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Fix", "author_id": "ghost"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn create_with_failing_assignment_warns() {
    let store = Arc::new(FaultyStore::default());
    author_and_reviewers(store.inner(), 2).await.unwrap();
    store.fail_on(FaultPoint::ReviewerAdd);
    let app = app_over(store.clone());

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Fix", "author_id": "a"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["warning"]
        .as_str()
        .unwrap()
        .starts_with("PR created but reviewers assignment failed"));
    assert!(reviewers(&body["pr"]).is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let (app, _) = app();
    let (status, body) = post(&app, "/pullRequest/create", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn merge_is_idempotent_and_freezes_reviewers() {
    let (app, _) = app();
    create_core_team(&app).await;
    post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Fix", "author_id": "a"}),
    )
    .await;

    let (status, first) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["status"], "MERGED");
    let (_, second) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(first["pr"]["merged_at"], second["pr"]["merged_at"]);

    let old = reviewers(&first["pr"])[0].clone();
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_MERGED");

    let (status, _) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "ghost"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reassign_replaces_reviewer() {
    let (app, _) = app();
    create_core_team(&app).await;
    let (_, created) = post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Fix", "author_id": "a"}),
    )
    .await;
    let old = reviewers(&created["pr"])[0].clone();

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["replaced_by"], old.as_str());
    let after = reviewers(&body["pr"]);
    assert_eq!(after.len(), 2);
    assert!(!after.contains(&"a".to_string()));
}

#[tokio::test]
async fn reassign_errors() {
    let (app, store) = app();
    author_and_reviewers(store.as_ref(), 1).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1"])
        .await
        .unwrap();

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": "a"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NOT_ASSIGNED");

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": "r1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NO_CANDIDATE");
    assert_eq!(store.reviewer_list("pr-1").await.unwrap(), vec!["r1"]);

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "ghost", "old_user_id": "r1"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn add_reviewer_rules() {
    let (app, store) = app();
    author_and_reviewers(store.as_ref(), 3).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1"])
        .await
        .unwrap();

    let (status, body) = post(&app, "/api/pull-requests/pr-1/reviewers", json!({"reviewer_id": "a"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "AUTHOR_SELF_REVIEW");

    let (status, body) = post(&app, "/api/pull-requests/pr-1/reviewers", json!({"reviewer_id": "r1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ALREADY_ASSIGNED");

    let (status, body) = post(&app, "/api/pull-requests/pr-1/reviewers", json!({"reviewer_id": "r2"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Reviewer added successfully");
    assert_eq!(reviewers(&body["pr"]), vec!["r1", "r2"]);

    let (status, body) = post(&app, "/api/pull-requests/pr-1/reviewers", json!({"reviewer_id": "r3"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MAX_REVIEWERS");
}

// ============================================================================
// STATS, HEALTH, OPENAPI
// ============================================================================

#[tokio::test]
async fn stats_count_assignments() {
    let (app, store) = app();
    author_and_reviewers(store.as_ref(), 2).await.unwrap();
    seed_pull_request(store.as_ref(), "pr-1", "a", &["r1", "r2"])
        .await
        .unwrap();
    seed_pull_request(store.as_ref(), "pr-2", "a", &["r1"])
        .await
        .unwrap();

    let (status, body) = get(&app, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_assignments"], 3);
    assert_eq!(body["user_assignments"]["r1"], 2);
    assert_eq!(body["pr_assignments"]["pr-1"], 2);
    assert_eq!(body["active_prs"], 2);
    assert_eq!(body["merged_prs"], 0);
}

#[tokio::test]
async fn health_and_openapi() {
    let (app, _) = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/pullRequest/reassign"].is_object());
}
