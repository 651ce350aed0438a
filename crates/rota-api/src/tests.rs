//! Router tests against the in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use rota_core::{ReviewEngine, memory::MemoryStore, selector::ReviewerSelector};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

fn engine() -> Arc<ReviewEngine<MemoryStore>> {
  Arc::new(ReviewEngine::with_selector(Arc::new(MemoryStore::new()), ReviewerSelector::seeded(11)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if body.is_some() {
    builder = builder.header(header::CONTENT_TYPE, "application/json");
  }
  let req = builder.body(Body::from(body.unwrap_or_default().to_owned())).unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  send(app, "POST", uri, Some(&body.to_string())).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) { send(app, "GET", uri, None).await }

/// Team `backend` with active members `u1`..`u<n>`.
async fn app_with_team(n: usize) -> (Router, Arc<ReviewEngine<MemoryStore>>) {
  let engine = engine();
  let app = api_router(engine.clone());
  let members: Vec<Value> = (1..=n)
    .map(|i| {
      json!({ "user_id": format!("u{i}"), "username": format!("User {i}"), "is_active": true })
    })
    .collect();
  let body = json!({ "team_name": "backend", "members": members });
  let (status, _) = post(&app, "/api/team/add", body).await;
  assert_eq!(status, StatusCode::CREATED);
  (app, engine)
}

fn error_code(body: &Value) -> &str { body["error"]["code"].as_str().unwrap_or_default() }

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
  let app = api_router(engine());
  let (status, body) = get(&app, "/health").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "OK" }));
}

// ─── Teams ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn team_add_and_get() {
  let app = api_router(engine());
  let (status, body) = post(&app, "/api/team/add", json!({
    "team_name": "backend",
    "members": [
      { "user_id": "u1", "username": "Alice", "is_active": true },
      { "user_id": "u2", "username": "Bob", "is_active": false },
    ],
  }))
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["team"]["team_name"], "backend");
  assert_eq!(body["team"]["members"].as_array().unwrap().len(), 2);

  let (status, body) = get(&app, "/api/team/get?team_name=backend").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["members"][1], json!({ "user_id": "u2", "username": "Bob", "is_active": false }));
}

#[tokio::test]
async fn team_errors() {
  let (app, _) = app_with_team(2).await;

  let (status, body) =
    post(&app, "/api/team/add", json!({ "team_name": "backend", "members": [] })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "TEAM_EXISTS");

  let (status, body) = get(&app, "/api/team/get?team_name=nobody").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");

  let (status, body) = get(&app, "/api/team/get").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
  let app = api_router(engine());
  let (status, body) = send(&app, "POST", "/api/team/add", Some("{not json")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "BAD_REQUEST");

  let (status, body) =
    post(&app, "/api/pullRequest/create", json!({ "pull_request_id": "pr-1" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "BAD_REQUEST");
}

// ─── Pull requests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_pull_request_assigns_reviewers() {
  let (app, _) = app_with_team(4).await;
  let (status, body) = post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1",
    "pull_request_name": "Add search",
    "author_id": "u1",
  }))
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let pr = &body["pr"];
  assert_eq!(pr["pull_request_id"], "pr-1");
  assert_eq!(pr["pull_request_name"], "Add search");
  assert_eq!(pr["status"], "OPEN");
  assert!(pr.get("merged_at").is_none());
  assert!(pr["created_at"].is_string());
  let reviewers = pr["assigned_reviewers"].as_array().unwrap();
  assert_eq!(reviewers.len(), 2);
  assert!(!reviewers.contains(&json!("u1")));
}

#[tokio::test]
async fn create_pull_request_errors() {
  let (app, _) = app_with_team(3).await;
  let create = |id: &str, author: &str| {
    json!({ "pull_request_id": id, "pull_request_name": "Change", "author_id": author })
  };

  post(&app, "/api/pullRequest/create", create("pr-1", "u1")).await;
  let (status, body) = post(&app, "/api/pullRequest/create", create("pr-1", "u2")).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "PR_EXISTS");

  let (status, body) = post(&app, "/api/pullRequest/create", create("pr-2", "ghost")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");

  let (status, _) = post(&app, "/api/pullRequest/create", create("pr-3", "")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn merge_is_idempotent_and_blocks_reassign() {
  let (app, _) = app_with_team(3).await;
  post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1", "pull_request_name": "Change", "author_id": "u1",
  }))
  .await;

  let (status, first) =
    post(&app, "/api/pullRequest/merge", json!({ "pull_request_id": "pr-1" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["pr"]["status"], "MERGED");
  assert!(first["pr"]["merged_at"].is_string());

  let (status, second) =
    post(&app, "/api/pullRequest/merge", json!({ "pull_request_id": "pr-1" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(second["pr"]["merged_at"], first["pr"]["merged_at"]);

  let (status, body) = post(&app, "/api/pullRequest/reassign", json!({
    "pull_request_id": "pr-1", "old_user_id": "u2",
  }))
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "PR_MERGED");

  let (status, _) =
    post(&app, "/api/pullRequest/merge", json!({ "pull_request_id": "pr-9" })).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reassign_outcomes() {
  let (app, _) = app_with_team(4).await;
  let (_, created) = post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1", "pull_request_name": "Change", "author_id": "u1",
  }))
  .await;
  let old = created["pr"]["assigned_reviewers"][0].as_str().unwrap().to_owned();

  let (status, body) = post(&app, "/api/pullRequest/reassign", json!({
    "pull_request_id": "pr-1", "old_user_id": old,
  }))
  .await;
  assert_eq!(status, StatusCode::OK);
  let replaced_by = body["replaced_by"].as_str().unwrap();
  assert_ne!(replaced_by, old);
  assert_eq!(body["pr"]["assigned_reviewers"][0], replaced_by);

  let (status, body) = post(&app, "/api/pullRequest/reassign", json!({
    "pull_request_id": "pr-1", "old_user_id": "u1",
  }))
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "NOT_ASSIGNED");
}

#[tokio::test]
async fn reassign_without_candidates_conflicts() {
  // u2 and u3 both review; the author is the only other member.
  let (app, _) = app_with_team(3).await;
  post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1", "pull_request_name": "Change", "author_id": "u1",
  }))
  .await;

  let (status, body) = post(&app, "/api/pullRequest/reassign", json!({
    "pull_request_id": "pr-1", "old_user_id": "u2",
  }))
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "NO_CANDIDATE");
}

#[tokio::test]
async fn store_failures_hide_their_detail() {
  let (app, engine) = app_with_team(3).await;
  post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1", "pull_request_name": "Change", "author_id": "u1",
  }))
  .await;
  engine.store().fail_writes_for("pr-1").await;

  let (status, body) =
    post(&app, "/api/pullRequest/merge", json!({ "pull_request_id": "pr-1" })).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body, json!({ "error": { "code": "INTERNAL", "message": "internal error" } }));
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_active_and_reviews() {
  let (app, _) = app_with_team(2).await;
  post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1", "pull_request_name": "Change", "author_id": "u1",
  }))
  .await;

  let (status, body) =
    post(&app, "/api/users/setIsActive", json!({ "user_id": "u2", "is_active": false })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"], json!({
    "user_id": "u2", "username": "User 2", "team_name": "backend", "is_active": false,
  }));

  let (status, body) = get(&app, "/api/users/getReview?user_id=u2").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({
    "user_id": "u2",
    "pull_requests": [
      {
        "pull_request_id": "pr-1", "pull_request_name": "Change",
        "author_id": "u1", "status": "OPEN",
      },
    ],
  }));

  let (status, _) = get(&app, "/api/users/getReview?user_id=ghost").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) =
    post(&app, "/api/users/setIsActive", json!({ "user_id": "ghost", "is_active": true })).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_deactivate_reports_counters() {
  let (app, _) = app_with_team(3).await;
  post(&app, "/api/pullRequest/create", json!({
    "pull_request_id": "pr-1", "pull_request_name": "Change", "author_id": "u1",
  }))
  .await;

  let (status, body) = post(&app, "/api/users/bulkDeactivate", json!({
    "team_name": "backend", "user_ids": ["u2"],
  }))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({
    "team": "backend", "deactivated": 1, "reassigned": 0, "skipped": 1, "affected_prs": 0,
  }));

  let (status, body) = post(&app, "/api/users/bulkDeactivate", json!({
    "team_name": "backend", "user_ids": [],
  }))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "BAD_REQUEST");

  let (status, _) = post(&app, "/api/users/bulkDeactivate", json!({
    "team_name": "nobody", "user_ids": ["u3"],
  }))
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_list_assignments() {
  let (app, _) = app_with_team(2).await;
  for id in ["pr-1", "pr-2"] {
    post(&app, "/api/pullRequest/create", json!({
      "pull_request_id": id, "pull_request_name": "Change", "author_id": "u1",
    }))
    .await;
  }

  let (status, body) = get(&app, "/api/stats/assignments/by-user").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!({ "items": [{ "user_id": "u2", "username": "User 2", "assignments": 2 }] })
  );

  let (status, body) = get(&app, "/api/stats/assignments/by-pr").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "items": [
    { "pull_request_id": "pr-1", "pull_request_name": "Change", "reviewer_count": 1 },
    { "pull_request_id": "pr-2", "pull_request_name": "Change", "reviewer_count": 1 },
  ] }));
}
