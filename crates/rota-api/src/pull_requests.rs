//! Handlers for `/api/pullRequest` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/pullRequest/create` | 201; 409 `PR_EXISTS` if the id is taken |
//! | `POST` | `/api/pullRequest/merge` | Idempotent |
//! | `POST` | `/api/pullRequest/reassign` | 409 `PR_MERGED`, `NOT_ASSIGNED` or `NO_CANDIDATE` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rota_core::{
  ReviewEngine,
  pull_request::{PullRequest, PullRequestStatus},
  store::RotaStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ApiError;

/// Full pull request as returned by every endpoint here.
#[derive(Debug, Serialize)]
pub struct PullRequestBody {
  pub pull_request_id:    String,
  pub pull_request_name:  String,
  pub author_id:          String,
  pub status:             PullRequestStatus,
  pub assigned_reviewers: Vec<String>,
  pub created_at:         DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub merged_at:          Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestBody {
  fn from(pr: PullRequest) -> Self {
    Self {
      pull_request_id:    pr.pull_request_id,
      pull_request_name:  pr.name,
      author_id:          pr.author_id,
      status:             pr.status,
      assigned_reviewers: pr.reviewers,
      created_at:         pr.created_at,
      merged_at:          pr.merged_at,
    }
  }
}

fn pr_json(pr: PullRequest) -> Value { json!({ "pr": PullRequestBody::from(pr) }) }

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
}

/// `POST /api/pullRequest/create`
pub async fn create<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  ApiError::require("pull_request_id", &body.pull_request_id)?;
  ApiError::require("pull_request_name", &body.pull_request_name)?;
  ApiError::require("author_id", &body.author_id)?;

  let pr = engine
    .create_pull_request(&body.pull_request_id, &body.pull_request_name, &body.author_id)
    .await?;
  Ok((StatusCode::CREATED, Json(pr_json(pr))))
}

// ─── Merge ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub pull_request_id: String,
}

/// `POST /api/pullRequest/merge`
pub async fn merge<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  body: Result<Json<MergeBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
  let Json(body) = body?;
  ApiError::require("pull_request_id", &body.pull_request_id)?;
  let pr = engine.merge(&body.pull_request_id).await?;
  Ok(Json(pr_json(pr)))
}

// ─── Reassign ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReassignBody {
  pub pull_request_id: String,
  pub old_user_id:     String,
}

/// `POST /api/pullRequest/reassign`
pub async fn reassign<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  body: Result<Json<ReassignBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
  let Json(body) = body?;
  ApiError::require("pull_request_id", &body.pull_request_id)?;
  ApiError::require("old_user_id", &body.old_user_id)?;

  let outcome = engine.reassign(&body.pull_request_id, &body.old_user_id).await?;
  Ok(Json(json!({
    "pr": PullRequestBody::from(outcome.pull_request),
    "replaced_by": outcome.replaced_by,
  })))
}
