//! Handlers for `/api/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/users/setIsActive` | Body: `{"user_id", "is_active"}` |
//! | `GET`  | `/api/users/getReview` | `?user_id=`; pull requests of any status |
//! | `POST` | `/api/users/bulkDeactivate` | Body: `{"team_name", "user_ids"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
};
use rota_core::{
  ReviewEngine,
  pull_request::{PullRequest, PullRequestStatus},
  store::RotaStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ApiError;

// ─── Set active ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
  pub user_id:   String,
  pub is_active: bool,
}

/// `POST /api/users/setIsActive`
pub async fn set_active<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  body: Result<Json<SetActiveBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
  let Json(body) = body?;
  ApiError::require("user_id", &body.user_id)?;
  let user = engine.set_active(&body.user_id, body.is_active).await?;
  Ok(Json(json!({ "user": user })))
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
  #[serde(default)]
  pub user_id: String,
}

/// Short pull request form used in review listings.
#[derive(Debug, Serialize)]
pub struct PullRequestSummary {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
  pub status:            PullRequestStatus,
}

impl From<PullRequest> for PullRequestSummary {
  fn from(pr: PullRequest) -> Self {
    Self {
      pull_request_id:   pr.pull_request_id,
      pull_request_name: pr.name,
      author_id:         pr.author_id,
      status:            pr.status,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ReviewsBody {
  pub user_id:       String,
  pub pull_requests: Vec<PullRequestSummary>,
}

/// `GET /api/users/getReview?user_id=<id>`
pub async fn reviews<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  query: Result<Query<ReviewsQuery>, QueryRejection>,
) -> Result<Json<ReviewsBody>, ApiError> {
  let Query(query) = query?;
  ApiError::require("user_id", &query.user_id)?;
  let prs = engine.user_reviews(&query.user_id).await?;
  Ok(Json(ReviewsBody {
    user_id:       query.user_id,
    pull_requests: prs.into_iter().map(Into::into).collect(),
  }))
}

// ─── Bulk deactivate ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkDeactivateBody {
  pub team_name: String,
  #[serde(default)]
  pub user_ids:  Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeactivateResult {
  pub team:         String,
  pub deactivated:  usize,
  pub reassigned:   usize,
  pub skipped:      usize,
  pub affected_prs: usize,
}

/// `POST /api/users/bulkDeactivate`
pub async fn bulk_deactivate<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  body: Result<Json<BulkDeactivateBody>, JsonRejection>,
) -> Result<Json<BulkDeactivateResult>, ApiError> {
  let Json(body) = body?;
  ApiError::require("team_name", &body.team_name)?;
  if body.user_ids.is_empty() {
    return Err(ApiError::BadRequest("user_ids is required".to_owned()));
  }

  let summary = engine.bulk_deactivate(&body.team_name, &body.user_ids).await?;
  Ok(Json(BulkDeactivateResult {
    team:         summary.team_name,
    deactivated:  summary.deactivated_users,
    reassigned:   summary.reassignments_done,
    skipped:      summary.reassignments_skipped,
    affected_prs: summary.affected_pull_requests,
  }))
}
