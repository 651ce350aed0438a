//! Handlers for `/api/stats` endpoints. Both return `{"items": [...]}`.

use std::sync::Arc;

use axum::{Json, extract::State};
use rota_core::{ReviewEngine, store::RotaStore};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Items<T> {
  pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct UserItem {
  pub user_id:     String,
  pub username:    String,
  pub assignments: u64,
}

#[derive(Debug, Serialize)]
pub struct PullRequestItem {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub reviewer_count:    u64,
}

/// `GET /api/stats/assignments/by-user`
pub async fn by_user<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
) -> Result<Json<Items<UserItem>>, ApiError> {
  let items = engine
    .assignments_by_user()
    .await?
    .into_iter()
    .map(|a| UserItem { user_id: a.user_id, username: a.username, assignments: a.assignments })
    .collect();
  Ok(Json(Items { items }))
}

/// `GET /api/stats/assignments/by-pr`
pub async fn by_pull_request<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
) -> Result<Json<Items<PullRequestItem>>, ApiError> {
  let items = engine
    .assignments_by_pull_request()
    .await?
    .into_iter()
    .map(|a| PullRequestItem {
      pull_request_id:   a.pull_request_id,
      pull_request_name: a.name,
      reviewer_count:    a.reviewers,
    })
    .collect();
  Ok(Json(Items { items }))
}
