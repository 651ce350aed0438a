//! Handlers for `/api/team` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/team/add` | Body: `{"team_name", "members"}`; 400 `TEAM_EXISTS` if taken |
//! | `GET`  | `/api/team/get` | `?team_name=`; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
  http::StatusCode,
  response::IntoResponse,
};
use rota_core::{
  ReviewEngine,
  store::RotaStore,
  team::{NewMember, Team},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberBody {
  pub user_id:   String,
  pub username:  String,
  #[serde(default = "active_by_default")]
  pub is_active: bool,
}

fn active_by_default() -> bool { true }

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamBody {
  pub team_name: String,
  #[serde(default)]
  pub members:   Vec<MemberBody>,
}

impl From<Team> for TeamBody {
  fn from(team: Team) -> Self {
    Self {
      team_name: team.name,
      members:   team
        .members
        .into_iter()
        .map(|u| MemberBody { user_id: u.user_id, username: u.username, is_active: u.is_active })
        .collect(),
    }
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /api/team/add`
pub async fn create<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  body: Result<Json<TeamBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  ApiError::require("team_name", &body.team_name)?;
  for member in &body.members {
    ApiError::require("user_id", &member.user_id)?;
    ApiError::require("username", &member.username)?;
  }

  let members = body
    .members
    .into_iter()
    .map(|m| NewMember { user_id: m.user_id, username: m.username, is_active: m.is_active })
    .collect();
  let team = engine.create_team(&body.team_name, members).await?;
  Ok((StatusCode::CREATED, Json(json!({ "team": TeamBody::from(team) }))))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
  #[serde(default)]
  pub team_name: String,
}

/// `GET /api/team/get?team_name=<name>`
pub async fn get_one<S: RotaStore>(
  State(engine): State<Arc<ReviewEngine<S>>>,
  query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamBody>, ApiError> {
  let Query(query) = query?;
  ApiError::require("team_name", &query.team_name)?;
  let team = engine.get_team(&query.team_name).await?;
  Ok(Json(team.into()))
}
