//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": {"code": "<CODE>", "message": "..."}}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rota_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Rejected before reaching the engine.
  #[error("{0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] rota_core::Error),
}

impl ApiError {
  /// Fail with `BAD_REQUEST` if `value` is blank.
  pub fn require(field: &str, value: &str) -> Result<(), Self> {
    if value.trim().is_empty() {
      return Err(Self::BadRequest(format!("{field} is required")));
    }
    Ok(())
  }

  /// HTTP status and stable error code.
  pub fn status_and_code(&self) -> (StatusCode, &'static str) {
    let kind = match self {
      Self::BadRequest(_) => return (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
      Self::Engine(e) => e.kind(),
    };
    match kind {
      ErrorKind::UserNotFound | ErrorKind::TeamNotFound | ErrorKind::PullRequestNotFound => {
        (StatusCode::NOT_FOUND, "NOT_FOUND")
      }
      ErrorKind::TeamAlreadyExists => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
      ErrorKind::PullRequestAlreadyExists => (StatusCode::CONFLICT, "PR_EXISTS"),
      ErrorKind::PullRequestMerged => (StatusCode::CONFLICT, "PR_MERGED"),
      ErrorKind::ReviewerNotAssigned => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
      ErrorKind::NoCandidates => (StatusCode::CONFLICT, "NO_CANDIDATE"),
      ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::warn!(error = %rejection.body_text(), "invalid request payload");
    Self::BadRequest("invalid request payload".to_owned())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    tracing::warn!(error = %rejection.body_text(), "invalid query string");
    Self::BadRequest("invalid query string".to_owned())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.status_and_code();
    match &self {
      ApiError::Engine(rota_core::Error::Internal(source)) => {
        tracing::error!(error = %source, "request failed");
      }
      ApiError::BadRequest(message) => tracing::warn!(%message, "bad request"),
      ApiError::Engine(e) => tracing::warn!(error = %e, code, "request rejected"),
    }
    let message = self.to_string();
    (status, Json(json!({ "error": { "code": code, "message": message } }))).into_response()
  }
}
