//! Error types for `rota-core`.
//!
//! Store failures are classified at the engine boundary: `NotFound` and
//! `Duplicate` become the domain variants below, anything else is wrapped in
//! [`Error::Internal`] whose message never carries store detail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("team not found: {0}")]
  TeamNotFound(String),

  #[error("team already exists: {0}")]
  TeamAlreadyExists(String),

  #[error("pull request not found: {0}")]
  PullRequestNotFound(String),

  #[error("pull request already exists: {0}")]
  PullRequestAlreadyExists(String),

  #[error("pull request {0} is already merged")]
  PullRequestMerged(String),

  #[error("reviewer {user_id} is not assigned to pull request {pull_request_id}")]
  ReviewerNotAssigned {
    pull_request_id: String,
    user_id:         String,
  },

  #[error("no active replacement candidate for pull request {0}")]
  NoCandidates(String),

  #[error("internal error")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Field-less mirror of [`Error`] for callers that only need to branch on
/// the kind (e.g. to pick an HTTP status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  UserNotFound,
  TeamNotFound,
  TeamAlreadyExists,
  PullRequestNotFound,
  PullRequestAlreadyExists,
  PullRequestMerged,
  ReviewerNotAssigned,
  NoCandidates,
  Internal,
}

impl Error {
  pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_) => ErrorKind::UserNotFound,
      Self::TeamNotFound(_) => ErrorKind::TeamNotFound,
      Self::TeamAlreadyExists(_) => ErrorKind::TeamAlreadyExists,
      Self::PullRequestNotFound(_) => ErrorKind::PullRequestNotFound,
      Self::PullRequestAlreadyExists(_) => ErrorKind::PullRequestAlreadyExists,
      Self::PullRequestMerged(_) => ErrorKind::PullRequestMerged,
      Self::ReviewerNotAssigned { .. } => ErrorKind::ReviewerNotAssigned,
      Self::NoCandidates(_) => ErrorKind::NoCandidates,
      Self::Internal(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
