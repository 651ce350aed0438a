//! Pull requests and their review state.
//!
//! A pull request starts `OPEN` and may move to `MERGED` exactly once. The
//! reviewer list never contains the author and never repeats a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
  #[default]
  Open,
  /// Terminal. Reviewers and author are frozen from here on.
  Merged,
}

// ─── Pull request ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
  pub pull_request_id: String,
  pub name:            String,
  pub author_id:       String,
  pub status:          PullRequestStatus,
  pub created_at:      DateTime<Utc>,
  pub merged_at:       Option<DateTime<Utc>>,
  /// External user ids of the assigned reviewers, in assignment order.
  pub reviewers:       Vec<String>,
}

impl PullRequest {
  /// A freshly opened pull request with no reviewers yet.
  pub fn open(
    pull_request_id: impl Into<String>,
    name:            impl Into<String>,
    author_id:       impl Into<String>,
    created_at:      DateTime<Utc>,
  ) -> Self {
    Self {
      pull_request_id: pull_request_id.into(),
      name:            name.into(),
      author_id:       author_id.into(),
      status:          PullRequestStatus::Open,
      created_at,
      merged_at:       None,
      reviewers:       Vec::new(),
    }
  }

  pub fn is_merged(&self) -> bool { self.status == PullRequestStatus::Merged }

  pub fn has_reviewer(&self, user_id: &str) -> bool {
    self.reviewers.iter().any(|r| r == user_id)
  }

  /// Move to `MERGED`. Returns `false` (and changes nothing) if the pull
  /// request was already merged.
  pub fn mark_merged(&mut self, at: DateTime<Utc>) -> bool {
    if self.is_merged() {
      return false;
    }
    self.status = PullRequestStatus::Merged;
    self.merged_at = Some(at);
    true
  }

  /// Put `new` in the slot held by `old`. Returns `false` if `old` is not a
  /// reviewer.
  pub fn swap_reviewer(&mut self, old: &str, new: impl Into<String>) -> bool {
    match self.reviewers.iter_mut().find(|r| *r == old) {
      Some(slot) => {
        *slot = new.into();
        true
      }
      None => false,
    }
  }
}
