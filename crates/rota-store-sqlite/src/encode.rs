//! Conversions between domain types and the plain-text representations stored
//! in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and statuses by their
//! `SCREAMING_SNAKE_CASE` name.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use rota_core::pull_request::{PullRequest, PullRequestStatus};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── PullRequestStatus ───────────────────────────────────────────────────────

pub fn encode_status(status: PullRequestStatus) -> &'static str {
  match status {
    PullRequestStatus::Open => "OPEN",
    PullRequestStatus::Merged => "MERGED",
  }
}

pub fn decode_status(s: &str) -> Result<PullRequestStatus> {
  PullRequestStatus::from_str(s).map_err(|_| Error::Decode(format!("unknown status: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `pull_requests` row plus its ordered reviewer ids.
pub struct RawPullRequest {
  pub pr_id:      String,
  pub name:       String,
  pub author_id:  String,
  pub status:     String,
  pub created_at: String,
  pub merged_at:  Option<String>,
  pub reviewers:  Vec<String>,
}

impl RawPullRequest {
  pub fn into_pull_request(self) -> Result<PullRequest> {
    Ok(PullRequest {
      pull_request_id: self.pr_id,
      name:            self.name,
      author_id:       self.author_id,
      status:          decode_status(&self.status)?,
      created_at:      decode_dt(&self.created_at)?,
      merged_at:       self.merged_at.as_deref().map(decode_dt).transpose()?,
      reviewers:       self.reviewers,
    })
  }
}
