//! Reviewer assignment statistics.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  engine::ReviewEngine,
  store::{StatsStore, StoreResultExt as _},
};

/// How many pull requests a user currently reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssignments {
  pub user_id:     String,
  pub username:    String,
  pub assignments: u64,
}

/// How many reviewers a pull request currently has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestAssignments {
  pub pull_request_id: String,
  pub name:            String,
  pub reviewers:       u64,
}

impl<S: StatsStore> ReviewEngine<S> {
  /// Users with at least one reviewer assignment, most assigned first.
  pub async fn assignments_by_user(&self) -> Result<Vec<UserAssignments>> {
    self.store.assignments_by_user().await.or_internal()
  }

  /// Pull requests with at least one reviewer, most reviewers first.
  pub async fn assignments_by_pull_request(&self) -> Result<Vec<PullRequestAssignments>> {
    self.store.assignments_by_pull_request().await.or_internal()
  }
}
