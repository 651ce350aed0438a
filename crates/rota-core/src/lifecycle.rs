//! Pull request lifecycle: creation with automatic reviewers, idempotent
//! merge, and single-reviewer reassignment.
//!
//! ```text
//! OPEN --merge--> MERGED        (terminal)
//! OPEN --reassign--> OPEN       (reviewer list changes)
//! ```

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  engine::{MAX_REVIEWERS, ReviewEngine},
  pull_request::PullRequest,
  store::{PullRequestStore, StoreResultExt as _, UserStore},
};

/// Outcome of [`ReviewEngine::reassign`].
#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
  pub pull_request: PullRequest,
  /// External id of the reviewer that took the freed slot.
  pub replaced_by:  String,
}

impl<S> ReviewEngine<S>
where
  S: UserStore + PullRequestStore,
{
  /// Open a pull request and assign up to two active reviewers from the
  /// author's team.
  ///
  /// A team with no other active member yields a pull request without
  /// reviewers; that is not an error.
  pub async fn create_pull_request(
    &self,
    pull_request_id: &str,
    name:            &str,
    author_id:       &str,
  ) -> Result<PullRequest> {
    let author = self
      .store
      .get_user(author_id)
      .await
      .or_missing(|| Error::UserNotFound(author_id.to_owned()))?;

    let excluded = HashSet::from([author.user_id.as_str()]);
    let reviewers = self
      .selector
      .select(&*self.store, &author.team_name, &excluded, MAX_REVIEWERS)
      .await
      .or_internal()?;

    let mut pr = PullRequest::open(pull_request_id, name, &author.user_id, Utc::now());
    self.store.create_pull_request(&pr).await.or_duplicate(|| {
      warn!(pr_id = %pull_request_id, "pull request already exists");
      Error::PullRequestAlreadyExists(pull_request_id.to_owned())
    })?;

    if reviewers.is_empty() {
      warn!(pr_id = %pull_request_id, team = %author.team_name, "no reviewers available");
    } else {
      let ids: Vec<String> = reviewers.into_iter().map(|u| u.user_id).collect();
      self.store.attach_reviewers(&pr.pull_request_id, &ids).await.or_internal()?;
      pr.reviewers = ids;
    }

    info!(
      pr_id = %pr.pull_request_id,
      author = %pr.author_id,
      reviewers = ?pr.reviewers,
      "pull request created"
    );
    Ok(pr)
  }

  /// Move a pull request to `MERGED`. Merging an already merged pull request
  /// returns it unchanged and writes nothing.
  pub async fn merge(&self, pull_request_id: &str) -> Result<PullRequest> {
    let not_found = || Error::PullRequestNotFound(pull_request_id.to_owned());

    let mut pr = self.store.get_pull_request(pull_request_id).await.or_missing(not_found)?;
    if !pr.mark_merged(Utc::now()) {
      debug!(pr_id = %pull_request_id, "pull request already merged");
      return Ok(pr);
    }

    let affected = self.store.save_pull_request(&pr).await.or_missing(not_found)?;
    if affected == 0 {
      // The row vanished between read and write.
      warn!(pr_id = %pull_request_id, "merge updated no rows");
      return Err(not_found());
    }

    info!(pr_id = %pull_request_id, "pull request merged");
    Ok(pr)
  }

  /// Replace `old_reviewer_id` on an open pull request with another active
  /// member of the old reviewer's team.
  ///
  /// The replacement is never the old reviewer, the author, or anyone already
  /// reviewing. An unknown user and a known user that is not assigned both
  /// fail with [`Error::ReviewerNotAssigned`].
  pub async fn reassign(
    &self,
    pull_request_id: &str,
    old_reviewer_id: &str,
  ) -> Result<Reassignment> {
    let not_assigned = || Error::ReviewerNotAssigned {
      pull_request_id: pull_request_id.to_owned(),
      user_id:         old_reviewer_id.to_owned(),
    };

    let mut pr = self
      .store
      .get_pull_request(pull_request_id)
      .await
      .or_missing(|| Error::PullRequestNotFound(pull_request_id.to_owned()))?;

    if pr.is_merged() {
      warn!(pr_id = %pull_request_id, "reassign on merged pull request");
      return Err(Error::PullRequestMerged(pull_request_id.to_owned()));
    }

    let old = self.store.get_user(old_reviewer_id).await.or_missing(not_assigned)?;
    if !pr.has_reviewer(&old.user_id) {
      warn!(pr_id = %pull_request_id, user = %old_reviewer_id, "reviewer not assigned");
      return Err(not_assigned());
    }

    let replacement = {
      let mut excluded: HashSet<&str> = pr.reviewers.iter().map(String::as_str).collect();
      excluded.insert(&old.user_id);
      excluded.insert(&pr.author_id);

      self
        .selector
        .select(&*self.store, &old.team_name, &excluded, 1)
        .await
        .or_internal()?
        .into_iter()
        .next()
    };

    let Some(replacement) = replacement else {
      warn!(pr_id = %pull_request_id, team = %old.team_name, "no replacement candidates");
      return Err(Error::NoCandidates(pull_request_id.to_owned()));
    };

    self
      .store
      .replace_reviewer(&pr.pull_request_id, &old.user_id, &replacement.user_id)
      .await
      .or_internal()?;
    pr.swap_reviewer(&old.user_id, replacement.user_id.clone());

    info!(
      pr_id = %pull_request_id,
      old_user = %old.user_id,
      new_user = %replacement.user_id,
      "reviewer reassigned"
    );
    Ok(Reassignment { pull_request: pr, replaced_by: replacement.user_id })
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    ErrorKind,
    pull_request::PullRequestStatus,
    store::{PullRequestStore as _, UserStore as _},
    test_support::{engine_with_team, member},
  };

  // ── Create ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_assigns_up_to_two_reviewers_from_the_team() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3", "u4"]).await;

    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    assert_eq!(pr.status, PullRequestStatus::Open);
    assert_eq!(pr.author_id, "u1");
    assert_eq!(pr.reviewers.len(), 2);
    assert!(!pr.has_reviewer("u1"));
    assert!(pr.reviewers.iter().all(|r| ["u2", "u3", "u4"].contains(&r.as_str())));
    assert_ne!(pr.reviewers[0], pr.reviewers[1]);

    let stored = engine.store().get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.reviewers, pr.reviewers);
  }

  #[tokio::test]
  async fn create_in_team_without_peers_has_no_reviewers() {
    let engine = engine_with_team("solo", &["u1"]).await;
    let pr = engine.create_pull_request("pr-1", "Lonely", "u1").await.unwrap();
    assert!(pr.reviewers.is_empty());
  }

  #[tokio::test]
  async fn create_skips_inactive_members() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3"]).await;
    engine.set_active("u3", false).await.unwrap();

    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    assert_eq!(pr.reviewers, ["u2"]);
  }

  #[tokio::test]
  async fn create_with_unknown_author_fails() {
    let engine = engine_with_team("backend", &["u1", "u2"]).await;
    let err = engine.create_pull_request("pr-1", "Add search", "ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserNotFound);

    let err = engine.create_pull_request("pr-1", "Add search", "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserNotFound);
  }

  #[tokio::test]
  async fn create_duplicate_id_fails_without_touching_reviewers() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3"]).await;
    let first = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();

    let err = engine.create_pull_request("pr-1", "Again", "u2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PullRequestAlreadyExists);

    let stored = engine.store().get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.name, "Add search");
    assert_eq!(stored.reviewers, first.reviewers);
  }

  // ── Merge ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn merge_is_idempotent_and_second_call_writes_nothing() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3"]).await;
    engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();

    let first = engine.merge("pr-1").await.unwrap();
    assert_eq!(first.status, PullRequestStatus::Merged);
    assert!(first.merged_at.is_some());

    let writes = engine.store().write_count();
    let second = engine.merge("pr-1").await.unwrap();
    assert_eq!(engine.store().write_count(), writes);
    assert_eq!(second, first);
  }

  #[tokio::test]
  async fn merge_unknown_pull_request_fails() {
    let engine = engine_with_team("backend", &["u1"]).await;
    let err = engine.merge("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PullRequestNotFound);
  }

  #[tokio::test]
  async fn merge_of_a_row_deleted_before_the_write_is_not_found() {
    let engine = engine_with_team("backend", &["u1", "u2"]).await;
    engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    engine.store().vanish_on_save("pr-1").await;

    let err = engine.merge("pr-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PullRequestNotFound);
    assert!(engine.store().get_pull_request("pr-1").await.is_err());
  }

  #[tokio::test]
  async fn merge_surfaces_store_failure_as_internal() {
    let engine = engine_with_team("backend", &["u1", "u2"]).await;
    engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    engine.store().fail_writes_for("pr-1").await;

    let err = engine.merge("pr-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.to_string(), "internal error");
  }

  // ── Reassign ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reassign_picks_a_fresh_reviewer() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3", "u4", "u5"]).await;
    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    let old = pr.reviewers[0].clone();

    let outcome = engine.reassign("pr-1", &old).await.unwrap();
    assert_ne!(outcome.replaced_by, old);
    assert_ne!(outcome.replaced_by, "u1");
    assert!(!pr.has_reviewer(&outcome.replaced_by));

    let updated = outcome.pull_request;
    assert_eq!(updated.reviewers.len(), 2);
    assert!(!updated.has_reviewer(&old));
    assert_eq!(updated.reviewers[0], outcome.replaced_by);
    assert_eq!(updated.reviewers[1], pr.reviewers[1]);

    let stored = engine.store().get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.reviewers, updated.reviewers);
  }

  #[tokio::test]
  async fn reassign_draws_from_the_old_reviewers_team() {
    let engine = engine_with_team("backend", &["u1", "u2"]).await;
    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    assert_eq!(pr.reviewers, ["u2"]);

    // u2 moves to another team; its replacement must come from there.
    engine.create_team("platform", vec![member("u2"), member("p1")]).await.unwrap();
    assert_eq!(engine.store().get_user("u2").await.unwrap().team_name, "platform");

    let outcome = engine.reassign("pr-1", "u2").await.unwrap();
    assert_eq!(outcome.replaced_by, "p1");
  }

  #[tokio::test]
  async fn reassign_without_candidates_fails() {
    let engine = engine_with_team("small", &["u1", "u2"]).await;
    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    assert_eq!(pr.reviewers, ["u2"]);

    let err = engine.reassign("pr-1", "u2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoCandidates);

    let stored = engine.store().get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.reviewers, ["u2"]);
  }

  #[tokio::test]
  async fn reassign_never_duplicates_the_other_reviewer() {
    // u1 authors; u2 and u3 review; only u4 is a valid replacement.
    let engine = engine_with_team("backend", &["u1", "u2", "u3", "u4"]).await;
    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    let old = pr.reviewers[0].clone();
    let other = pr.reviewers[1].clone();

    let outcome = engine.reassign("pr-1", &old).await.unwrap();
    assert_ne!(outcome.replaced_by, other);
    let expected: Vec<_> = ["u2", "u3", "u4"]
      .into_iter()
      .filter(|id| *id != old && *id != other)
      .collect();
    assert_eq!(expected, [outcome.replaced_by.as_str()]);
  }

  #[tokio::test]
  async fn reassign_unknown_or_unassigned_user_reports_not_assigned() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3", "u4"]).await;
    engine.set_active("u4", false).await.unwrap();
    engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();

    let unknown = engine.reassign("pr-1", "ghost").await.unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::ReviewerNotAssigned);

    // u4 exists but, being inactive, was never assigned.
    let unassigned = engine.reassign("pr-1", "u4").await.unwrap_err();
    assert_eq!(unassigned.kind(), ErrorKind::ReviewerNotAssigned);
  }

  #[tokio::test]
  async fn reassign_on_missing_pull_request_fails() {
    let engine = engine_with_team("backend", &["u1", "u2"]).await;
    let err = engine.reassign("pr-404", "u2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PullRequestNotFound);
  }

  // ── End to end ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_reassign_merge_then_frozen() {
    let engine = engine_with_team("backend", &["u1", "u2", "u3", "u4"]).await;

    let pr = engine.create_pull_request("pr-1", "Add search", "u1").await.unwrap();
    assert!(!pr.reviewers.is_empty() && pr.reviewers.len() <= 2);
    let first = pr.reviewers[0].clone();

    let outcome = engine.reassign("pr-1", &first).await.unwrap();
    assert_ne!(outcome.replaced_by, first);
    assert_ne!(outcome.replaced_by, "u1");

    let merged = engine.merge("pr-1").await.unwrap();
    assert_eq!(merged.status, PullRequestStatus::Merged);
    let again = engine.merge("pr-1").await.unwrap();
    assert_eq!(again, merged);

    let current = merged.reviewers[0].clone();
    let err = engine.reassign("pr-1", &current).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PullRequestMerged);

    let stored = engine.store().get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.reviewers, merged.reviewers);
    assert_eq!(stored.status, PullRequestStatus::Merged);
  }
}
