//! Bulk deactivation of team members with best-effort reviewer reassignment.
//!
//! Replacement candidates come from a single snapshot of the team's active
//! members, read once per call. Each affected pull request is written with a
//! single reviewer-list replacement; there is no transaction spanning pull
//! requests, so a failed call may leave earlier pull requests updated.
//! Retrying is safe: deactivating an inactive user and rewriting the same
//! reviewer list are both no-ops.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  engine::ReviewEngine,
  pull_request::PullRequest,
  store::{PullRequestStore, StoreResultExt as _, TeamStore, UserStore},
  team::User,
};

/// Aggregate counters returned by [`ReviewEngine::bulk_deactivate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeactivationSummary {
  pub team_name:              String,
  pub deactivated_users:      usize,
  /// Reviewer slots that received a replacement.
  pub reassignments_done:     usize,
  /// Reviewer slots left empty because the snapshot had no candidate.
  pub reassignments_skipped:  usize,
  /// Pull requests with at least one replacement.
  pub affected_pull_requests: usize,
}

/// Reviewer list computed for one pull request.
struct ReviewerPlan {
  reviewers: Vec<String>,
  replaced:  usize,
  skipped:   usize,
}

impl<S> ReviewEngine<S>
where
  S: TeamStore + UserStore + PullRequestStore,
{
  /// Deactivate the listed members of `team_name` and replace them on every
  /// open pull request they review.
  ///
  /// Ids that are unknown, already inactive or outside the team are ignored.
  /// Fails with [`Error::UserNotFound`] only if nobody was deactivated.
  pub async fn bulk_deactivate(
    &self,
    team_name: &str,
    user_ids:  &[String],
  ) -> Result<DeactivationSummary> {
    let team = self
      .store
      .get_team(team_name)
      .await
      .or_missing(|| Error::TeamNotFound(team_name.to_owned()))?;

    let nobody = || Error::UserNotFound(user_ids.join(", "));
    let deactivated = self
      .store
      .deactivate_team_members(&team.name, user_ids)
      .await
      .or_missing(nobody)?;
    if deactivated.is_empty() {
      warn!(team = %team.name, requested = user_ids.len(), "no users deactivated");
      return Err(nobody());
    }

    let deactivated_ids: Vec<String> = deactivated.iter().map(|u| u.user_id.clone()).collect();
    let gone: HashSet<&str> = deactivated_ids.iter().map(String::as_str).collect();

    let prs = self
      .store
      .open_pull_requests_reviewed_by(&deactivated_ids)
      .await
      .or_internal()?;
    let snapshot = self.store.active_team_members(&team.name).await.or_internal()?;
    debug!(
      team = %team.name,
      pull_requests = prs.len(),
      candidates = snapshot.len(),
      "bulk deactivation snapshot loaded"
    );

    let mut summary = DeactivationSummary {
      team_name: team.name.clone(),
      deactivated_users: deactivated.len(),
      ..Default::default()
    };

    for pr in &prs {
      let plan = self.plan_reviewers(pr, &gone, &snapshot);
      summary.reassignments_done += plan.replaced;
      summary.reassignments_skipped += plan.skipped;
      if plan.replaced > 0 {
        summary.affected_pull_requests += 1;
      }
      if plan.reviewers != pr.reviewers {
        self
          .store
          .replace_all_reviewers(&pr.pull_request_id, &plan.reviewers)
          .await
          .or_internal()?;
      }
    }

    info!(
      team = %summary.team_name,
      deactivated = summary.deactivated_users,
      reassigned = summary.reassignments_done,
      skipped = summary.reassignments_skipped,
      prs = summary.affected_pull_requests,
      "bulk deactivation completed"
    );
    Ok(summary)
  }

  /// Walk the reviewers of `pr` in order, keeping survivors and replacing
  /// each deactivated reviewer with a snapshot candidate that is not the
  /// author and not already on this pull request.
  fn plan_reviewers<'a>(
    &self,
    pr:       &'a PullRequest,
    gone:     &HashSet<&'a str>,
    snapshot: &'a [User],
  ) -> ReviewerPlan {
    let mut excluded: HashSet<&str> = pr
      .reviewers
      .iter()
      .map(String::as_str)
      .filter(|id| !gone.contains(id))
      .collect();
    excluded.insert(&pr.author_id);
    excluded.extend(gone.iter().copied());

    let mut plan = ReviewerPlan {
      reviewers: Vec::with_capacity(pr.reviewers.len()),
      replaced:  0,
      skipped:   0,
    };
    for reviewer in &pr.reviewers {
      if !gone.contains(reviewer.as_str()) {
        plan.reviewers.push(reviewer.clone());
        continue;
      }
      match self.selector.pick(snapshot, &excluded, 1).into_iter().next() {
        Some(candidate) => {
          excluded.insert(&candidate.user_id);
          plan.reviewers.push(candidate.user_id.clone());
          plan.replaced += 1;
        }
        None => {
          warn!(
            pr_id = %pr.pull_request_id,
            user = %reviewer,
            "no candidate, reviewer slot left empty"
          );
          plan.skipped += 1;
        }
      }
    }
    plan
  }
}
