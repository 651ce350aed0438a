//! Teams, user activity and per-user review listings.

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  engine::ReviewEngine,
  pull_request::PullRequest,
  store::{PullRequestStore, StoreResultExt as _, TeamStore, UserStore},
  team::{NewMember, Team, User},
};

impl<S: TeamStore> ReviewEngine<S> {
  /// Create `team_name` and upsert its members into it.
  ///
  /// A member that already belongs to another team is moved into this one.
  pub async fn create_team(&self, team_name: &str, members: Vec<NewMember>) -> Result<Team> {
    let team = Team::new(team_name, members);
    self.store.create_team(&team).await.or_duplicate(|| {
      warn!(team = %team_name, "team already exists");
      Error::TeamAlreadyExists(team_name.to_owned())
    })?;
    info!(team = %team.name, members = team.members.len(), "team created");
    Ok(team)
  }

  pub async fn get_team(&self, team_name: &str) -> Result<Team> {
    self
      .store
      .get_team(team_name)
      .await
      .or_missing(|| Error::TeamNotFound(team_name.to_owned()))
  }
}

impl<S: UserStore> ReviewEngine<S> {
  /// Toggle one user's active flag. Pull requests the user already reviews
  /// are left alone.
  pub async fn set_active(&self, user_id: &str, active: bool) -> Result<User> {
    let user = self
      .store
      .set_user_active(user_id, active)
      .await
      .or_missing(|| Error::UserNotFound(user_id.to_owned()))?;
    info!(user = %user_id, active, "user activity updated");
    Ok(user)
  }

  pub async fn get_user(&self, user_id: &str) -> Result<User> {
    self
      .store
      .get_user(user_id)
      .await
      .or_missing(|| Error::UserNotFound(user_id.to_owned()))
  }
}

impl<S> ReviewEngine<S>
where
  S: UserStore + PullRequestStore,
{
  /// Every pull request, of any status, that `user_id` reviews.
  pub async fn user_reviews(&self, user_id: &str) -> Result<Vec<PullRequest>> {
    let user = self.get_user(user_id).await?;
    let prs = self.store.pull_requests_reviewed_by(&user.user_id).await.or_internal()?;
    debug!(user = %user_id, count = prs.len(), "user reviews loaded");
    Ok(prs)
  }
}
