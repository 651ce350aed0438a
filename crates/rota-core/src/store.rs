//! Store traits consumed by the engine.
//!
//! Backends (e.g. `rota-store-sqlite`, [`crate::memory`]) implement these
//! contracts. The engine and the transports depend only on the traits.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use crate::{
  Error, Result,
  pull_request::PullRequest,
  stats::{PullRequestAssignments, UserAssignments},
  team::{Team, User},
};

// ─── Failure taxonomy ────────────────────────────────────────────────────────

/// How a store failure should be read by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// The addressed row does not exist.
  NotFound,
  /// A unique constraint rejected the write.
  Duplicate,
  Other,
}

/// Implemented by every backend error type.
pub trait StoreFailure: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

/// Shared by the capability traits below so a backend has a single error type.
pub trait Store: Send + Sync {
  type Error: StoreFailure;
}

// ─── Capabilities ────────────────────────────────────────────────────────────

pub trait TeamStore: Store {
  /// Persist a new team and upsert all of its members into it, atomically.
  ///
  /// Members that already exist elsewhere are moved into this team and take
  /// the supplied username and active flag. Fails with a `Duplicate` error if
  /// the team name is taken.
  fn create_team(&self, team: &Team) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// The team with all of its members, or a `NotFound` error.
  fn get_team(&self, name: &str) -> impl Future<Output = Result<Team, Self::Error>> + Send;
}

pub trait UserStore: Store {
  /// Look up a user by external id, or fail with `NotFound`.
  fn get_user(&self, user_id: &str) -> impl Future<Output = Result<User, Self::Error>> + Send;

  /// Every currently active member of `team_name`. Possibly empty.
  fn active_team_members(
    &self,
    team_name: &str,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send;

  /// Set a single user's active flag and return the updated user.
  fn set_user_active(
    &self,
    user_id: &str,
    active: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send;

  /// Deactivate every listed user that is an active member of `team_name`,
  /// atomically, and return exactly the users that were changed.
  fn deactivate_team_members(
    &self,
    team_name: &str,
    user_ids: &[String],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send;
}

pub trait PullRequestStore: Store {
  /// Insert the pull request row. Reviewer links are written separately with
  /// [`attach_reviewers`](Self::attach_reviewers). Fails with `Duplicate` if
  /// the id is taken.
  fn create_pull_request(
    &self,
    pr: &PullRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// The pull request with its reviewers loaded, or `NotFound`.
  fn get_pull_request(
    &self,
    pull_request_id: &str,
  ) -> impl Future<Output = Result<PullRequest, Self::Error>> + Send;

  /// Write name, status and merge time. Returns the number of rows affected.
  fn save_pull_request(
    &self,
    pr: &PullRequest,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  /// Append reviewer links. Links that already exist are left untouched.
  fn attach_reviewers(
    &self,
    pull_request_id: &str,
    user_ids: &[String],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Remove the link to `old_user_id` and add one to `new_user_id`, atomically.
  fn replace_reviewer(
    &self,
    pull_request_id: &str,
    old_user_id: &str,
    new_user_id: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Replace the whole reviewer list of one pull request, atomically.
  fn replace_all_reviewers(
    &self,
    pull_request_id: &str,
    user_ids: &[String],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Open pull requests where at least one of `user_ids` is a reviewer.
  fn open_pull_requests_reviewed_by(
    &self,
    user_ids: &[String],
  ) -> impl Future<Output = Result<Vec<PullRequest>, Self::Error>> + Send;

  /// Pull requests of any status where `user_id` is a reviewer.
  fn pull_requests_reviewed_by(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Vec<PullRequest>, Self::Error>> + Send;
}

pub trait StatsStore: Store {
  /// Reviewer link counts per user, most assigned first, ties by user id.
  fn assignments_by_user(
    &self,
  ) -> impl Future<Output = Result<Vec<UserAssignments>, Self::Error>> + Send;

  /// Reviewer counts per pull request, highest first, ties by pull request id.
  fn assignments_by_pull_request(
    &self,
  ) -> impl Future<Output = Result<Vec<PullRequestAssignments>, Self::Error>> + Send;
}

/// Everything the engine and the API need from a backend.
pub trait RotaStore: TeamStore + UserStore + PullRequestStore + StatsStore {}

impl<T> RotaStore for T where T: TeamStore + UserStore + PullRequestStore + StatsStore {}

// ─── Translation into domain errors ──────────────────────────────────────────

pub(crate) trait StoreResultExt<T> {
  /// Read a `NotFound` failure as `missing()`; anything else is internal.
  fn or_missing(self, missing: impl FnOnce() -> Error) -> Result<T>;

  /// Read a `Duplicate` failure as `duplicate()`; anything else is internal.
  fn or_duplicate(self, duplicate: impl FnOnce() -> Error) -> Result<T>;

  fn or_internal(self) -> Result<T>;
}

impl<T, E: StoreFailure> StoreResultExt<T> for Result<T, E> {
  fn or_missing(self, missing: impl FnOnce() -> Error) -> Result<T> {
    self.map_err(|e| match e.kind() {
      StoreErrorKind::NotFound => missing(),
      _ => Error::internal(e),
    })
  }

  fn or_duplicate(self, duplicate: impl FnOnce() -> Error) -> Result<T> {
    self.map_err(|e| match e.kind() {
      StoreErrorKind::Duplicate => duplicate(),
      _ => Error::internal(e),
    })
  }

  fn or_internal(self) -> Result<T> { self.map_err(Error::internal) }
}
