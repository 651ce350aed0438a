//! In-memory implementation of the store traits.
//!
//! All state lives in a `BTreeMap`-backed [`State`] behind a `RwLock` and is
//! lost when the store is dropped. Iteration order is by id, so results are
//! deterministic. Used by engine and API tests; it also exposes call
//! counters and per-pull-request write hooks for exercising failure paths.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap, HashSet},
  sync::atomic::{AtomicUsize, Ordering},
};

use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
  pull_request::{PullRequest, PullRequestStatus},
  stats::{PullRequestAssignments, UserAssignments},
  store::{PullRequestStore, StatsStore, Store, StoreErrorKind, StoreFailure, TeamStore, UserStore},
  team::{Team, User},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("duplicate key: {0}")]
  Duplicate(String),

  #[error("injected write failure for {0}")]
  Injected(String),
}

impl StoreFailure for MemoryError {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Self::NotFound(_) => StoreErrorKind::NotFound,
      Self::Duplicate(_) => StoreErrorKind::Duplicate,
      Self::Injected(_) => StoreErrorKind::Other,
    }
  }
}

#[derive(Debug, Default)]
struct State {
  teams:         BTreeSet<String>,
  users:         BTreeMap<String, User>,
  pull_requests: BTreeMap<String, PullRequest>,
  /// Pull request ids whose writes fail with [`MemoryError::Injected`].
  failing:       HashSet<String>,
  /// Pull request ids deleted by the next save, which then reports zero rows.
  vanishing:     HashSet<String>,
}

impl State {
  fn pull_request_mut(&mut self, id: &str) -> Result<&mut PullRequest, MemoryError> {
    if self.failing.contains(id) {
      return Err(MemoryError::Injected(id.to_owned()));
    }
    self
      .pull_requests
      .get_mut(id)
      .ok_or_else(|| MemoryError::NotFound(format!("pull request {id}")))
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  state:        RwLock<State>,
  writes:       AtomicUsize,
  member_reads: AtomicUsize,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of mutating calls that reached the store, successful or not.
  pub fn write_count(&self) -> usize { self.writes.load(Ordering::SeqCst) }

  /// Number of `active_team_members` lookups.
  pub fn member_read_count(&self) -> usize { self.member_reads.load(Ordering::SeqCst) }

  /// Make every subsequent write touching `pull_request_id` fail.
  pub async fn fail_writes_for(&self, pull_request_id: &str) {
    self.state.write().await.failing.insert(pull_request_id.to_owned());
  }

  /// Delete `pull_request_id` when it is next saved, as if another writer
  /// removed it after it was read.
  pub async fn vanish_on_save(&self, pull_request_id: &str) {
    self.state.write().await.vanishing.insert(pull_request_id.to_owned());
  }

  fn record_write(&self) { self.writes.fetch_add(1, Ordering::SeqCst); }
}

impl Store for MemoryStore {
  type Error = MemoryError;
}

// ─── Teams ───────────────────────────────────────────────────────────────────

impl TeamStore for MemoryStore {
  async fn create_team(&self, team: &Team) -> Result<(), MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    if !state.teams.insert(team.name.clone()) {
      return Err(MemoryError::Duplicate(format!("team {}", team.name)));
    }
    for member in &team.members {
      state.users.insert(member.user_id.clone(), member.clone());
    }
    Ok(())
  }

  async fn get_team(&self, name: &str) -> Result<Team, MemoryError> {
    let state = self.state.read().await;
    if !state.teams.contains(name) {
      return Err(MemoryError::NotFound(format!("team {name}")));
    }
    let members = state.users.values().filter(|u| u.team_name == name).cloned().collect();
    Ok(Team { name: name.to_owned(), members })
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

impl UserStore for MemoryStore {
  async fn get_user(&self, user_id: &str) -> Result<User, MemoryError> {
    self
      .state
      .read()
      .await
      .users
      .get(user_id)
      .cloned()
      .ok_or_else(|| MemoryError::NotFound(format!("user {user_id}")))
  }

  async fn active_team_members(&self, team_name: &str) -> Result<Vec<User>, MemoryError> {
    self.member_reads.fetch_add(1, Ordering::SeqCst);
    let state = self.state.read().await;
    Ok(state.users.values().filter(|u| u.team_name == team_name && u.is_active).cloned().collect())
  }

  async fn set_user_active(&self, user_id: &str, active: bool) -> Result<User, MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    let user = state
      .users
      .get_mut(user_id)
      .ok_or_else(|| MemoryError::NotFound(format!("user {user_id}")))?;
    user.is_active = active;
    Ok(user.clone())
  }

  async fn deactivate_team_members(
    &self,
    team_name: &str,
    user_ids:  &[String],
  ) -> Result<Vec<User>, MemoryError> {
    self.record_write();
    let wanted: HashSet<&str> = user_ids.iter().map(String::as_str).collect();
    let mut state = self.state.write().await;
    let mut changed = Vec::new();
    for user in state.users.values_mut() {
      if user.team_name == team_name && user.is_active && wanted.contains(user.user_id.as_str()) {
        user.is_active = false;
        changed.push(user.clone());
      }
    }
    Ok(changed)
  }
}

// ─── Pull requests ───────────────────────────────────────────────────────────

impl PullRequestStore for MemoryStore {
  async fn create_pull_request(&self, pr: &PullRequest) -> Result<(), MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    if state.pull_requests.contains_key(&pr.pull_request_id) {
      return Err(MemoryError::Duplicate(format!("pull request {}", pr.pull_request_id)));
    }
    let row = PullRequest { reviewers: Vec::new(), ..pr.clone() };
    state.pull_requests.insert(pr.pull_request_id.clone(), row);
    Ok(())
  }

  async fn get_pull_request(&self, pull_request_id: &str) -> Result<PullRequest, MemoryError> {
    self
      .state
      .read()
      .await
      .pull_requests
      .get(pull_request_id)
      .cloned()
      .ok_or_else(|| MemoryError::NotFound(format!("pull request {pull_request_id}")))
  }

  async fn save_pull_request(&self, pr: &PullRequest) -> Result<u64, MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    if state.vanishing.remove(&pr.pull_request_id) {
      state.pull_requests.remove(&pr.pull_request_id);
    }
    match state.pull_request_mut(&pr.pull_request_id) {
      Ok(row) => {
        row.name = pr.name.clone();
        row.status = pr.status;
        row.merged_at = pr.merged_at;
        Ok(1)
      }
      Err(MemoryError::NotFound(_)) => Ok(0),
      Err(e) => Err(e),
    }
  }

  async fn attach_reviewers(
    &self,
    pull_request_id: &str,
    user_ids:        &[String],
  ) -> Result<(), MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    let row = state.pull_request_mut(pull_request_id)?;
    for id in user_ids {
      if !row.has_reviewer(id) {
        row.reviewers.push(id.clone());
      }
    }
    Ok(())
  }

  async fn replace_reviewer(
    &self,
    pull_request_id: &str,
    old_user_id:     &str,
    new_user_id:     &str,
  ) -> Result<(), MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    let row = state.pull_request_mut(pull_request_id)?;
    if row.has_reviewer(new_user_id) {
      row.reviewers.retain(|r| r != old_user_id);
    } else if !row.swap_reviewer(old_user_id, new_user_id) {
      row.reviewers.push(new_user_id.to_owned());
    }
    Ok(())
  }

  async fn replace_all_reviewers(
    &self,
    pull_request_id: &str,
    user_ids:        &[String],
  ) -> Result<(), MemoryError> {
    self.record_write();
    let mut state = self.state.write().await;
    let row = state.pull_request_mut(pull_request_id)?;
    row.reviewers.clear();
    for id in user_ids {
      if !row.has_reviewer(id) {
        row.reviewers.push(id.clone());
      }
    }
    Ok(())
  }

  async fn open_pull_requests_reviewed_by(
    &self,
    user_ids: &[String],
  ) -> Result<Vec<PullRequest>, MemoryError> {
    let state = self.state.read().await;
    Ok(
      state
        .pull_requests
        .values()
        .filter(|pr| pr.status == PullRequestStatus::Open)
        .filter(|pr| user_ids.iter().any(|id| pr.has_reviewer(id)))
        .cloned()
        .collect(),
    )
  }

  async fn pull_requests_reviewed_by(
    &self,
    user_id: &str,
  ) -> Result<Vec<PullRequest>, MemoryError> {
    let state = self.state.read().await;
    Ok(state.pull_requests.values().filter(|pr| pr.has_reviewer(user_id)).cloned().collect())
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

impl StatsStore for MemoryStore {
  async fn assignments_by_user(&self) -> Result<Vec<UserAssignments>, MemoryError> {
    let state = self.state.read().await;
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for pr in state.pull_requests.values() {
      for reviewer in &pr.reviewers {
        *counts.entry(reviewer.as_str()).or_default() += 1;
      }
    }

    let mut stats: Vec<UserAssignments> = counts
      .into_iter()
      .map(|(user_id, assignments)| UserAssignments {
        user_id: user_id.to_owned(),
        username: state.users.get(user_id).map(|u| u.username.clone()).unwrap_or_default(),
        assignments,
      })
      .collect();
    stats.sort_by(|a, b| b.assignments.cmp(&a.assignments).then_with(|| a.user_id.cmp(&b.user_id)));
    Ok(stats)
  }

  async fn assignments_by_pull_request(&self) -> Result<Vec<PullRequestAssignments>, MemoryError> {
    let state = self.state.read().await;
    let mut stats: Vec<PullRequestAssignments> = state
      .pull_requests
      .values()
      .filter(|pr| !pr.reviewers.is_empty())
      .map(|pr| PullRequestAssignments {
        pull_request_id: pr.pull_request_id.clone(),
        name:            pr.name.clone(),
        reviewers:       pr.reviewers.len() as u64,
      })
      .collect();
    stats.sort_by(|a, b| {
      b.reviewers.cmp(&a.reviewers).then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
    });
    Ok(stats)
  }
}
