//! Random reviewer selection.
//!
//! [`ReviewerSelector`] owns its random source so tests can swap in a seeded
//! generator without touching any process-wide state.

use std::{
  collections::HashSet,
  sync::{Mutex, PoisonError},
};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rand_core::RngCore;

use crate::{store::UserStore, team::User};

pub struct ReviewerSelector {
  rng: Mutex<Box<dyn RngCore + Send>>,
}

impl ReviewerSelector {
  pub fn from_entropy() -> Self { Self::with_rng(StdRng::from_entropy()) }

  /// Deterministic selection: the same seed and the same store state yield
  /// the same picks.
  pub fn seeded(seed: u64) -> Self { Self::with_rng(StdRng::seed_from_u64(seed)) }

  pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
    Self { rng: Mutex::new(Box::new(rng)) }
  }

  /// Shuffle the active users of `pool` that are not in `excluded` and return
  /// at most `limit` of them. A `limit` of zero returns every eligible user.
  ///
  /// No store access; used directly against a pre-loaded snapshot.
  pub fn pick<'a>(
    &self,
    pool:     &'a [User],
    excluded: &HashSet<&str>,
    limit:    usize,
  ) -> Vec<&'a User> {
    let mut eligible: Vec<&User> = pool
      .iter()
      .filter(|u| u.is_active && !excluded.contains(u.user_id.as_str()))
      .collect();

    if eligible.is_empty() {
      return eligible;
    }

    {
      let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
      eligible.shuffle(&mut **rng);
    }

    if limit > 0 {
      eligible.truncate(limit);
    }
    eligible
  }

  /// Read the active members of `team_name` and [`pick`](Self::pick) from
  /// them.
  pub async fn select<S: UserStore>(
    &self,
    store:     &S,
    team_name: &str,
    excluded:  &HashSet<&str>,
    limit:     usize,
  ) -> Result<Vec<User>, S::Error> {
    let pool = store.active_team_members(team_name).await?;
    let picked = self.pick(&pool, excluded, limit).into_iter().cloned().collect::<Vec<_>>();
    tracing::debug!(
      team = %team_name,
      pool = pool.len(),
      picked = picked.len(),
      "reviewers selected"
    );
    Ok(picked)
  }
}

impl Default for ReviewerSelector {
  fn default() -> Self { Self::from_entropy() }
}
