//! [`ReviewEngine`], the entry point for every operation a transport exposes.
//!
//! The operations themselves live next to the concern they implement:
//!
//! - [`crate::lifecycle`]: create, merge and reassign a pull request
//! - [`crate::deactivation`]: bulk deactivation with reviewer reassignment
//! - [`crate::membership`]: teams, user activity and review listings
//! - [`crate::stats`]: assignment statistics

use std::sync::Arc;

use crate::{selector::ReviewerSelector, store::Store};

/// Reviewers assigned to a newly created pull request, at most.
pub const MAX_REVIEWERS: usize = 2;

pub struct ReviewEngine<S> {
  pub(crate) store:    Arc<S>,
  pub(crate) selector: ReviewerSelector,
}

impl<S: Store> ReviewEngine<S> {
  /// An engine drawing reviewers with an entropy-seeded generator.
  pub fn new(store: Arc<S>) -> Self { Self::with_selector(store, ReviewerSelector::from_entropy()) }

  pub fn with_selector(store: Arc<S>, selector: ReviewerSelector) -> Self {
    Self { store, selector }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }
}
