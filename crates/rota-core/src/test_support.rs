//! Fixtures shared by the engine tests.

use std::sync::Arc;

use crate::{ReviewEngine, memory::MemoryStore, selector::ReviewerSelector, team::NewMember};

pub fn engine() -> ReviewEngine<MemoryStore> {
  ReviewEngine::with_selector(Arc::new(MemoryStore::new()), ReviewerSelector::seeded(7))
}

/// An engine whose store holds one team of active members.
pub async fn engine_with_team(team_name: &str, user_ids: &[&str]) -> ReviewEngine<MemoryStore> {
  let engine = engine();
  engine
    .create_team(team_name, user_ids.iter().map(|id| member(id)).collect())
    .await
    .unwrap();
  engine
}

pub fn member(user_id: &str) -> NewMember { NewMember::new(user_id, format!("User {user_id}")) }

pub fn ids(user_ids: &[&str]) -> Vec<String> {
  user_ids.iter().map(|id| (*id).to_owned()).collect()
}
