//! Teams and the users that belong to them.
//!
//! A team is identified by its name. Users are identified by their external
//! user id and belong to exactly one team at a time.

use serde::{Deserialize, Serialize};

/// A person who can author pull requests and be asked to review them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:   String,
  pub username:  String,
  pub team_name: String,
  /// Inactive users are never picked as reviewers.
  pub is_active: bool,
}

/// A member as supplied on team creation; the team is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
  pub user_id:   String,
  pub username:  String,
  pub is_active: bool,
}

impl NewMember {
  pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
    Self { user_id: user_id.into(), username: username.into(), is_active: true }
  }

  pub fn inactive(mut self) -> Self {
    self.is_active = false;
    self
  }
}

/// A named group of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub name:    String,
  pub members: Vec<User>,
}

impl Team {
  /// Build a team from the supplied members.
  ///
  /// A user id listed more than once keeps its first position and takes the
  /// values of its last occurrence.
  pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = NewMember>) -> Self {
    let name = name.into();
    let mut users: Vec<User> = Vec::new();

    for member in members {
      let user = User {
        user_id:   member.user_id,
        username:  member.username,
        team_name: name.clone(),
        is_active: member.is_active,
      };
      match users.iter_mut().find(|u| u.user_id == user.user_id) {
        Some(existing) => *existing = user,
        None => users.push(user),
      }
    }

    Self { name, members: users }
  }

  pub fn member(&self, user_id: &str) -> Option<&User> {
    self.members.iter().find(|u| u.user_id == user_id)
  }

  pub fn active_members(&self) -> impl Iterator<Item = &User> {
    self.members.iter().filter(|u| u.is_active)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_team_stamps_team_name_on_members() {
    let team = Team::new("backend", [NewMember::new("u1", "Alice"), NewMember::new("u2", "Bob")]);
    assert_eq!(team.members.len(), 2);
    assert!(team.members.iter().all(|u| u.team_name == "backend"));
  }

  #[test]
  fn repeated_member_keeps_position_and_last_values() {
    let team = Team::new(
      "backend",
      [
        NewMember::new("u1", "Alice"),
        NewMember::new("u2", "Bob"),
        NewMember::new("u1", "Alicia").inactive(),
      ],
    );
    assert_eq!(team.members.len(), 2);
    assert_eq!(team.members[0].user_id, "u1");
    assert_eq!(team.members[0].username, "Alicia");
    assert!(!team.members[0].is_active);
  }

  #[test]
  fn active_members_skips_inactive() {
    let team = Team::new(
      "backend",
      [NewMember::new("u1", "Alice"), NewMember::new("u2", "Bob").inactive()],
    );
    let active: Vec<_> = team.active_members().map(|u| u.user_id.as_str()).collect();
    assert_eq!(active, ["u1"]);
    assert!(team.member("u2").is_some());
    assert!(team.member("u3").is_none());
  }
}
