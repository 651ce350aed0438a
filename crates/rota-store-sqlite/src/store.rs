//! [`SqliteStore`], the SQLite implementation of the Rota store traits.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _, Transaction};
use tracing::debug;

use rota_core::{
  pull_request::PullRequest,
  stats::{PullRequestAssignments, UserAssignments},
  store::{PullRequestStore, StatsStore, Store, TeamStore, UserStore},
  team::{Team, User},
};

use crate::{
  Error, Result,
  encode::{RawPullRequest, encode_dt, encode_status},
  schema::SCHEMA,
};

const USER_COLUMNS: &str = "u.user_id, u.username, t.name, u.is_active
   FROM users u JOIN teams t ON t.id = u.team_id";

const PULL_REQUEST_COLUMNS: &str =
  "p.id, p.pr_id, p.name, p.author_id, p.status, p.created_at, p.merged_at";

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run inside `Connection::call` closures, on the database thread.

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
  Ok(User {
    user_id:   row.get(0)?,
    username:  row.get(1)?,
    team_name: row.get(2)?,
    is_active: row.get(3)?,
  })
}

fn query_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} WHERE u.user_id = ?1"),
      rusqlite::params![user_id],
      read_user,
    )
    .optional()
}

fn pull_request_key(conn: &Connection, pr_id: &str) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row("SELECT id FROM pull_requests WHERE pr_id = ?1", rusqlite::params![pr_id], |r| {
      r.get(0)
    })
    .optional()
}

fn user_key(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row("SELECT id FROM users WHERE user_id = ?1", rusqlite::params![user_id], |r| {
      r.get(0)
    })
    .optional()
}

fn reviewer_ids(conn: &Connection, pr_key: i64) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT u.user_id
     FROM pr_reviewers r JOIN users u ON u.id = r.user_id
     WHERE r.pull_request_id = ?1
     ORDER BY r.position",
  )?;
  stmt
    .query_map(rusqlite::params![pr_key], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()
}

/// Run `sql` (selecting [`PULL_REQUEST_COLUMNS`]) and load each row's
/// reviewers.
fn query_pull_requests(
  conn:   &Connection,
  sql:    &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawPullRequest>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, |row| {
      Ok((row.get::<_, i64>(0)?, RawPullRequest {
        pr_id:      row.get(1)?,
        name:       row.get(2)?,
        author_id:  row.get(3)?,
        status:     row.get(4)?,
        created_at: row.get(5)?,
        merged_at:  row.get(6)?,
        reviewers:  Vec::new(),
      }))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(key, mut raw)| {
      raw.reviewers = reviewer_ids(conn, key)?;
      Ok(raw)
    })
    .collect()
}

/// Insert reviewer links after the current last position. Existing links are
/// kept where they are.
fn append_reviewers(
  tx:       &Transaction<'_>,
  pr_key:   i64,
  user_ids: &[String],
) -> rusqlite::Result<()> {
  let mut next: i64 = tx.query_row(
    "SELECT COALESCE(MAX(position) + 1, 0) FROM pr_reviewers WHERE pull_request_id = ?1",
    rusqlite::params![pr_key],
    |r| r.get(0),
  )?;
  for user_id in user_ids {
    let inserted = tx.execute(
      "INSERT OR IGNORE INTO pr_reviewers (pull_request_id, user_id, position)
       SELECT ?1, id, ?2 FROM users WHERE user_id = ?3",
      rusqlite::params![pr_key, next, user_id],
    )?;
    next += inserted as i64;
  }
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rota store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn require_pull_request(&self, pr_id: &str) -> Result<i64> {
    let id = pr_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(pull_request_key(conn, &id)?))
      .await?
      .ok_or_else(|| Error::NotFound(format!("pull request {pr_id}")))
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── Teams ───────────────────────────────────────────────────────────────────

impl TeamStore for SqliteStore {
  async fn create_team(&self, team: &Team) -> Result<()> {
    let team = team.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("INSERT INTO teams (name) VALUES (?1)", rusqlite::params![team.name])?;
        let team_key = tx.last_insert_rowid();
        for member in &team.members {
          tx.execute(
            "INSERT INTO users (user_id, username, is_active, team_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id) DO UPDATE SET
               username  = excluded.username,
               is_active = excluded.is_active,
               team_id   = excluded.team_id",
            rusqlite::params![member.user_id, member.username, member.is_active, team_key],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_team(&self, name: &str) -> Result<Team> {
    let team_name = name.to_owned();
    let team = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row("SELECT 1 FROM teams WHERE name = ?1", rusqlite::params![team_name], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} WHERE t.name = ?1 ORDER BY u.user_id"))?;
        let members = stmt
          .query_map(rusqlite::params![team_name], read_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(Team { name: team_name, members }))
      })
      .await?;
    team.ok_or_else(|| Error::NotFound(format!("team {name}")))
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  async fn get_user(&self, user_id: &str) -> Result<User> {
    let id = user_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(query_user(conn, &id)?))
      .await?
      .ok_or_else(|| Error::NotFound(format!("user {user_id}")))
  }

  async fn active_team_members(&self, team_name: &str) -> Result<Vec<User>> {
    let team_name = team_name.to_owned();
    let users = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} WHERE t.name = ?1 AND u.is_active = 1 ORDER BY u.user_id"
        ))?;
        let users = stmt
          .query_map(rusqlite::params![team_name], read_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
      })
      .await?;
    Ok(users)
  }

  async fn set_user_active(&self, user_id: &str, active: bool) -> Result<User> {
    let id = user_id.to_owned();
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET is_active = ?2 WHERE user_id = ?1",
          rusqlite::params![id, active],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(query_user(conn, &id)?)
      })
      .await?
      .ok_or_else(|| Error::NotFound(format!("user {user_id}")))
  }

  async fn deactivate_team_members(
    &self,
    team_name: &str,
    user_ids:  &[String],
  ) -> Result<Vec<User>> {
    let team_name = team_name.to_owned();
    let user_ids = user_ids.to_vec();
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = Vec::new();
        for user_id in &user_ids {
          let n = tx.execute(
            "UPDATE users SET is_active = 0
             WHERE user_id = ?1
               AND is_active = 1
               AND team_id = (SELECT id FROM teams WHERE name = ?2)",
            rusqlite::params![user_id, team_name],
          )?;
          if n == 0 {
            continue;
          }
          if let Some(user) = query_user(&tx, user_id)? {
            changed.push(user);
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    debug!(count = changed.len(), "team members deactivated");
    Ok(changed)
  }
}

// ─── Pull requests ───────────────────────────────────────────────────────────

impl PullRequestStore for SqliteStore {
  async fn create_pull_request(&self, pr: &PullRequest) -> Result<()> {
    let pr_id = pr.pull_request_id.clone();
    let name = pr.name.clone();
    let author_id = pr.author_id.clone();
    let status = encode_status(pr.status);
    let created_at = encode_dt(pr.created_at);
    let merged_at = pr.merged_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pull_requests (pr_id, name, status, author_id, created_at, merged_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![pr_id, name, status, author_id, created_at, merged_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_pull_request(&self, pull_request_id: &str) -> Result<PullRequest> {
    let id = pull_request_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {PULL_REQUEST_COLUMNS} FROM pull_requests p WHERE p.pr_id = ?1");
        Ok(query_pull_requests(conn, &sql, rusqlite::params![id])?.pop())
      })
      .await?;
    raw
      .ok_or_else(|| Error::NotFound(format!("pull request {pull_request_id}")))?
      .into_pull_request()
  }

  async fn save_pull_request(&self, pr: &PullRequest) -> Result<u64> {
    let pr_id = pr.pull_request_id.clone();
    let name = pr.name.clone();
    let status = encode_status(pr.status);
    let merged_at = pr.merged_at.map(encode_dt);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE pull_requests SET name = ?2, status = ?3, merged_at = ?4 WHERE pr_id = ?1",
          rusqlite::params![pr_id, name, status, merged_at],
        )?)
      })
      .await?;
    Ok(affected as u64)
  }

  async fn attach_reviewers(&self, pull_request_id: &str, user_ids: &[String]) -> Result<()> {
    let pr_key = self.require_pull_request(pull_request_id).await?;
    let user_ids = user_ids.to_vec();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        append_reviewers(&tx, pr_key, &user_ids)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn replace_reviewer(
    &self,
    pull_request_id: &str,
    old_user_id:     &str,
    new_user_id:     &str,
  ) -> Result<()> {
    let pr_key = self.require_pull_request(pull_request_id).await?;
    let old_id = old_user_id.to_owned();
    let new_id = new_user_id.to_owned();

    let replaced = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let (Some(old_key), Some(new_key)) = (user_key(&tx, &old_id)?, user_key(&tx, &new_id)?)
        else {
          return Ok(false);
        };
        let already_linked = tx
          .query_row(
            "SELECT 1 FROM pr_reviewers WHERE pull_request_id = ?1 AND user_id = ?2",
            rusqlite::params![pr_key, new_key],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        if already_linked {
          tx.execute(
            "DELETE FROM pr_reviewers WHERE pull_request_id = ?1 AND user_id = ?2",
            rusqlite::params![pr_key, old_key],
          )?;
        } else {
          // Takes over the old reviewer's position.
          let swapped = tx.execute(
            "UPDATE pr_reviewers SET user_id = ?3 WHERE pull_request_id = ?1 AND user_id = ?2",
            rusqlite::params![pr_key, old_key, new_key],
          )?;
          if swapped == 0 {
            append_reviewers(&tx, pr_key, std::slice::from_ref(&new_id))?;
          }
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !replaced {
      return Err(Error::NotFound(format!("user {old_user_id} or {new_user_id}")));
    }
    Ok(())
  }

  async fn replace_all_reviewers(&self, pull_request_id: &str, user_ids: &[String]) -> Result<()> {
    let pr_key = self.require_pull_request(pull_request_id).await?;
    let user_ids = user_ids.to_vec();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM pr_reviewers WHERE pull_request_id = ?1",
          rusqlite::params![pr_key],
        )?;
        append_reviewers(&tx, pr_key, &user_ids)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn open_pull_requests_reviewed_by(&self, user_ids: &[String]) -> Result<Vec<PullRequest>> {
    if user_ids.is_empty() {
      return Ok(Vec::new());
    }
    let user_ids = user_ids.to_vec();

    let raws = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
          "SELECT DISTINCT {PULL_REQUEST_COLUMNS}
           FROM pull_requests p
           JOIN pr_reviewers r ON r.pull_request_id = p.id
           JOIN users u        ON u.id = r.user_id
           WHERE p.status = 'OPEN' AND u.user_id IN ({placeholders})
           ORDER BY p.pr_id"
        );
        Ok(query_pull_requests(conn, &sql, rusqlite::params_from_iter(user_ids.iter()))?)
      })
      .await?;

    raws.into_iter().map(RawPullRequest::into_pull_request).collect()
  }

  async fn pull_requests_reviewed_by(&self, user_id: &str) -> Result<Vec<PullRequest>> {
    let id = user_id.to_owned();
    let raws = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PULL_REQUEST_COLUMNS}
           FROM pull_requests p
           JOIN pr_reviewers r ON r.pull_request_id = p.id
           JOIN users u        ON u.id = r.user_id
           WHERE u.user_id = ?1
           ORDER BY p.pr_id"
        );
        Ok(query_pull_requests(conn, &sql, rusqlite::params![id])?)
      })
      .await?;

    raws.into_iter().map(RawPullRequest::into_pull_request).collect()
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  async fn assignments_by_user(&self) -> Result<Vec<UserAssignments>> {
    let stats = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT u.user_id, u.username, COUNT(*) AS assignments
           FROM pr_reviewers r JOIN users u ON u.id = r.user_id
           GROUP BY u.id
           ORDER BY assignments DESC, u.user_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(UserAssignments {
              user_id:     row.get(0)?,
              username:    row.get(1)?,
              assignments: row.get::<_, i64>(2)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(stats)
  }

  async fn assignments_by_pull_request(&self) -> Result<Vec<PullRequestAssignments>> {
    let stats = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT p.pr_id, p.name, COUNT(*) AS reviewers
           FROM pr_reviewers r JOIN pull_requests p ON p.id = r.pull_request_id
           GROUP BY p.id
           ORDER BY reviewers DESC, p.pr_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(PullRequestAssignments {
              pull_request_id: row.get(0)?,
              name:            row.get(1)?,
              reviewers:       row.get::<_, i64>(2)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(stats)
  }
}
