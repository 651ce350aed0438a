//! SQL schema for the Rota SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS teams (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

-- A user belongs to exactly one team; re-creating a team elsewhere moves it.
CREATE TABLE IF NOT EXISTS users (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL UNIQUE,
    username   TEXT NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 1,
    team_id    INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS pull_requests (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    pr_id       TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'OPEN',   -- 'OPEN' | 'MERGED'
    author_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,                  -- RFC 3339 UTC
    merged_at   TEXT
);

-- position keeps reviewers in assignment order.
CREATE TABLE IF NOT EXISTS pr_reviewers (
    pull_request_id  INTEGER NOT NULL REFERENCES pull_requests(id) ON DELETE CASCADE,
    user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    position         INTEGER NOT NULL,
    PRIMARY KEY (pull_request_id, user_id)
);

CREATE INDEX IF NOT EXISTS users_team_idx         ON users(team_id);
CREATE INDEX IF NOT EXISTS pull_requests_status_idx ON pull_requests(status);
CREATE INDEX IF NOT EXISTS pr_reviewers_user_idx  ON pr_reviewers(user_id);

PRAGMA user_version = 1;
";
