//! Error type for `rota-store-sqlite`.

use rota_core::store::{StoreErrorKind, StoreFailure};
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("not found: {0}")]
  NotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  fn sqlite_failure(&self) -> Option<&rusqlite::Error> {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => Some(e),
      _ => None,
    }
  }
}

impl StoreFailure for Error {
  fn kind(&self) -> StoreErrorKind {
    if let Self::NotFound(_) = self {
      return StoreErrorKind::NotFound;
    }
    match self.sqlite_failure() {
      Some(rusqlite::Error::QueryReturnedNoRows) => StoreErrorKind::NotFound,
      Some(rusqlite::Error::SqliteFailure(e, _))
        if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
          || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
      {
        StoreErrorKind::Duplicate
      }
      _ => StoreErrorKind::Other,
    }
  }
}
