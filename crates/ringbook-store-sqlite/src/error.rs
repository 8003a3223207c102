//! Error type for `ringbook-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A directory entry could not be read back after creation.
  #[error("directory entry not found: {0}")]
  EntryNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
