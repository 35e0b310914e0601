//! Error type for `haven-store-sqlite`.

use haven_core::store::{ErrorClass, StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value no domain type maps to.
  #[error("cannot decode {what}: {value:?}")]
  Decode { what: &'static str, value: String },

  /// A row written inside the same call could not be read back.
  #[error("{0} row missing after write")]
  Vanished(&'static str),

  #[error("village not found: {0}")]
  VillageNotFound(uuid::Uuid),
}

impl Error {
  fn is_constraint_violation(&self) -> bool {
    matches!(
      self,
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == ErrorCode::ConstraintViolation
    )
  }
}

impl StoreError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::VillageNotFound(_) => ErrorClass::NotFound,
      e if e.is_constraint_violation() => ErrorClass::Conflict,
      _ => ErrorClass::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
