//! Error type for `haven-store-memory`.
//!
//! The variants mirror the constraints the SQLite schema enforces, so both
//! backends classify the same mistakes the same way.

use haven_core::store::{ErrorClass, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("village not found: {0}")]
  VillageNotFound(Uuid),

  #[error("{what} {name:?} already exists")]
  Duplicate { what: &'static str, name: String },

  #[error("{what} {id} is still referenced")]
  InUse { what: &'static str, id: Uuid },

  #[error("{what} {id} does not exist")]
  MissingReference { what: &'static str, id: Uuid },

  #[error("match would pair participant {0} with themselves")]
  SelfMatch(Uuid),

  #[error("participant {0} appears twice on one side of the matching")]
  RepeatedInMatching(Uuid),
}

impl StoreError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::VillageNotFound(_) => ErrorClass::NotFound,
      _ => ErrorClass::Conflict,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
