//! Error types for `haven-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::cafe::{
  menu::Temperature,
  order::OrderStatus,
  settings::ClosedReason,
};

#[derive(Debug, Error)]
pub enum Error {
  // ── Gift exchange ─────────────────────────────────────────────────────

  #[error("need at least 2 participants to generate matches (have {0})")]
  NotEnoughParticipants(usize),

  #[error("participant {0} appears more than once")]
  DuplicateParticipant(Uuid),

  #[error("participant {0} was matched with themselves")]
  ResidualSelfMatch(Uuid),

  #[error("generated matching is not a permutation of the participants")]
  BrokenPermutation,

  #[error("invalid event id {0:?}: expected YYYY-MM-DD")]
  InvalidEventId(String),

  #[error("cannot {action} while the reveal is {phase}")]
  InvalidRevealTransition {
    action: &'static str,
    phase:  &'static str,
  },

  // ── Café ──────────────────────────────────────────────────────────────

  #[error("{0}")]
  Validation(String),

  #[error("{item} requires a temperature choice")]
  TemperatureRequired { item: String },

  #[error("{item} is not served {temperature}")]
  TemperatureNotOffered {
    item:        String,
    temperature: Temperature,
  },

  #[error("{item} has no strength option")]
  StrengthNotOffered { item: String },

  #[error("{0} is not available right now")]
  ItemUnavailable(String),

  #[error("order cannot move from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("the café is closed: {0}")]
  CafeClosed(ClosedReason),

  #[error("an identical order is already pending: {0}")]
  DuplicateOrder(Uuid),
}

impl Error {
  /// Errors that indicate a bug rather than bad input.
  pub fn is_internal(&self) -> bool {
    matches!(self, Self::ResidualSelfMatch(_) | Self::BrokenPermutation)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
