//! Orders, their status lifecycle, and duplicate detection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  cafe::menu::{Strength, Temperature},
};

/// Largest quantity accepted on a single order line.
pub const MAX_QUANTITY: u32 = 10;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }

  /// Validate a status change. Only pending orders can move, and only to a
  /// terminal state.
  pub fn transition(self, to: OrderStatus) -> Result<OrderStatus> {
    match (self, to) {
      (Self::Pending, Self::Completed | Self::Cancelled) => Ok(to),
      (from, to) => Err(Error::InvalidTransition { from, to }),
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:    Uuid,
  pub member_id:   Uuid,
  pub menu_id:     Uuid,
  pub quantity:    u32,
  pub temperature: Option<Temperature>,
  pub strength:    Option<Strength>,
  pub note:        Option<String>,
  pub status:      OrderStatus,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// An order with member, village and menu display names joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
  #[serde(flatten)]
  pub order:        Order,
  pub member_name:  String,
  pub village_name: String,
  pub menu_name:    String,
}

/// A validated order ready to be stored. Options have already been resolved
/// against the menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub member_id:   Uuid,
  pub menu_id:     Uuid,
  pub quantity:    u32,
  pub temperature: Option<Temperature>,
  pub strength:    Option<Strength>,
  pub note:        Option<String>,
}

impl NewOrder {
  /// Check the quantity and trim the note.
  pub fn validate(mut self) -> Result<Self> {
    if self.quantity == 0 || self.quantity > MAX_QUANTITY {
      return Err(Error::Validation(format!(
        "quantity must be between 1 and {MAX_QUANTITY}"
      )));
    }
    self.note = self
      .note
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty());
    Ok(self)
  }

  fn same_drink(&self, order: &Order) -> bool {
    order.member_id == self.member_id
      && order.menu_id == self.menu_id
      && order.temperature == self.temperature
      && order.strength == self.strength
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Parameters for [`OrderStore::list_orders`](crate::store::OrderStore::list_orders).
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  pub status:        Option<OrderStatus>,
  pub member_id:     Option<Uuid>,
  /// Inclusive lower bound on `created_at`.
  pub created_after: Option<DateTime<Utc>>,
  /// Exclusive upper bound on `created_at`.
  pub created_before: Option<DateTime<Utc>>,
}

impl OrderFilter {
  pub fn matches(&self, order: &Order) -> bool {
    self.status.is_none_or(|s| order.status == s)
      && self.member_id.is_none_or(|m| order.member_id == m)
      && self.created_after.is_none_or(|t| order.created_at >= t)
      && self.created_before.is_none_or(|t| order.created_at < t)
  }
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

/// Find a pending order that `candidate` would duplicate.
///
/// A duplicate is the same member ordering the same item with the same
/// options while an earlier such order is still pending and was placed no
/// more than `window` before `now`. When several match, the most recent one
/// is returned.
pub fn find_duplicate<'a>(
  recent: &'a [Order],
  candidate: &NewOrder,
  now: DateTime<Utc>,
  window: Duration,
) -> Option<&'a Order> {
  recent
    .iter()
    .filter(|o| o.status == OrderStatus::Pending)
    .filter(|o| candidate.same_drink(o))
    .filter(|o| now - o.created_at <= window)
    .max_by_key(|o| o.created_at)
}

/// Result of [`OrderStore::place_order`](crate::store::OrderStore::place_order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
  Created(OrderView),
  /// A pending twin already exists; nothing was written.
  Duplicate(OrderView),
}
