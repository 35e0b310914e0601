//! Store traits, one per entity, and the error classification the API
//! relies on.
//!
//! The traits are implemented by storage backends (`haven-store-sqlite`,
//! `haven-store-memory`). The API depends on this abstraction, never on a
//! concrete backend; the binary picks one at startup.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  cafe::{
    menu::{MenuItem, MenuItemInput},
    order::{NewOrder, OrderFilter, OrderStatus, OrderView, Placement},
    settings::Settings,
    village::{MemberView, Village},
  },
  gift::{EventId, MatchView, NewMatch, NewParticipant, Participant},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Coarse error categories a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// A referenced row does not exist.
  NotFound,
  /// A uniqueness or referential constraint was violated.
  Conflict,
  /// Anything else: I/O, corrupt rows, bugs.
  Internal,
}

/// Implemented by every backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn class(&self) -> ErrorClass;
}

/// The associated error type shared by all entity stores of a backend.
pub trait Store: Send + Sync {
  type Error: StoreError;
}

// ─── Villages & members ──────────────────────────────────────────────────────

pub trait VillageStore: Store {
  /// Create a village. Names are unique (`Conflict`).
  fn create_village(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Village, Self::Error>> + Send + '_;

  /// All villages ordered by name.
  fn list_villages(&self) -> impl Future<Output = Result<Vec<Village>, Self::Error>> + Send + '_;

  fn get_village(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Village>, Self::Error>> + Send + '_;

  /// Returns `None` if the village does not exist.
  fn rename_village(
    &self,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Option<Village>, Self::Error>> + Send + '_;

  /// Returns `false` if the village does not exist; `Conflict` while members
  /// or participants still belong to it.
  fn delete_village(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

pub trait MemberStore: Store {
  /// `NotFound` for an unknown village, `Conflict` for a duplicate name
  /// within the village.
  fn create_member(
    &self,
    village_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<MemberView, Self::Error>> + Send + '_;

  /// Members ordered by village name then member name.
  fn list_members(
    &self,
    village_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<MemberView>, Self::Error>> + Send + '_;

  fn get_member(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MemberView>, Self::Error>> + Send + '_;

  fn update_member(
    &self,
    id: Uuid,
    village_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Option<MemberView>, Self::Error>> + Send + '_;

  /// Also deletes the member's orders.
  fn delete_member(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Menu ────────────────────────────────────────────────────────────────────

pub trait MenuStore: Store {
  fn create_menu_item(
    &self,
    input: MenuItemInput,
  ) -> impl Future<Output = Result<MenuItem, Self::Error>> + Send + '_;

  /// Items ordered by `(sort_order, name)`.
  fn list_menu_items(
    &self,
    only_available: bool,
  ) -> impl Future<Output = Result<Vec<MenuItem>, Self::Error>> + Send + '_;

  fn get_menu_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MenuItem>, Self::Error>> + Send + '_;

  fn update_menu_item(
    &self,
    id: Uuid,
    input: MenuItemInput,
  ) -> impl Future<Output = Result<Option<MenuItem>, Self::Error>> + Send + '_;

  /// `Conflict` while orders still reference the item.
  fn delete_menu_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Orders ──────────────────────────────────────────────────────────────────

pub trait OrderStore: Store {
  /// Persist a validated order as `pending`. `created_at` is `now`.
  fn create_order(
    &self,
    order: NewOrder,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<OrderView, Self::Error>> + Send + '_;

  /// Persist `order` unless the member has a pending twin placed within
  /// `window` of `now` (see [`find_duplicate`](crate::cafe::order::find_duplicate)).
  ///
  /// The lookup and the insert are one atomic step, so two identical
  /// concurrent requests place exactly one order.
  fn place_order(
    &self,
    order: NewOrder,
    now: DateTime<Utc>,
    window: Duration,
  ) -> impl Future<Output = Result<Placement, Self::Error>> + Send + '_;

  fn get_order(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<OrderView>, Self::Error>> + Send + '_;

  /// Orders matching `filter`, newest first.
  fn list_orders<'a>(
    &'a self,
    filter: &'a OrderFilter,
  ) -> impl Future<Output = Result<Vec<OrderView>, Self::Error>> + Send + 'a;

  /// Overwrite the status. Transition rules are checked by the caller.
  fn set_order_status(
    &self,
    id: Uuid,
    status: OrderStatus,
  ) -> impl Future<Output = Result<Option<OrderView>, Self::Error>> + Send + '_;

  fn delete_order(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub trait SettingsStore: Store {
  /// The stored settings, or the defaults if none were saved yet.
  fn get_settings(&self) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;

  fn put_settings(
    &self,
    settings: Settings,
  ) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;
}

// ─── Gift exchange ───────────────────────────────────────────────────────────

pub trait ParticipantStore: Store {
  /// `NotFound` for an unknown village, `Conflict` for a duplicate
  /// `(village, name)` pair.
  fn register_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  /// Participants in registration order.
  fn list_participants(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  fn get_participant(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;
}

pub trait MatchStore: Store {
  /// Delete every match of `event_id` and insert `matches`, atomically.
  /// Readers see either the old set or the new one, never a mix.
  fn replace_matches_for_event(
    &self,
    event_id: EventId,
    matches: Vec<NewMatch>,
  ) -> impl Future<Output = Result<Vec<MatchView>, Self::Error>> + Send + '_;

  /// Matches of `event_id` in insertion order.
  fn list_matches_for_event(
    &self,
    event_id: EventId,
  ) -> impl Future<Output = Result<Vec<MatchView>, Self::Error>> + Send + '_;

  /// Set `revealed = true`. Idempotent; `None` if the match does not exist.
  fn mark_revealed(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<MatchView>, Self::Error>> + Send + '_;

  /// Delete every match of `event_id`, returning how many were removed.
  fn clear_matches_for_event(
    &self,
    event_id: EventId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Everything the API needs from a backend.
pub trait HavenStore:
  VillageStore
  + MemberStore
  + MenuStore
  + OrderStore
  + SettingsStore
  + ParticipantStore
  + MatchStore
{
}

impl<T> HavenStore for T where
  T: VillageStore
    + MemberStore
    + MenuStore
    + OrderStore
    + SettingsStore
    + ParticipantStore
    + MatchStore
{
}
