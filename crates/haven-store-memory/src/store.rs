//! [`MemoryStore`] and the shared state its entity impls work on.

use std::sync::Arc;

use haven_core::{
  cafe::{
    menu::MenuItem,
    order::{Order, OrderView},
    settings::Settings,
    village::{Member, MemberView, Village},
  },
  gift::{Match, MatchView, Participant},
  store::{SettingsStore, Store},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Error, Result};

// ─── State ───────────────────────────────────────────────────────────────────

/// Rows kept in insertion order, like SQLite's rowid.
///
/// Views are assembled on read so renames show up everywhere, the same way
/// the SQLite backend joins names in at query time.
#[derive(Debug, Default)]
pub(crate) struct State {
  pub villages:     Vec<Village>,
  pub members:      Vec<Member>,
  pub menu:         Vec<MenuItem>,
  pub orders:       Vec<Order>,
  pub settings:     Option<Settings>,
  pub participants: Vec<Participant>,
  pub matches:      Vec<Match>,
}

impl State {
  pub fn village(&self, id: Uuid) -> Option<&Village> {
    self.villages.iter().find(|v| v.village_id == id)
  }

  pub fn require_village(&self, id: Uuid) -> Result<&Village> {
    self.village(id).ok_or(Error::VillageNotFound(id))
  }

  pub fn member_view(&self, member: &Member) -> Option<MemberView> {
    let village = self.village(member.village_id)?;
    Some(MemberView { member: member.clone(), village_name: village.name.clone() })
  }

  pub fn order_view(&self, order: &Order) -> Option<OrderView> {
    let member = self.members.iter().find(|m| m.member_id == order.member_id)?;
    let village = self.village(member.village_id)?;
    let item = self.menu.iter().find(|i| i.menu_id == order.menu_id)?;
    Some(OrderView {
      order:        order.clone(),
      member_name:  member.name.clone(),
      village_name: village.name.clone(),
      menu_name:    item.name.clone(),
    })
  }

  /// The participant with its village's current name.
  pub fn participant_view(&self, p: &Participant) -> Option<Participant> {
    let village = self.village(p.village_id)?;
    Some(Participant { village_name: village.name.clone(), ..p.clone() })
  }

  pub fn participant(&self, id: Uuid) -> Option<Participant> {
    self
      .participants
      .iter()
      .find(|p| p.participant_id == id)
      .and_then(|p| self.participant_view(p))
  }

  pub fn match_view(&self, m: &Match) -> Option<MatchView> {
    let giver = self.participant(m.giver_id)?;
    let receiver = self.participant(m.receiver_id)?;
    Some(MatchView {
      record:                m.clone(),
      giver_name:            giver.name,
      giver_village_name:    giver.village_name,
      receiver_name:         receiver.name,
      receiver_village_name: receiver.village_name,
    })
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Haven's stores held in process memory.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  pub(crate) state: Arc<RwLock<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl Store for MemoryStore {
  type Error = Error;
}

// ─── Settings ────────────────────────────────────────────────────────────────

impl SettingsStore for MemoryStore {
  async fn get_settings(&self) -> Result<Settings> {
    Ok(self.state.read().await.settings.clone().unwrap_or_default())
  }

  async fn put_settings(&self, settings: Settings) -> Result<Settings> {
    self.state.write().await.settings = Some(settings.clone());
    Ok(settings)
  }
}
