//! Encoding and decoding between domain types and the plain-text columns
//! stored in SQLite.
//!
//! Timestamps are fixed-width RFC 3339 UTC strings (microsecond precision,
//! `Z` suffix) so that text comparison matches time order. UUIDs are
//! hyphenated lowercase strings. Option enums use their lowercase names; the
//! menu's temperature list is compact JSON.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use haven_core::{
  cafe::{
    menu::{MenuItem, Temperature},
    order::{Order, OrderView},
    village::{Member, MemberView, Village},
  },
  gift::{EventId, Match, MatchView, Participant},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Truncate to the precision the store keeps, so values handed back from a
/// write compare equal to values read later.
pub fn store_precision(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Decode any strum-backed option enum from its lowercase name.
pub fn decode_enum<T: FromStr>(what: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { what, value: s.to_owned() })
}

pub fn encode_temperatures(ts: &[Temperature]) -> Result<String> {
  Ok(serde_json::to_string(ts)?)
}

pub fn decode_temperatures(s: &str) -> Result<Vec<Temperature>> {
  Ok(serde_json::from_str(s)?)
}

pub fn decode_event_id(s: &str) -> Result<EventId> {
  s.parse().map_err(|_| Error::Decode { what: "event id", value: s.to_owned() })
}

// ─── Villages & members ──────────────────────────────────────────────────────

pub const VILLAGE_COLUMNS: &str = "village_id, name, created_at";

pub struct RawVillage {
  pub village_id: String,
  pub name:       String,
  pub created_at: String,
}

impl RawVillage {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      village_id: row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_village(self) -> Result<Village> {
    Ok(Village {
      village_id: decode_uuid(&self.village_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const MEMBER_SELECT: &str = "
  SELECT m.member_id, m.village_id, m.name, m.created_at, v.name
  FROM members m
  JOIN villages v ON v.village_id = m.village_id";

pub struct RawMember {
  pub member_id:    String,
  pub village_id:   String,
  pub name:         String,
  pub created_at:   String,
  pub village_name: String,
}

impl RawMember {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:    row.get(0)?,
      village_id:   row.get(1)?,
      name:         row.get(2)?,
      created_at:   row.get(3)?,
      village_name: row.get(4)?,
    })
  }

  pub fn into_view(self) -> Result<MemberView> {
    Ok(MemberView {
      member:       Member {
        member_id:  decode_uuid(&self.member_id)?,
        village_id: decode_uuid(&self.village_id)?,
        name:       self.name,
        created_at: decode_dt(&self.created_at)?,
      },
      village_name: self.village_name,
    })
  }
}

// ─── Menu ────────────────────────────────────────────────────────────────────

pub const MENU_COLUMNS: &str = "menu_id, name, description, category, price, temperatures, \
                                has_strength, available, sort_order, created_at";

pub struct RawMenuItem {
  pub menu_id:      String,
  pub name:         String,
  pub description:  Option<String>,
  pub category:     String,
  pub price:        i64,
  pub temperatures: String,
  pub has_strength: bool,
  pub available:    bool,
  pub sort_order:   i32,
  pub created_at:   String,
}

impl RawMenuItem {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      menu_id:      row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      category:     row.get(3)?,
      price:        row.get(4)?,
      temperatures: row.get(5)?,
      has_strength: row.get(6)?,
      available:    row.get(7)?,
      sort_order:   row.get(8)?,
      created_at:   row.get(9)?,
    })
  }

  pub fn into_item(self) -> Result<MenuItem> {
    Ok(MenuItem {
      menu_id:      decode_uuid(&self.menu_id)?,
      name:         self.name,
      description:  self.description,
      category:     self.category,
      price:        self.price,
      temperatures: decode_temperatures(&self.temperatures)?,
      has_strength: self.has_strength,
      available:    self.available,
      sort_order:   self.sort_order,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

// ─── Orders ──────────────────────────────────────────────────────────────────

pub const ORDER_SELECT: &str = "
  SELECT o.order_id, o.member_id, o.menu_id, o.quantity, o.temperature,
         o.strength, o.note, o.status, o.created_at, o.updated_at,
         mb.name, v.name, mi.name
  FROM orders o
  JOIN members    mb ON mb.member_id  = o.member_id
  JOIN villages   v  ON v.village_id  = mb.village_id
  JOIN menu_items mi ON mi.menu_id    = o.menu_id";

pub struct RawOrder {
  pub order_id:     String,
  pub member_id:    String,
  pub menu_id:      String,
  pub quantity:     u32,
  pub temperature:  Option<String>,
  pub strength:     Option<String>,
  pub note:         Option<String>,
  pub status:       String,
  pub created_at:   String,
  pub updated_at:   String,
  pub member_name:  String,
  pub village_name: String,
  pub menu_name:    String,
}

impl RawOrder {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:     row.get(0)?,
      member_id:    row.get(1)?,
      menu_id:      row.get(2)?,
      quantity:     row.get(3)?,
      temperature:  row.get(4)?,
      strength:     row.get(5)?,
      note:         row.get(6)?,
      status:       row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
      member_name:  row.get(10)?,
      village_name: row.get(11)?,
      menu_name:    row.get(12)?,
    })
  }

  pub fn into_view(self) -> Result<OrderView> {
    Ok(OrderView {
      order:        Order {
        order_id:    decode_uuid(&self.order_id)?,
        member_id:   decode_uuid(&self.member_id)?,
        menu_id:     decode_uuid(&self.menu_id)?,
        quantity:    self.quantity,
        temperature: self
          .temperature
          .as_deref()
          .map(|t| decode_enum("temperature", t))
          .transpose()?,
        strength:    self
          .strength
          .as_deref()
          .map(|s| decode_enum("strength", s))
          .transpose()?,
        note:        self.note,
        status:      decode_enum("order status", &self.status)?,
        created_at:  decode_dt(&self.created_at)?,
        updated_at:  decode_dt(&self.updated_at)?,
      },
      member_name:  self.member_name,
      village_name: self.village_name,
      menu_name:    self.menu_name,
    })
  }
}

// ─── Gift exchange ───────────────────────────────────────────────────────────

pub const PARTICIPANT_SELECT: &str = "
  SELECT p.participant_id, p.name, p.village_id, v.name, p.registered_at
  FROM participants p
  JOIN villages v ON v.village_id = p.village_id";

pub struct RawParticipant {
  pub participant_id: String,
  pub name:           String,
  pub village_id:     String,
  pub village_name:   String,
  pub registered_at:  String,
}

impl RawParticipant {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      participant_id: row.get(0)?,
      name:           row.get(1)?,
      village_id:     row.get(2)?,
      village_name:   row.get(3)?,
      registered_at:  row.get(4)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      participant_id: decode_uuid(&self.participant_id)?,
      name:           self.name,
      village_id:     decode_uuid(&self.village_id)?,
      village_name:   self.village_name,
      registered_at:  decode_dt(&self.registered_at)?,
    })
  }
}

pub const MATCH_SELECT: &str = "
  SELECT m.match_id, m.event_id, m.giver_id, m.receiver_id, m.revealed,
         m.position, m.created_at,
         g.name, gv.name, r.name, rv.name
  FROM matches m
  JOIN participants g  ON g.participant_id  = m.giver_id
  JOIN villages     gv ON gv.village_id     = g.village_id
  JOIN participants r  ON r.participant_id  = m.receiver_id
  JOIN villages     rv ON rv.village_id     = r.village_id";

pub struct RawMatch {
  pub match_id:              String,
  pub event_id:              String,
  pub giver_id:              String,
  pub receiver_id:           String,
  pub revealed:              bool,
  pub position:              u32,
  pub created_at:            String,
  pub giver_name:            String,
  pub giver_village_name:    String,
  pub receiver_name:         String,
  pub receiver_village_name: String,
}

impl RawMatch {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:              row.get(0)?,
      event_id:              row.get(1)?,
      giver_id:              row.get(2)?,
      receiver_id:           row.get(3)?,
      revealed:              row.get(4)?,
      position:              row.get(5)?,
      created_at:            row.get(6)?,
      giver_name:            row.get(7)?,
      giver_village_name:    row.get(8)?,
      receiver_name:         row.get(9)?,
      receiver_village_name: row.get(10)?,
    })
  }

  pub fn into_view(self) -> Result<MatchView> {
    Ok(MatchView {
      record:                Match {
        match_id:    decode_uuid(&self.match_id)?,
        event_id:    decode_event_id(&self.event_id)?,
        giver_id:    decode_uuid(&self.giver_id)?,
        receiver_id: decode_uuid(&self.receiver_id)?,
        revealed:    self.revealed,
        position:    self.position,
        created_at:  decode_dt(&self.created_at)?,
      },
      giver_name:            self.giver_name,
      giver_village_name:    self.giver_village_name,
      receiver_name:         self.receiver_name,
      receiver_village_name: self.receiver_village_name,
    })
  }
}

#[cfg(test)]
mod tests {
  use haven_core::cafe::{menu::Strength, order::OrderStatus};

  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let a = decode_dt("2024-05-01T10:00:00Z").unwrap();
    let b = decode_dt("2024-05-01T10:00:00.5Z").unwrap();
    assert_eq!(encode_dt(a).len(), encode_dt(b).len());
    assert!(encode_dt(a) < encode_dt(b));
  }

  #[test]
  fn precision_round_trips() {
    let now = store_precision(Utc::now());
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn unknown_enum_values_are_errors() {
    assert_eq!(decode_enum::<Strength>("strength", "strong").unwrap(), Strength::Strong);
    assert!(matches!(
      decode_enum::<OrderStatus>("order status", "lost"),
      Err(Error::Decode { what: "order status", .. })
    ));
  }
}
