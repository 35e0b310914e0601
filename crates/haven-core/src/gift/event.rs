//! Event ids: the calendar date that scopes one generation of matches.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::{Error, Result, cafe::settings::local_time};

const FORMAT: &str = "%Y-%m-%d";

/// A `YYYY-MM-DD` partition key. Matches generated on different days never
/// collide, and a reset only touches one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(NaiveDate);

impl EventId {
  pub fn for_date(date: NaiveDate) -> Self { Self(date) }

  /// The event id for the local calendar date of `now`.
  pub fn current(now: DateTime<Utc>, utc_offset_minutes: i32) -> Self {
    Self(local_time(now, utc_offset_minutes).date())
  }

  pub fn date(&self) -> NaiveDate { self.0 }
}

impl fmt::Display for EventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(FORMAT))
  }
}

impl FromStr for EventId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    // `%Y` alone would accept "24-1-1"; insist on the canonical width.
    let parsed = NaiveDate::parse_from_str(s, FORMAT)
      .map_err(|_| Error::InvalidEventId(s.to_owned()))?;
    let id = Self(parsed);
    if id.to_string() != s {
      return Err(Error::InvalidEventId(s.to_owned()));
    }
    Ok(id)
  }
}

impl Serialize for EventId {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for EventId {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(D::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_canonical_dates_only() {
    let id: EventId = "2024-01-01".parse().unwrap();
    assert_eq!(id.to_string(), "2024-01-01");
    for bad in ["2024-1-1", "2024-13-01", "20240101", "", "2024-01-01T00:00"] {
      assert!(bad.parse::<EventId>().is_err(), "{bad} should be rejected");
    }
  }

  #[test]
  fn current_uses_local_date() {
    let now = DateTime::parse_from_rfc3339("2024-12-31T20:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    assert_eq!(EventId::current(now, 0).to_string(), "2024-12-31");
    assert_eq!(EventId::current(now, 9 * 60).to_string(), "2025-01-01");
  }

  #[test]
  fn serde_round_trips_as_string() {
    let id: EventId = "2024-02-29".parse().unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"2024-02-29\"");
    assert!(serde_json::from_str::<EventId>("\"2023-02-29\"").is_err());
  }
}
