//! Café settings and the business-hours gate.

use std::fmt;

use chrono::{
  DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset as _,
  Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Editable café configuration. There is exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  /// Master switch; when false the café is closed regardless of hours.
  pub ordering_enabled:         bool,
  #[serde(with = "hhmm")]
  pub open_time:                NaiveTime,
  #[serde(with = "hhmm")]
  pub close_time:               NaiveTime,
  /// Days the café opens. Empty means every day.
  #[serde(default)]
  pub open_days:                Vec<Weekday>,
  pub duplicate_window_seconds: u32,
  #[serde(default)]
  pub notice:                   Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      ordering_enabled:         true,
      open_time:                NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
      close_time:               NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
      open_days:                Vec::new(),
      duplicate_window_seconds: 300,
      notice:                   None,
    }
  }
}

impl Settings {
  pub fn validate(mut self) -> Result<Self> {
    if self.duplicate_window_seconds > 24 * 60 * 60 {
      return Err(Error::Validation(
        "duplicate window must be at most one day".into(),
      ));
    }
    self.open_days.sort_by_key(Weekday::num_days_from_monday);
    self.open_days.dedup();
    self.notice = self
      .notice
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty());
    Ok(self)
  }

  pub fn duplicate_window(&self) -> Duration {
    Duration::seconds(i64::from(self.duplicate_window_seconds))
  }

  fn opens_on(&self, day: Weekday) -> bool {
    self.open_days.is_empty() || self.open_days.contains(&day)
  }

  /// Evaluate whether orders are accepted at local time `now`.
  ///
  /// `open_time == close_time` means open around the clock; a close time
  /// earlier than the open time means the window runs past midnight, and
  /// the early-morning tail belongs to the previous day's opening.
  pub fn status_at(&self, now: NaiveDateTime) -> CafeStatus {
    if !self.ordering_enabled {
      return CafeStatus::Closed { reason: ClosedReason::Disabled };
    }

    let today = now.date().weekday();
    let time = now.time();

    if self.open_time == self.close_time {
      return if self.opens_on(today) {
        CafeStatus::Open { closes_at: None }
      } else {
        CafeStatus::Closed { reason: ClosedReason::ClosedToday }
      };
    }

    if self.open_time < self.close_time {
      if !self.opens_on(today) {
        return CafeStatus::Closed { reason: ClosedReason::ClosedToday };
      }
      return if time < self.open_time {
        CafeStatus::Closed {
          reason: ClosedReason::BeforeOpening { opens_at: self.open_time },
        }
      } else if time >= self.close_time {
        CafeStatus::Closed { reason: ClosedReason::AfterClosing }
      } else {
        CafeStatus::Open { closes_at: Some(self.close_time) }
      };
    }

    // Overnight window.
    if time >= self.open_time && self.opens_on(today) {
      return CafeStatus::Open { closes_at: Some(self.close_time) };
    }
    if time < self.close_time && self.opens_on(today.pred()) {
      return CafeStatus::Open { closes_at: Some(self.close_time) };
    }
    if !self.opens_on(today) {
      CafeStatus::Closed { reason: ClosedReason::ClosedToday }
    } else if time < self.open_time {
      CafeStatus::Closed {
        reason: ClosedReason::BeforeOpening { opens_at: self.open_time },
      }
    } else {
      CafeStatus::Closed { reason: ClosedReason::AfterClosing }
    }
  }

  /// Reject orders when the café is closed at local time `now`.
  pub fn ensure_open(&self, now: NaiveDateTime) -> Result<()> {
    match self.status_at(now) {
      CafeStatus::Open { .. } => Ok(()),
      CafeStatus::Closed { reason } => Err(Error::CafeClosed(reason)),
    }
  }
}

/// Convert a UTC instant to wall-clock time at a fixed offset.
///
/// Offsets outside ±24h fall back to UTC.
pub fn local_time(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDateTime {
  now.with_timezone(&fixed_offset(utc_offset_minutes)).naive_local()
}

/// The UTC instants bounding the local calendar day `date`, as `[start, end)`.
pub fn local_day_bounds(
  date: NaiveDate,
  utc_offset_minutes: i32,
) -> (DateTime<Utc>, DateTime<Utc>) {
  let shift = Duration::seconds(i64::from(fixed_offset(utc_offset_minutes).local_minus_utc()));
  let start = (date.and_time(NaiveTime::MIN) - shift).and_utc();
  (start, start + Duration::days(1))
}

fn fixed_offset(utc_offset_minutes: i32) -> FixedOffset {
  FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CafeStatus {
  Open {
    /// `None` when open around the clock.
    #[serde(with = "hhmm::option")]
    closes_at: Option<NaiveTime>,
  },
  Closed {
    reason: ClosedReason,
  },
}

impl CafeStatus {
  pub fn is_open(&self) -> bool { matches!(self, Self::Open { .. }) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClosedReason {
  Disabled,
  ClosedToday,
  BeforeOpening {
    #[serde(with = "hhmm")]
    opens_at: NaiveTime,
  },
  AfterClosing,
}

impl fmt::Display for ClosedReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Disabled => f.write_str("ordering is turned off"),
      Self::ClosedToday => f.write_str("not open today"),
      Self::BeforeOpening { opens_at } => {
        write!(f, "opens at {}", opens_at.format(hhmm::FORMAT))
      }
      Self::AfterClosing => f.write_str("closed for the day"),
    }
  }
}

// ─── HH:MM serde ─────────────────────────────────────────────────────────────

mod hhmm {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub const FORMAT: &str = "%H:%M";

  pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&t.format(FORMAT))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(d)?;
    NaiveTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
  }

  pub mod option {
    use chrono::NaiveTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
      t: &Option<NaiveTime>,
      s: S,
    ) -> Result<S::Ok, S::Error> {
      match t {
        Some(t) => s.collect_str(&t.format(super::FORMAT)),
        None => s.serialize_none(),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    // 2024-09-01 is a Sunday.
    NaiveDate::from_ymd_opt(2024, 9, day)
      .unwrap()
      .and_hms_opt(h, m, 0)
      .unwrap()
  }

  fn hours(open: (u32, u32), close: (u32, u32)) -> Settings {
    Settings {
      open_time: NaiveTime::from_hms_opt(open.0, open.1, 0).unwrap(),
      close_time: NaiveTime::from_hms_opt(close.0, close.1, 0).unwrap(),
      ..Settings::default()
    }
  }

  #[test]
  fn daytime_window() {
    let s = hours((10, 0), (14, 0));
    assert!(matches!(
      s.status_at(at(1, 9, 59)),
      CafeStatus::Closed { reason: ClosedReason::BeforeOpening { .. } }
    ));
    assert!(s.status_at(at(1, 10, 0)).is_open());
    assert!(s.status_at(at(1, 13, 59)).is_open());
    assert_eq!(
      s.status_at(at(1, 14, 0)),
      CafeStatus::Closed { reason: ClosedReason::AfterClosing }
    );
  }

  #[test]
  fn disabled_overrides_hours() {
    let mut s = hours((0, 0), (0, 0));
    s.ordering_enabled = false;
    assert_eq!(
      s.status_at(at(1, 12, 0)),
      CafeStatus::Closed { reason: ClosedReason::Disabled }
    );
    assert!(matches!(s.ensure_open(at(1, 12, 0)), Err(Error::CafeClosed(_))));
  }

  #[test]
  fn equal_times_mean_all_day() {
    let s = hours((0, 0), (0, 0));
    assert_eq!(s.status_at(at(1, 3, 0)), CafeStatus::Open { closes_at: None });
  }

  #[test]
  fn open_days_restrict() {
    let mut s = hours((10, 0), (14, 0));
    s.open_days = vec![Weekday::Sun];
    assert!(s.status_at(at(1, 11, 0)).is_open());
    assert_eq!(
      s.status_at(at(2, 11, 0)),
      CafeStatus::Closed { reason: ClosedReason::ClosedToday }
    );
  }

  #[test]
  fn overnight_window_belongs_to_previous_day() {
    let mut s = hours((20, 0), (2, 0));
    s.open_days = vec![Weekday::Sat];
    // Saturday 2024-08-31 late evening, and the Sunday early-morning tail.
    let sat_late = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap().and_hms_opt(23, 0, 0).unwrap();
    assert!(s.status_at(sat_late).is_open());
    assert!(s.status_at(at(1, 1, 30)).is_open());
    assert!(!s.status_at(at(1, 2, 30)).is_open());
    assert!(!s.status_at(at(1, 21, 0)).is_open());
  }

  #[test]
  fn local_time_applies_offset() {
    let utc = DateTime::parse_from_rfc3339("2024-09-01T23:30:00Z")
      .unwrap()
      .with_timezone(&Utc);
    assert_eq!(local_time(utc, 9 * 60), at(2, 8, 30));
    assert_eq!(local_time(utc, 0), at(1, 23, 30));
  }

  #[test]
  fn day_bounds_follow_offset() {
    let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    let (start, end) = local_day_bounds(day, 9 * 60);
    assert_eq!(start.to_rfc3339(), "2024-08-31T15:00:00+00:00");
    assert_eq!(end - start, Duration::days(1));
    assert_eq!(local_day_bounds(day, 0).0.to_rfc3339(), "2024-09-01T00:00:00+00:00");
  }

  #[test]
  fn settings_json_uses_hhmm() {
    let json = serde_json::to_value(hours((9, 30), (13, 0))).unwrap();
    assert_eq!(json["open_time"], "09:30");
    let back: Settings = serde_json::from_value(json).unwrap();
    assert_eq!(back.open_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
  }

  #[test]
  fn validate_bounds_window() {
    let mut s = Settings::default();
    s.duplicate_window_seconds = 2 * 24 * 60 * 60;
    assert!(s.validate().is_err());
  }
}
