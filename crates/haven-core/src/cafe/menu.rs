//! Menu items and the drink options they offer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, cafe::clean_name};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Temperature {
  Hot,
  Iced,
}

/// Shot strength for coffee-style drinks.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
pub enum Strength {
  Mild,
  #[default]
  Regular,
  Strong,
}

// ─── Items ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
  pub menu_id:      Uuid,
  pub name:         String,
  pub description:  Option<String>,
  pub category:     String,
  /// Price in the smallest currency unit.
  pub price:        i64,
  /// Temperatures the item can be served at. Empty means no choice.
  pub temperatures: Vec<Temperature>,
  pub has_strength: bool,
  pub available:    bool,
  pub sort_order:   i32,
  pub created_at:   DateTime<Utc>,
}

/// Fields an administrator supplies when creating or editing an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemInput {
  pub name:         String,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default = "default_category")]
  pub category:     String,
  pub price:        i64,
  #[serde(default)]
  pub temperatures: Vec<Temperature>,
  #[serde(default)]
  pub has_strength: bool,
  #[serde(default = "default_available")]
  pub available:    bool,
  #[serde(default)]
  pub sort_order:   i32,
}

fn default_category() -> String { "drinks".to_owned() }

fn default_available() -> bool { true }

impl MenuItemInput {
  /// Normalise names and options, rejecting negative prices.
  pub fn validate(mut self) -> Result<Self> {
    self.name = clean_name("menu item name", &self.name)?;
    self.category = clean_name("category", &self.category)?;
    self.description = self
      .description
      .map(|d| d.trim().to_owned())
      .filter(|d| !d.is_empty());
    if self.price < 0 {
      return Err(Error::Validation("price must not be negative".into()));
    }
    self.temperatures.sort();
    self.temperatures.dedup();
    Ok(self)
  }
}

impl MenuItem {
  /// Resolve the options requested for an order against what the item
  /// offers.
  ///
  /// A temperature is required when the item offers any, and must be one of
  /// them. Strength defaults to [`Strength::Regular`] when the item has a
  /// strength option and is rejected otherwise.
  pub fn resolve_options(
    &self,
    temperature: Option<Temperature>,
    strength: Option<Strength>,
  ) -> Result<(Option<Temperature>, Option<Strength>)> {
    if !self.available {
      return Err(Error::ItemUnavailable(self.name.clone()));
    }

    let temperature = match (temperature, self.temperatures.is_empty()) {
      (None, true) => None,
      (None, false) if self.temperatures.len() == 1 => Some(self.temperatures[0]),
      (None, false) => {
        return Err(Error::TemperatureRequired { item: self.name.clone() });
      }
      (Some(t), _) if self.temperatures.contains(&t) => Some(t),
      (Some(t), _) => {
        return Err(Error::TemperatureNotOffered {
          item:        self.name.clone(),
          temperature: t,
        });
      }
    };

    let strength = match (strength, self.has_strength) {
      (s, true) => Some(s.unwrap_or_default()),
      (None, false) => None,
      (Some(_), false) => {
        return Err(Error::StrengthNotOffered { item: self.name.clone() });
      }
    };

    Ok((temperature, strength))
  }
}
