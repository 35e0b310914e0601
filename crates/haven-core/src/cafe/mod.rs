//! Café domain: villages, members, the menu, orders and opening hours.

pub mod menu;
pub mod order;
pub mod settings;
pub mod village;

use crate::{Error, Result};

/// Longest accepted display name for villages, members and menu items.
pub const MAX_NAME_LEN: usize = 50;

/// Trim and collapse internal whitespace; reject empty or overlong names.
///
/// `what` names the field in the error message ("village name", ...).
pub fn clean_name(what: &str, raw: &str) -> Result<String> {
  let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
  if cleaned.is_empty() {
    return Err(Error::Validation(format!("{what} must not be empty")));
  }
  if cleaned.chars().count() > MAX_NAME_LEN {
    return Err(Error::Validation(format!(
      "{what} must be at most {MAX_NAME_LEN} characters"
    )));
  }
  Ok(cleaned)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clean_name_collapses_whitespace() {
    assert_eq!(clean_name("name", "  Grace   Kim ").unwrap(), "Grace Kim");
  }

  #[test]
  fn clean_name_rejects_blank() {
    assert!(matches!(clean_name("name", " \t "), Err(Error::Validation(_))));
  }

  #[test]
  fn clean_name_rejects_overlong() {
    let long = "x".repeat(MAX_NAME_LEN + 1);
    assert!(clean_name("name", &long).is_err());
    assert!(clean_name("name", &long[1..]).is_ok());
  }
}
