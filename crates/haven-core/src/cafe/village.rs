//! Villages (small groups) and the members who belong to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A small group within the youth group. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Village {
  pub village_id: Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// Someone who can order at the café. `(village_id, name)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub member_id:  Uuid,
  pub village_id: Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A member with its village's display name joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
  #[serde(flatten)]
  pub member:       Member,
  pub village_name: String,
}
