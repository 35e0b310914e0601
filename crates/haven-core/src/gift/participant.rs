//! Gift exchange participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered participant. `(village_id, name)` is unique; participants
/// are never edited or deleted by the gift exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub participant_id: Uuid,
  pub name:           String,
  pub village_id:     Uuid,
  pub village_name:   String,
  pub registered_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewParticipant {
  pub name:       String,
  pub village_id: Uuid,
}
