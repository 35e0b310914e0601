//! Gift exchange participants and matches.

use std::collections::HashSet;

use chrono::Utc;
use haven_core::{
  gift::{EventId, Match, MatchView, NewMatch, NewParticipant, Participant},
  store::{MatchStore, ParticipantStore},
};
use uuid::Uuid;

use crate::{Error, MemoryStore, Result, store::State};

// ─── Participants ────────────────────────────────────────────────────────────

impl ParticipantStore for MemoryStore {
  async fn register_participant(&self, input: NewParticipant) -> Result<Participant> {
    let mut state = self.state.write().await;
    let village_name = state.require_village(input.village_id)?.name.clone();
    let taken = state
      .participants
      .iter()
      .any(|p| p.village_id == input.village_id && p.name == input.name);
    if taken {
      return Err(Error::Duplicate { what: "participant", name: input.name });
    }

    let participant = Participant {
      participant_id: Uuid::new_v4(),
      name: input.name,
      village_id: input.village_id,
      village_name,
      registered_at: Utc::now(),
    };
    state.participants.push(participant.clone());
    Ok(participant)
  }

  async fn list_participants(&self) -> Result<Vec<Participant>> {
    let state = self.state.read().await;
    Ok(state.participants.iter().filter_map(|p| state.participant_view(p)).collect())
  }

  async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>> {
    Ok(self.state.read().await.participant(id))
  }
}

// ─── Matches ─────────────────────────────────────────────────────────────────

/// The constraints the SQLite table enforces on one event's rows.
fn check_matching(state: &State, matches: &[NewMatch]) -> Result<()> {
  let mut givers = HashSet::new();
  let mut receivers = HashSet::new();
  for m in matches {
    for id in [m.giver_id, m.receiver_id] {
      if state.participant(id).is_none() {
        return Err(Error::MissingReference { what: "participant", id });
      }
    }
    if m.giver_id == m.receiver_id {
      return Err(Error::SelfMatch(m.giver_id));
    }
    if !givers.insert(m.giver_id) {
      return Err(Error::RepeatedInMatching(m.giver_id));
    }
    if !receivers.insert(m.receiver_id) {
      return Err(Error::RepeatedInMatching(m.receiver_id));
    }
  }
  Ok(())
}

impl MatchStore for MemoryStore {
  async fn replace_matches_for_event(
    &self,
    event_id: EventId,
    matches: Vec<NewMatch>,
  ) -> Result<Vec<MatchView>> {
    let mut state = self.state.write().await;
    check_matching(&state, &matches)?;

    let now = Utc::now();
    state.matches.retain(|m| m.event_id != event_id);
    let mut views = Vec::with_capacity(matches.len());
    for (position, m) in matches.into_iter().enumerate() {
      let record = Match {
        match_id: Uuid::new_v4(),
        event_id,
        giver_id: m.giver_id,
        receiver_id: m.receiver_id,
        revealed: false,
        position: position as u32,
        created_at: now,
      };
      views.extend(state.match_view(&record));
      state.matches.push(record);
    }

    tracing::debug!(%event_id, count = views.len(), "replaced matches");
    Ok(views)
  }

  async fn list_matches_for_event(&self, event_id: EventId) -> Result<Vec<MatchView>> {
    let state = self.state.read().await;
    let mut records: Vec<&Match> = state.matches.iter().filter(|m| m.event_id == event_id).collect();
    records.sort_by_key(|m| m.position);
    Ok(records.into_iter().filter_map(|m| state.match_view(m)).collect())
  }

  async fn mark_revealed(&self, match_id: Uuid) -> Result<Option<MatchView>> {
    let mut state = self.state.write().await;
    let Some(record) = state.matches.iter_mut().find(|m| m.match_id == match_id) else {
      return Ok(None);
    };
    record.revealed = true;
    let record = record.clone();
    Ok(state.match_view(&record))
  }

  async fn clear_matches_for_event(&self, event_id: EventId) -> Result<usize> {
    let mut state = self.state.write().await;
    let before = state.matches.len();
    state.matches.retain(|m| m.event_id != event_id);
    let deleted = before - state.matches.len();
    tracing::debug!(%event_id, deleted, "cleared matches");
    Ok(deleted)
  }
}
