//! Handlers for the gift exchange.
//!
//! Every route takes an optional `?event_id=YYYY-MM-DD`; without it the
//! café's current local date is used.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/gift/participants` | Body: `{"name":"...","village_id":"..."}` |
//! | `GET`    | `/gift/participants` | Registration order |
//! | `POST`   | `/gift/generate-matches` | Admin; replaces the event's matches |
//! | `GET`    | `/gift/matches` | Insertion order |
//! | `PATCH`  | `/gift/matches` | Admin; body: `{"matchId":"...","isCompleted":true}` |
//! | `DELETE` | `/gift/reset-matches` | Admin; `{"deleted": n}` |
//! | `GET`    | `/gift/reveal` | Admin; next unrevealed match and its spin |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use haven_core::{
  cafe::clean_name,
  gift::{
    EventId, MatchView, NewParticipant, Participant, matching,
    reveal::{Phase, Reveal},
  },
  store::{HavenStore, MatchStore as _, ParticipantStore as _},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::Admin};

#[derive(Debug, Default, Deserialize)]
pub struct EventParams {
  pub event_id: Option<String>,
}

// ─── Participants ────────────────────────────────────────────────────────────

/// `POST /gift/participants`
pub async fn register<S: HavenStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewParticipant>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewParticipant { name: clean_name("name", &body.name)?, ..body };
  let participant = state
    .store
    .register_participant(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    participant_id = %participant.participant_id,
    village = %participant.village_name,
    "participant registered"
  );
  Ok((StatusCode::CREATED, Json(participant)))
}

/// `GET /gift/participants`
pub async fn list_participants<S: HavenStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Participant>>, ApiError> {
  let participants = state.store.list_participants().await.map_err(ApiError::store)?;
  Ok(Json(participants))
}

// ─── Matches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
  pub event_id: EventId,
  pub count:    usize,
  pub matches:  Vec<MatchView>,
}

/// `POST /gift/generate-matches`
pub async fn generate<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(params): Query<EventParams>,
) -> Result<Json<GenerateResponse>, ApiError> {
  let event_id = state.event_id(params.event_id.as_deref())?;
  let participants = state.store.list_participants().await.map_err(ApiError::store)?;

  // The thread-local rng is not `Send`; keep it out of the await points.
  let generated = {
    let mut rng = rand::rng();
    matching::generate(&participants, event_id, &mut rng)?
  };

  let matches = state
    .store
    .replace_matches_for_event(event_id, generated)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(%event_id, count = matches.len(), "matches generated");
  Ok(Json(GenerateResponse { event_id, count: matches.len(), matches }))
}

/// `GET /gift/matches`
pub async fn list_matches<S: HavenStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<EventParams>,
) -> Result<Json<Vec<MatchView>>, ApiError> {
  let event_id = state.event_id(params.event_id.as_deref())?;
  let matches = state
    .store
    .list_matches_for_event(event_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(matches))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBody {
  pub match_id:     Uuid,
  pub is_completed: bool,
}

/// `PATCH /gift/matches`
///
/// The match must belong to the requested event. Marking is one-way:
/// `isCompleted: false` returns the match unchanged.
pub async fn complete_match<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(params): Query<EventParams>,
  Json(body): Json<CompleteBody>,
) -> Result<Json<MatchView>, ApiError> {
  let id = body.match_id;
  let event_id = state.event_id(params.event_id.as_deref())?;
  let current = state
    .store
    .list_matches_for_event(event_id)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .find(|m| m.record.match_id == id)
    .ok_or_else(|| ApiError::NotFound(format!("match {id} not found in event {event_id}")))?;

  if !body.is_completed {
    return Ok(Json(current));
  }
  let view = state
    .store
    .mark_revealed(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("match {id} not found")))?;
  tracing::info!(match_id = %id, %event_id, "match revealed");
  Ok(Json(view))
}

/// `DELETE /gift/reset-matches`
pub async fn reset<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(params): Query<EventParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
  let event_id = state.event_id(params.event_id.as_deref())?;
  let deleted = state
    .store
    .clear_matches_for_event(event_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(%event_id, deleted, "matches reset");
  Ok(Json(json!({ "deleted": deleted })))
}

// ─── Reveal ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RevealResponse {
  pub event_id:  EventId,
  pub phase:     Phase,
  /// Unrevealed matches, including `current`.
  pub remaining: usize,
  pub current:   Option<MatchView>,
  /// Names to cycle through; the last is `current`'s receiver.
  pub flashes:   Vec<String>,
}

/// `GET /gift/reveal`
///
/// Resumes from the stored matches, so a reload lands on the first match
/// not yet marked. The client finishes a step with `PATCH /gift/matches`.
pub async fn next_reveal<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(params): Query<EventParams>,
) -> Result<Json<RevealResponse>, ApiError> {
  let event_id = state.event_id(params.event_id.as_deref())?;
  let matches = state
    .store
    .list_matches_for_event(event_id)
    .await
    .map_err(ApiError::store)?;

  let mut reveal = Reveal::resume(matches);
  if reveal.phase() == Phase::Finished {
    return Ok(Json(RevealResponse {
      event_id,
      phase: Phase::Finished,
      remaining: 0,
      current: None,
      flashes: Vec::new(),
    }));
  }

  let remaining = reveal.remaining();
  let current = reveal.show_giver()?.clone();
  let flashes = {
    let mut rng = rand::rng();
    reveal.spin(&mut rng, state.options.reveal_flashes)?
  };

  Ok(Json(RevealResponse {
    event_id,
    phase: reveal.phase(),
    remaining,
    current: Some(current),
    flashes,
  }))
}
