//! Gift exchange participants and matches.

use chrono::Utc;
use haven_core::{
  gift::{EventId, MatchView, NewMatch, NewParticipant, Participant},
  store::{MatchStore, ParticipantStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    MATCH_SELECT, PARTICIPANT_SELECT, RawMatch, RawParticipant, encode_dt, encode_uuid,
    store_precision,
  },
};

fn select_participant(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawParticipant>> {
  conn
    .query_row(
      &format!("{PARTICIPANT_SELECT} WHERE p.participant_id = ?1"),
      rusqlite::params![id],
      RawParticipant::read,
    )
    .optional()
}

fn select_event_matches(
  conn: &rusqlite::Connection,
  event_id: &str,
) -> rusqlite::Result<Vec<RawMatch>> {
  let mut stmt = conn.prepare(&format!(
    "{MATCH_SELECT} WHERE m.event_id = ?1 ORDER BY m.position"
  ))?;
  stmt
    .query_map(rusqlite::params![event_id], RawMatch::read)?
    .collect()
}

// ─── Participants ────────────────────────────────────────────────────────────

impl ParticipantStore for SqliteStore {
  async fn register_participant(&self, input: NewParticipant) -> Result<Participant> {
    self.require_village(input.village_id).await?;

    let id_str      = encode_uuid(Uuid::new_v4());
    let village_str = encode_uuid(input.village_id);
    let at_str      = encode_dt(store_precision(Utc::now()));
    let name        = input.name;

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO participants (participant_id, village_id, name, registered_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, village_str, name, at_str],
        )?;
        Ok(select_participant(conn, &id_str)?)
      })
      .await?;

    raw.ok_or(Error::Vanished("participant"))?.into_participant()
  }

  async fn list_participants(&self) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{PARTICIPANT_SELECT} ORDER BY p.rowid"))?;
        let rows = stmt
          .query_map([], RawParticipant::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_participant(conn, &id_str)?))
      .await?;
    raw.map(RawParticipant::into_participant).transpose()
  }
}

// ─── Matches ─────────────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  async fn replace_matches_for_event(
    &self,
    event_id: EventId,
    matches: Vec<NewMatch>,
  ) -> Result<Vec<MatchView>> {
    let event_str = event_id.to_string();
    let at_str    = encode_dt(store_precision(Utc::now()));
    let rows: Vec<(String, String, String)> = matches
      .iter()
      .map(|m| {
        (
          encode_uuid(Uuid::new_v4()),
          encode_uuid(m.giver_id),
          encode_uuid(m.receiver_id),
        )
      })
      .collect();

    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM matches WHERE event_id = ?1", rusqlite::params![event_str])?;
        {
          let mut insert = tx.prepare(
            "INSERT INTO matches (
               match_id, event_id, giver_id, receiver_id, revealed, position, created_at
             ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
          )?;
          for (position, (match_id, giver, receiver)) in rows.iter().enumerate() {
            insert.execute(rusqlite::params![
              match_id,
              event_str,
              giver,
              receiver,
              position as u32,
              at_str,
            ])?;
          }
        }
        let inserted = select_event_matches(&tx, &event_str)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    tracing::debug!(%event_id, count = raws.len(), "replaced matches");
    raws.into_iter().map(RawMatch::into_view).collect()
  }

  async fn list_matches_for_event(&self, event_id: EventId) -> Result<Vec<MatchView>> {
    let event_str = event_id.to_string();
    let raws = self
      .conn
      .call(move |conn| Ok(select_event_matches(conn, &event_str)?))
      .await?;
    raws.into_iter().map(RawMatch::into_view).collect()
  }

  async fn mark_revealed(&self, match_id: Uuid) -> Result<Option<MatchView>> {
    let id_str = encode_uuid(match_id);
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE matches SET revealed = 1 WHERE match_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(
          conn
            .query_row(
              &format!("{MATCH_SELECT} WHERE m.match_id = ?1"),
              rusqlite::params![id_str],
              RawMatch::read,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawMatch::into_view).transpose()
  }

  async fn clear_matches_for_event(&self, event_id: EventId) -> Result<usize> {
    let event_str = event_id.to_string();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM matches WHERE event_id = ?1", rusqlite::params![event_str])?)
      })
      .await?;
    tracing::debug!(%event_id, deleted, "cleared matches");
    Ok(deleted)
  }
}
