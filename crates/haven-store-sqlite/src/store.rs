//! [`SqliteStore`]: the SQLite implementation of the Haven store traits.
//!
//! The entity impls live in `cafe.rs` and `gift.rs`; this module owns the
//! connection, schema setup and the settings row.

use std::path::Path;

use haven_core::{
  cafe::settings::Settings,
  store::{SettingsStore, Store},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{Error, Result, encode::encode_uuid, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Haven's stores backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fail with [`Error::VillageNotFound`] unless the village exists.
  pub(crate) async fn require_village(&self, village_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(village_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM villages WHERE village_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    if exists { Ok(()) } else { Err(Error::VillageNotFound(village_id)) }
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── Settings ────────────────────────────────────────────────────────────────

impl SettingsStore for SqliteStore {
  async fn get_settings(&self) -> Result<Settings> {
    let raw: Option<String> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row("SELECT settings_json FROM settings WHERE id = 1", [], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(json) => Ok(serde_json::from_str(&json)?),
      None => Ok(Settings::default()),
    }
  }

  async fn put_settings(&self, settings: Settings) -> Result<Settings> {
    let json = serde_json::to_string(&settings)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (id, settings_json) VALUES (1, ?1)
           ON CONFLICT (id) DO UPDATE SET settings_json = excluded.settings_json",
          rusqlite::params![json],
        )?;
        Ok(())
      })
      .await?;

    Ok(settings)
  }
}
