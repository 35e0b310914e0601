//! Haven HTTP server: configuration and the top-level router.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the configured
//! backend and serves [`router`].

use std::{path::PathBuf, time::Duration};

use axum::Router;
use haven_api::{ApiOptions, AppState};
use haven_core::store::HavenStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Which store implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Sqlite,
  /// Nothing persists across restarts.
  Memory,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `HAVEN_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub backend:             Backend,
  pub store_path:          PathBuf,
  /// argon2 PHC string; generate one with `--hash-password`.
  pub admin_password_hash: String,
  pub session_ttl_minutes: i64,
  pub utc_offset_minutes:  i32,
  pub cache_ttl_seconds:   u64,
  pub cache_capacity:      usize,
  pub reveal_flashes:      usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".to_string(),
      port:                8080,
      backend:             Backend::Sqlite,
      store_path:          PathBuf::from("haven.db"),
      admin_password_hash: String::new(),
      session_ttl_minutes: 12 * 60,
      utc_offset_minutes:  0,
      cache_ttl_seconds:   30,
      cache_capacity:      16,
      reveal_flashes:      12,
    }
  }
}

impl ServerConfig {
  pub fn api_options(&self) -> ApiOptions {
    ApiOptions {
      admin_password_hash: self.admin_password_hash.clone(),
      session_ttl:         chrono::Duration::minutes(self.session_ttl_minutes),
      utc_offset_minutes:  self.utc_offset_minutes,
      cache_ttl:           Duration::from_secs(self.cache_ttl_seconds),
      cache_capacity:      self.cache_capacity,
      reveal_flashes:      self.reveal_flashes,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API nested under `/api`, wrapped in request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: HavenStore + 'static,
{
  Router::new()
    .nest("/api", haven_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}
