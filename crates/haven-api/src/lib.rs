//! JSON REST API for Haven.
//!
//! Exposes an axum [`Router`] backed by any [`HavenStore`]: the public café
//! endpoints, the session-guarded admin endpoints and the gift exchange.
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", haven_api::api_router(state))
//! ```

pub mod admin;
pub mod cache;
pub mod error;
pub mod gift;
pub mod menu;
pub mod orders;
pub mod session;
pub mod settings;
pub mod villages;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use chrono::{NaiveDateTime, Utc};
use haven_core::{
  cafe::{
    menu::MenuItem,
    settings::{Settings, local_time},
  },
  gift::EventId,
  store::{HavenStore, MenuStore as _, SettingsStore as _},
};

use cache::TtlCache;
use session::SessionStore;

pub use error::ApiError;

const MENU_KEY: &str = "menu";
const SETTINGS_KEY: &str = "settings";

// ─── Options ─────────────────────────────────────────────────────────────────

/// Runtime knobs the server passes in from its configuration.
#[derive(Debug, Clone)]
pub struct ApiOptions {
  /// argon2 PHC string of the admin password. Empty disables admin login.
  pub admin_password_hash: String,
  pub session_ttl:         chrono::Duration,
  /// Offset of the café's wall clock from UTC.
  pub utc_offset_minutes:  i32,
  pub cache_ttl:           Duration,
  pub cache_capacity:      usize,
  /// Names shown during a reveal spin, including the final one.
  pub reveal_flashes:      usize,
}

impl Default for ApiOptions {
  fn default() -> Self {
    Self {
      admin_password_hash: String::new(),
      session_ttl:         chrono::Duration::hours(12),
      utc_offset_minutes:  0,
      cache_ttl:           Duration::from_secs(30),
      cache_capacity:      16,
      reveal_flashes:      12,
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:          Arc<S>,
  pub sessions:       Arc<SessionStore>,
  pub menu_cache:     Arc<TtlCache<&'static str, Vec<MenuItem>>>,
  pub settings_cache: Arc<TtlCache<&'static str, Settings>>,
  pub options:        Arc<ApiOptions>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          self.store.clone(),
      sessions:       self.sessions.clone(),
      menu_cache:     self.menu_cache.clone(),
      settings_cache: self.settings_cache.clone(),
      options:        self.options.clone(),
    }
  }
}

impl<S: HavenStore> AppState<S> {
  pub fn new(store: Arc<S>, options: ApiOptions) -> Self {
    Self {
      store,
      sessions: Arc::new(SessionStore::new(options.session_ttl)),
      menu_cache: Arc::new(TtlCache::new(options.cache_capacity, options.cache_ttl)),
      settings_cache: Arc::new(TtlCache::new(options.cache_capacity, options.cache_ttl)),
      options: Arc::new(options),
    }
  }

  /// Wall-clock time at the café.
  pub fn now_local(&self) -> NaiveDateTime {
    local_time(Utc::now(), self.options.utc_offset_minutes)
  }

  /// Today's gift exchange event, or `requested` when given.
  pub fn event_id(&self, requested: Option<&str>) -> Result<EventId, ApiError> {
    match requested {
      Some(raw) => Ok(raw.parse()?),
      None => Ok(EventId::current(Utc::now(), self.options.utc_offset_minutes)),
    }
  }

  /// Current settings, through the cache.
  pub async fn settings(&self) -> Result<Settings, ApiError> {
    if let Some(settings) = self.settings_cache.get(&SETTINGS_KEY).await {
      return Ok(settings);
    }
    let settings = self.store.get_settings().await.map_err(ApiError::store)?;
    self.settings_cache.insert(SETTINGS_KEY, settings.clone()).await;
    Ok(settings)
  }

  /// Items customers can order, through the cache.
  pub async fn available_menu(&self) -> Result<Vec<MenuItem>, ApiError> {
    if let Some(items) = self.menu_cache.get(&MENU_KEY).await {
      return Ok(items);
    }
    let items = self.store.list_menu_items(true).await.map_err(ApiError::store)?;
    self.menu_cache.insert(MENU_KEY, items.clone()).await;
    Ok(items)
  }

  pub async fn invalidate_menu(&self) { self.menu_cache.invalidate(&MENU_KEY).await; }

  pub async fn invalidate_settings(&self) {
    self.settings_cache.invalidate(&SETTINGS_KEY).await;
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: HavenStore + 'static,
{
  Router::new()
    // Public café
    .route("/villages", get(villages::list::<S>))
    .route("/villages/{id}/members", get(villages::members_of::<S>))
    .route("/menu", get(menu::list::<S>))
    .route("/orders", get(orders::list_today::<S>).post(orders::create::<S>))
    .route("/orders/{id}/cancel", post(orders::cancel::<S>))
    .route("/settings", get(settings::get_settings::<S>))
    .route("/status", get(settings::status::<S>))
    // Gift exchange
    .route(
      "/gift/participants",
      get(gift::list_participants::<S>).post(gift::register::<S>),
    )
    .route("/gift/generate-matches", post(gift::generate::<S>))
    .route("/gift/matches", get(gift::list_matches::<S>).patch(gift::complete_match::<S>))
    .route("/gift/reset-matches", delete(gift::reset::<S>))
    .route("/gift/reveal", get(gift::next_reveal::<S>))
    // Admin session
    .route("/admin/login", post(admin::login::<S>))
    .route("/admin/logout", post(admin::logout::<S>))
    .route("/admin/session", get(admin::session::<S>))
    // Admin café
    .route(
      "/admin/villages",
      get(villages::admin_list::<S>).post(villages::create::<S>),
    )
    .route(
      "/admin/villages/{id}",
      put(villages::rename::<S>).delete(villages::delete::<S>),
    )
    .route(
      "/admin/members",
      get(villages::admin_members::<S>).post(villages::create_member::<S>),
    )
    .route(
      "/admin/members/{id}",
      put(villages::update_member::<S>).delete(villages::delete_member::<S>),
    )
    .route("/admin/menu", get(menu::admin_list::<S>).post(menu::create::<S>))
    .route("/admin/menu/{id}", put(menu::update::<S>).delete(menu::delete::<S>))
    .route("/admin/orders", get(orders::admin_list::<S>))
    .route(
      "/admin/orders/{id}",
      patch(orders::set_status::<S>).delete(orders::delete::<S>),
    )
    .route("/admin/settings", put(settings::put_settings::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
