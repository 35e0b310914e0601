//! Handlers for café settings and opening status.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/settings` | Cached |
//! | `GET` | `/status` | Open/closed right now, with the reason and notice |
//! | `PUT` | `/admin/settings` | Body: full [`Settings`] |

use axum::{Json, extract::State};
use chrono::NaiveDateTime;
use haven_core::{
  cafe::settings::{CafeStatus, Settings},
  store::{HavenStore, SettingsStore as _},
};
use serde::Serialize;

use crate::{AppState, error::ApiError, session::Admin};

/// `GET /settings`
pub async fn get_settings<S: HavenStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Settings>, ApiError> {
  Ok(Json(state.settings().await?))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
  pub status:     CafeStatus,
  pub notice:     Option<String>,
  /// The café's wall-clock time the status was computed at.
  pub local_time: NaiveDateTime,
}

/// `GET /status`
pub async fn status<S: HavenStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<StatusResponse>, ApiError> {
  let settings = state.settings().await?;
  let local_time = state.now_local();
  Ok(Json(StatusResponse {
    status: settings.status_at(local_time),
    notice: settings.notice,
    local_time,
  }))
}

/// `PUT /admin/settings`
pub async fn put_settings<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Json(body): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
  let settings = body.validate()?;
  let saved = state.store.put_settings(settings).await.map_err(ApiError::store)?;
  state.invalidate_settings().await;
  tracing::info!(
    ordering_enabled = saved.ordering_enabled,
    open_time = %saved.open_time,
    close_time = %saved.close_time,
    "settings updated"
  );
  Ok(Json(saved))
}
