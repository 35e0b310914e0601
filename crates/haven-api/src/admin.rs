//! Admin login and logout.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/admin/login` | Body: `{"password":"..."}`; sets the session cookie |
//! | `POST` | `/admin/logout` | Clears the session and cookie |
//! | `GET`  | `/admin/session` | `{"logged_in": bool}` |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, header},
  response::IntoResponse,
};
use haven_core::store::HavenStore;
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  error::ApiError,
  session::{expired_cookie, session_cookie, session_token, verify_password},
};

#[derive(Deserialize)]
pub struct LoginBody {
  pub password: String,
}

/// `POST /admin/login`
pub async fn login<S: HavenStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
  if !verify_password(&body.password, &state.options.admin_password_hash) {
    tracing::warn!("rejected admin login");
    return Err(ApiError::Unauthorized);
  }

  let token = state.sessions.create_session().await;
  let cookie = session_cookie(&token, state.options.session_ttl)?;
  tracing::info!("admin logged in");
  Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "logged_in": true }))))
}

/// `POST /admin/logout`
pub async fn logout<S: HavenStore>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> impl IntoResponse {
  if let Some(token) = session_token(&headers) {
    state.sessions.delete_session(token).await;
  }
  ([(header::SET_COOKIE, expired_cookie())], Json(json!({ "logged_in": false })))
}

/// `GET /admin/session`
pub async fn session<S: HavenStore>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Json<serde_json::Value> {
  let logged_in = match session_token(&headers) {
    Some(token) => state.sessions.get_session(token).await.is_some(),
    None => false,
  };
  Json(json!({ "logged_in": logged_in }))
}
