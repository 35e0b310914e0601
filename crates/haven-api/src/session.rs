//! Admin sessions: password check, in-memory session store, and the
//! [`Admin`] extractor guarding admin routes.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use haven_core::store::HavenStore;
use rand::RngCore as _;
use tokio::sync::RwLock;

use crate::{AppState, error::ApiError};

/// Name of the cookie carrying the session token.
pub const COOKIE_NAME: &str = "haven_session";

// ─── Password ────────────────────────────────────────────────────────────────

/// Check `password` against an argon2 PHC string (`$argon2id$v=19$…`).
///
/// An empty or malformed hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
  pub created_at: DateTime<Utc>,
}

/// Sessions keyed by an opaque random token, expiring `ttl` after login.
pub struct SessionStore {
  ttl:      Duration,
  sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new(ttl: Duration) -> Self { Self { ttl, sessions: RwLock::new(HashMap::new()) } }

  /// Start a session and return its token.
  pub async fn create_session(&self) -> String {
    self.create_session_at(Utc::now()).await
  }

  async fn create_session_at(&self, created_at: DateTime<Utc>) -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    self
      .sessions
      .write()
      .await
      .insert(token.clone(), Session { created_at });
    token
  }

  /// The live session for `token`. Expired sessions are removed.
  pub async fn get_session(&self, token: &str) -> Option<Session> {
    let now = Utc::now();
    {
      let sessions = self.sessions.read().await;
      let session = sessions.get(token)?;
      if now - session.created_at < self.ttl {
        return Some(session.clone());
      }
    }
    self.sessions.write().await.remove(token);
    None
  }

  pub async fn delete_session(&self, token: &str) -> bool {
    self.sessions.write().await.remove(token).is_some()
  }

  /// Drop every expired session, returning how many were removed.
  pub async fn cleanup_expired(&self) -> usize {
    let now = Utc::now();
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| now - s.created_at < self.ttl);
    before - sessions.len()
  }
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// The session token from the request's `Cookie` header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == COOKIE_NAME)
    .map(|(_, value)| value)
}

pub fn session_cookie(token: &str, ttl: Duration) -> Result<HeaderValue, ApiError> {
  HeaderValue::from_str(&format!(
    "{COOKIE_NAME}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
    ttl.num_seconds()
  ))
  .map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn expired_cookie() -> HeaderValue {
  HeaderValue::from_static("haven_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Zero-size marker: present in the handler means the caller is logged in.
pub struct Admin;

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: HavenStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    state
      .sessions
      .get_session(token)
      .await
      .map(|_| Admin)
      .ok_or(ApiError::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  use super::*;

  #[test]
  fn password_verification() {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();
    assert!(verify_password("secret", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("secret", ""));
  }

  #[tokio::test]
  async fn sessions_expire() {
    let store = SessionStore::new(Duration::minutes(30));
    let live = store.create_session().await;
    let stale = store.create_session_at(Utc::now() - Duration::minutes(31)).await;
    assert_ne!(live, stale);
    assert_eq!(live.len(), 64);

    assert!(store.get_session(&live).await.is_some());
    assert!(store.get_session(&stale).await.is_none());
    assert!(store.get_session("nope").await.is_none());
  }

  #[tokio::test]
  async fn cleanup_and_delete() {
    let store = SessionStore::new(Duration::minutes(30));
    let live = store.create_session().await;
    store.create_session_at(Utc::now() - Duration::hours(2)).await;
    assert_eq!(store.cleanup_expired().await, 1);

    assert!(store.delete_session(&live).await);
    assert!(!store.delete_session(&live).await);
    assert!(store.get_session(&live).await.is_none());
  }

  #[test]
  fn reads_token_among_other_cookies() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; haven_session=abc123; lang=ko"),
    );
    assert_eq!(session_token(&headers), Some("abc123"));
    assert_eq!(session_token(&HeaderMap::new()), None);
  }
}
