//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use haven_core::store::{ErrorClass, StoreError};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// A matching order is already pending; the client may resend with
  /// `confirm_duplicate`.
  #[error("duplicate order: {existing_order_id}")]
  DuplicateOrder { message: String, existing_order_id: Uuid },

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// A domain invariant failed inside the server.
  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error by its class.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.class() {
      ErrorClass::NotFound => ApiError::NotFound(e.to_string()),
      ErrorClass::Conflict => ApiError::Conflict(e.to_string()),
      ErrorClass::Internal => ApiError::Store(Box::new(e)),
    }
  }
}

impl From<haven_core::Error> for ApiError {
  fn from(e: haven_core::Error) -> Self {
    use haven_core::Error as E;
    let message = e.to_string();
    match e {
      e if e.is_internal() => ApiError::Internal(message),
      E::CafeClosed(_) => ApiError::Forbidden(message),
      E::DuplicateOrder(existing_order_id) => {
        ApiError::DuplicateOrder { message, existing_order_id }
      }
      E::InvalidTransition { .. } | E::InvalidRevealTransition { .. } => {
        ApiError::Conflict(message)
      }
      _ => ApiError::BadRequest(message),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::DuplicateOrder { message, existing_order_id } => (
        StatusCode::CONFLICT,
        json!({ "error": message, "existing_order_id": existing_order_id }),
      ),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "error": "admin login required" }))
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": m }))
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
