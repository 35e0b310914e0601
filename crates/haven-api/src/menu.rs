//! Handlers for the drink menu.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/menu` | Available items only; cached |
//! | `GET`    | `/admin/menu` | Every item |
//! | `POST`   | `/admin/menu` | Body: [`MenuItemInput`] |
//! | `PUT`    | `/admin/menu/{id}` | Body: [`MenuItemInput`] |
//! | `DELETE` | `/admin/menu/{id}` | 409 while orders reference the item |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use haven_core::{
  cafe::menu::{MenuItem, MenuItemInput},
  store::{HavenStore, MenuStore as _},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::Admin};

/// `GET /menu`
pub async fn list<S: HavenStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
  Ok(Json(state.available_menu().await?))
}

/// `GET /admin/menu`
pub async fn admin_list<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
  let items = state.store.list_menu_items(false).await.map_err(ApiError::store)?;
  Ok(Json(items))
}

/// `POST /admin/menu`
pub async fn create<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Json(body): Json<MenuItemInput>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body.validate()?;
  let item = state.store.create_menu_item(input).await.map_err(ApiError::store)?;
  state.invalidate_menu().await;
  tracing::info!(menu_id = %item.menu_id, name = %item.name, "menu item created");
  Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /admin/menu/{id}`
pub async fn update<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MenuItemInput>,
) -> Result<Json<MenuItem>, ApiError> {
  let input = body.validate()?;
  let item = state
    .store
    .update_menu_item(id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("menu item {id} not found")))?;
  state.invalidate_menu().await;
  Ok(Json(item))
}

/// `DELETE /admin/menu/{id}`
pub async fn delete<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let deleted = state.store.delete_menu_item(id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("menu item {id} not found")));
  }
  state.invalidate_menu().await;
  Ok(StatusCode::NO_CONTENT)
}
