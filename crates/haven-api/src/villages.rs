//! Handlers for villages and their members.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/villages` | Public |
//! | `GET`    | `/villages/{id}/members` | Public; 404 for an unknown village |
//! | `GET`    | `/admin/villages` | |
//! | `POST`   | `/admin/villages` | Body: `{"name":"..."}`; 409 on a duplicate name |
//! | `PUT`    | `/admin/villages/{id}` | Body: `{"name":"..."}` |
//! | `DELETE` | `/admin/villages/{id}` | 409 while members or participants remain |
//! | `GET`    | `/admin/members` | Optional `?village_id=` |
//! | `POST`   | `/admin/members` | Body: `{"village_id":"...","name":"..."}` |
//! | `PUT`    | `/admin/members/{id}` | Same body; moves or renames |
//! | `DELETE` | `/admin/members/{id}` | Also deletes the member's orders |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use haven_core::{
  cafe::{
    clean_name,
    village::{MemberView, Village},
  },
  store::{HavenStore, MemberStore as _, VillageStore as _},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::Admin};

// ─── Public ──────────────────────────────────────────────────────────────────

/// `GET /villages`
pub async fn list<S: HavenStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Village>>, ApiError> {
  let villages = state.store.list_villages().await.map_err(ApiError::store)?;
  Ok(Json(villages))
}

/// `GET /villages/{id}/members`
pub async fn members_of<S: HavenStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
  state
    .store
    .get_village(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("village {id} not found")))?;
  let members = state.store.list_members(Some(id)).await.map_err(ApiError::store)?;
  Ok(Json(members))
}

// ─── Admin: villages ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VillageBody {
  pub name: String,
}

/// `GET /admin/villages`
pub async fn admin_list<S: HavenStore>(
  _: Admin,
  state: State<AppState<S>>,
) -> Result<Json<Vec<Village>>, ApiError> {
  list(state).await
}

/// `POST /admin/villages`
pub async fn create<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Json(body): Json<VillageBody>,
) -> Result<impl IntoResponse, ApiError> {
  let name = clean_name("village name", &body.name)?;
  let village = state.store.create_village(name).await.map_err(ApiError::store)?;
  tracing::info!(village_id = %village.village_id, name = %village.name, "village created");
  Ok((StatusCode::CREATED, Json(village)))
}

/// `PUT /admin/villages/{id}`
pub async fn rename<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<VillageBody>,
) -> Result<Json<Village>, ApiError> {
  let name = clean_name("village name", &body.name)?;
  let village = state
    .store
    .rename_village(id, name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("village {id} not found")))?;
  Ok(Json(village))
}

/// `DELETE /admin/villages/{id}`
pub async fn delete<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if !state.store.delete_village(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("village {id} not found")));
  }
  tracing::info!(village_id = %id, "village deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Admin: members ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MemberParams {
  pub village_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MemberBody {
  pub village_id: Uuid,
  pub name:       String,
}

/// `GET /admin/members[?village_id=<id>]`
pub async fn admin_members<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(params): Query<MemberParams>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
  let members = state
    .store
    .list_members(params.village_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(members))
}

/// `POST /admin/members`
pub async fn create_member<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Json(body): Json<MemberBody>,
) -> Result<impl IntoResponse, ApiError> {
  let name = clean_name("member name", &body.name)?;
  let member = state
    .store
    .create_member(body.village_id, name)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(member)))
}

/// `PUT /admin/members/{id}`
pub async fn update_member<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MemberBody>,
) -> Result<Json<MemberView>, ApiError> {
  let name = clean_name("member name", &body.name)?;
  let member = state
    .store
    .update_member(id, body.village_id, name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  Ok(Json(member))
}

/// `DELETE /admin/members/{id}`
pub async fn delete_member<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if !state.store.delete_member(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("member {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
