//! Handlers for café orders.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/orders` | Body: [`OrderBody`]; 403 when closed, 409 on a pending duplicate |
//! | `GET`    | `/orders` | Today's orders, newest first; optional `?member_id=` |
//! | `POST`   | `/orders/{id}/cancel` | Pending orders only |
//! | `GET`    | `/admin/orders` | Optional `?status=` and `?date=YYYY-MM-DD` |
//! | `PATCH`  | `/admin/orders/{id}` | Body: `{"status":"completed"}` |
//! | `DELETE` | `/admin/orders/{id}` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use haven_core::{
  cafe::{
    menu::{Strength, Temperature},
    order::{NewOrder, OrderFilter, OrderStatus, OrderView, Placement},
    settings::local_day_bounds,
  },
  store::{HavenStore, MemberStore as _, MenuStore as _, OrderStore as _},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::Admin};

fn day_filter(date: NaiveDate, utc_offset_minutes: i32) -> OrderFilter {
  let (start, end) = local_day_bounds(date, utc_offset_minutes);
  OrderFilter {
    created_after: Some(start),
    created_before: Some(end),
    ..Default::default()
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize)]
pub struct OrderBody {
  pub member_id:         Uuid,
  pub menu_id:           Uuid,
  #[serde(default = "one")]
  pub quantity:          u32,
  #[serde(default)]
  pub temperature:       Option<Temperature>,
  #[serde(default)]
  pub strength:          Option<Strength>,
  #[serde(default)]
  pub note:              Option<String>,
  /// Place the order even if an identical one is still pending.
  #[serde(default)]
  pub confirm_duplicate: bool,
}

/// `POST /orders`
pub async fn create<S: HavenStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<OrderBody>,
) -> Result<impl IntoResponse, ApiError> {
  let settings = state.settings().await?;
  settings.ensure_open(state.now_local())?;

  state
    .store
    .get_member(body.member_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {} not found", body.member_id)))?;
  let item = state
    .store
    .get_menu_item(body.menu_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("menu item {} not found", body.menu_id)))?;

  let (temperature, strength) = item.resolve_options(body.temperature, body.strength)?;
  let order = NewOrder {
    member_id: body.member_id,
    menu_id: body.menu_id,
    quantity: body.quantity,
    temperature,
    strength,
    note: body.note,
  }
  .validate()?;

  let now = Utc::now();
  let view = if body.confirm_duplicate {
    state.store.create_order(order, now).await.map_err(ApiError::store)?
  } else {
    let placed = state
      .store
      .place_order(order, now, settings.duplicate_window())
      .await
      .map_err(ApiError::store)?;
    match placed {
      Placement::Created(view) => view,
      Placement::Duplicate(existing) => {
        tracing::warn!(
          member_id = %existing.order.member_id,
          existing_order_id = %existing.order.order_id,
          "duplicate order rejected"
        );
        return Err(haven_core::Error::DuplicateOrder(existing.order.order_id).into());
      }
    }
  };

  tracing::info!(
    order_id = %view.order.order_id,
    member = %view.member_name,
    item = %view.menu_name,
    quantity = view.order.quantity,
    "order placed"
  );
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Public list & cancel ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TodayParams {
  pub member_id: Option<Uuid>,
}

/// `GET /orders[?member_id=<id>]`
pub async fn list_today<S: HavenStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<TodayParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
  let today = state.now_local().date();
  let filter = OrderFilter {
    member_id: params.member_id,
    ..day_filter(today, state.options.utc_offset_minutes)
  };
  let orders = state.store.list_orders(&filter).await.map_err(ApiError::store)?;
  Ok(Json(orders))
}

async fn change_status<S: HavenStore>(
  state: &AppState<S>,
  id: Uuid,
  to: OrderStatus,
) -> Result<OrderView, ApiError> {
  let current = state
    .store
    .get_order(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
  let next = current.order.status.transition(to)?;
  let updated = state
    .store
    .set_order_status(id, next)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
  tracing::info!(order_id = %id, status = %next, "order status changed");
  Ok(updated)
}

/// `POST /orders/{id}/cancel`
pub async fn cancel<S: HavenStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
  Ok(Json(change_status(&state, id, OrderStatus::Cancelled).await?))
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminParams {
  pub status: Option<OrderStatus>,
  pub date:   Option<NaiveDate>,
}

/// `GET /admin/orders[?status=<status>][&date=YYYY-MM-DD]`
pub async fn admin_list<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(params): Query<AdminParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
  let base = match params.date {
    Some(date) => day_filter(date, state.options.utc_offset_minutes),
    None => OrderFilter::default(),
  };
  let filter = OrderFilter { status: params.status, ..base };
  let orders = state.store.list_orders(&filter).await.map_err(ApiError::store)?;
  Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: OrderStatus,
}

/// `PATCH /admin/orders/{id}`
pub async fn set_status<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<OrderView>, ApiError> {
  Ok(Json(change_status(&state, id, body.status).await?))
}

/// `DELETE /admin/orders/{id}`
pub async fn delete<S: HavenStore>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if !state.store.delete_order(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("order {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
