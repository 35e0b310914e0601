//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::{Arc, OnceLock};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::NaiveTime;
use haven_core::{
  cafe::settings::Settings,
  store::{HavenStore, SettingsStore as _},
};
use haven_store_memory::MemoryStore;
use haven_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiOptions, AppState, api_router};

const PASSWORD: &str = "secret";
const EVENT: &str = "2024-12-22";

fn password_hash() -> String {
  static HASH: OnceLock<String> = OnceLock::new();
  HASH
    .get_or_init(|| {
      let salt = SaltString::generate(&mut OsRng);
      Argon2::default()
        .hash_password(PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string()
    })
    .clone()
}

fn always_open() -> Settings {
  let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
  Settings { open_time: midnight, close_time: midnight, ..Settings::default() }
}

async fn app_with<S: HavenStore + 'static>(store: S) -> Router {
  store.put_settings(always_open()).await.unwrap();
  let options = ApiOptions { admin_password_hash: password_hash(), ..ApiOptions::default() };
  api_router(AppState::new(Arc::new(store), options))
}

async fn app() -> Router { app_with(MemoryStore::new()).await }

struct Reply {
  status: StatusCode,
  cookie: Option<String>,
  body:   Value,
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  cookie: Option<&str>,
  body: Option<Value>,
) -> Reply {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(cookie) = cookie {
    builder = builder.header(header::COOKIE, cookie);
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let cookie = resp
    .headers()
    .get(header::SET_COOKIE)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(';').next())
    .map(str::to_owned);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  Reply { status, cookie, body }
}

async fn login(app: &Router) -> String {
  let reply = send(app, "POST", "/admin/login", None, Some(json!({ "password": PASSWORD }))).await;
  assert_eq!(reply.status, StatusCode::OK);
  reply.cookie.expect("session cookie")
}

/// A village, a member and a latte that comes hot or iced.
struct Cafe {
  cookie:    String,
  village:   String,
  member_id: String,
  menu_id:   String,
}

async fn seed(app: &Router) -> Cafe {
  let cookie = login(app).await;
  let village = send(app, "POST", "/admin/villages", Some(&cookie), Some(json!({ "name": "Bethel" })))
    .await
    .body["village_id"]
    .as_str()
    .unwrap()
    .to_owned();
  let member_id = send(
    app,
    "POST",
    "/admin/members",
    Some(&cookie),
    Some(json!({ "village_id": village, "name": "Joy" })),
  )
  .await
  .body["member_id"]
  .as_str()
  .unwrap()
  .to_owned();
  let menu_id = send(
    app,
    "POST",
    "/admin/menu",
    Some(&cookie),
    Some(json!({
      "name": "Latte",
      "price": 3000,
      "temperatures": ["hot", "iced"],
      "has_strength": true,
    })),
  )
  .await
  .body["menu_id"]
  .as_str()
  .unwrap()
  .to_owned();
  Cafe { cookie, village, member_id, menu_id }
}

// ─── Admin session ───────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_a_session() {
  let app = app().await;
  assert_eq!(send(&app, "GET", "/admin/villages", None, None).await.status, StatusCode::UNAUTHORIZED);

  let wrong = send(&app, "POST", "/admin/login", None, Some(json!({ "password": "nope" }))).await;
  assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
  assert!(wrong.cookie.is_none());

  let cookie = login(&app).await;
  assert!(cookie.starts_with("haven_session="));
  assert_eq!(send(&app, "GET", "/admin/villages", Some(&cookie), None).await.status, StatusCode::OK);
  let session = send(&app, "GET", "/admin/session", Some(&cookie), None).await;
  assert_eq!(session.body["logged_in"], true);

  send(&app, "POST", "/admin/logout", Some(&cookie), None).await;
  assert_eq!(
    send(&app, "GET", "/admin/villages", Some(&cookie), None).await.status,
    StatusCode::UNAUTHORIZED
  );
}

// ─── Café ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn public_lists_villages_and_members() {
  let app = app().await;
  let cafe = seed(&app).await;

  let villages = send(&app, "GET", "/villages", None, None).await;
  assert_eq!(villages.body[0]["name"], "Bethel");

  let members = send(&app, "GET", &format!("/villages/{}/members", cafe.village), None, None).await;
  assert_eq!(members.body[0]["name"], "Joy");
  assert_eq!(members.body[0]["village_name"], "Bethel");

  let missing = send(
    &app,
    "GET",
    "/villages/00000000-0000-0000-0000-000000000000/members",
    None,
    None,
  )
  .await;
  assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn village_with_members_cannot_be_deleted() {
  let app = app().await;
  let cafe = seed(&app).await;
  let reply = send(
    &app,
    "DELETE",
    &format!("/admin/villages/{}", cafe.village),
    Some(&cafe.cookie),
    None,
  )
  .await;
  assert_eq!(reply.status, StatusCode::CONFLICT);
  assert!(reply.body["error"].is_string());
}

#[tokio::test]
async fn menu_cache_is_invalidated_by_admin_writes() {
  let app = app().await;
  assert_eq!(send(&app, "GET", "/menu", None, None).await.body, json!([]));

  let cafe = seed(&app).await;
  let menu = send(&app, "GET", "/menu", None, None).await;
  assert_eq!(menu.body[0]["name"], "Latte");

  let update = json!({ "name": "Latte", "price": 3000, "available": false });
  send(&app, "PUT", &format!("/admin/menu/{}", cafe.menu_id), Some(&cafe.cookie), Some(update)).await;
  assert_eq!(send(&app, "GET", "/menu", None, None).await.body, json!([]));
}

#[tokio::test]
async fn order_options_duplicates_and_cancel() {
  let app = app().await;
  let cafe = seed(&app).await;
  let order = |extra: Value| {
    let mut body = json!({ "member_id": cafe.member_id, "menu_id": cafe.menu_id });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
      body.extend(extra.clone());
    }
    body
  };

  let no_temp = send(&app, "POST", "/orders", None, Some(order(json!({})))).await;
  assert_eq!(no_temp.status, StatusCode::BAD_REQUEST);

  let first = send(&app, "POST", "/orders", None, Some(order(json!({ "temperature": "iced" })))).await;
  assert_eq!(first.status, StatusCode::CREATED);
  assert_eq!(first.body["strength"], "regular");
  assert_eq!(first.body["status"], "pending");
  let first_id = first.body["order_id"].as_str().unwrap().to_owned();

  let again = send(&app, "POST", "/orders", None, Some(order(json!({ "temperature": "iced" })))).await;
  assert_eq!(again.status, StatusCode::CONFLICT);
  assert_eq!(again.body["existing_order_id"], first_id.as_str());

  let confirmed = send(
    &app,
    "POST",
    "/orders",
    None,
    Some(order(json!({ "temperature": "iced", "confirm_duplicate": true }))),
  )
  .await;
  assert_eq!(confirmed.status, StatusCode::CREATED);

  // A different option is a different drink.
  let hot = send(&app, "POST", "/orders", None, Some(order(json!({ "temperature": "hot" })))).await;
  assert_eq!(hot.status, StatusCode::CREATED);

  let mine = send(&app, "GET", &format!("/orders?member_id={}", cafe.member_id), None, None).await;
  assert_eq!(mine.body.as_array().unwrap().len(), 3);

  let cancel = send(&app, "POST", &format!("/orders/{first_id}/cancel"), None, None).await;
  assert_eq!(cancel.status, StatusCode::OK);
  assert_eq!(cancel.body["status"], "cancelled");
  let twice = send(&app, "POST", &format!("/orders/{first_id}/cancel"), None, None).await;
  assert_eq!(twice.status, StatusCode::CONFLICT);
}

/// Two identical orders sent at once place exactly one; the other is
/// reported as its duplicate.
async fn double_submit(app: Router) {
  let cafe = seed(&app).await;
  for round in 0..20 {
    // A fresh item each round so earlier orders never collide.
    let menu_id = send(
      &app,
      "POST",
      "/admin/menu",
      Some(&cafe.cookie),
      Some(json!({ "name": format!("Drip {round}"), "price": 2000 })),
    )
    .await
    .body["menu_id"]
    .as_str()
    .unwrap()
    .to_owned();
    let body = json!({ "member_id": cafe.member_id, "menu_id": menu_id });

    let (a, b) = tokio::join!(
      send(&app, "POST", "/orders", None, Some(body.clone())),
      send(&app, "POST", "/orders", None, Some(body)),
    );
    let (created, duplicate) = match a.status {
      StatusCode::CREATED => (a, b),
      _ => (b, a),
    };
    assert_eq!(created.status, StatusCode::CREATED, "round {round}");
    assert_eq!(duplicate.status, StatusCode::CONFLICT, "round {round}");
    assert_eq!(duplicate.body["existing_order_id"], created.body["order_id"]);
  }

  let mine = send(&app, "GET", &format!("/orders?member_id={}", cafe.member_id), None, None).await;
  assert_eq!(mine.body.as_array().unwrap().len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_orders_place_one_in_memory() { double_submit(app().await).await; }

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_orders_place_one_on_sqlite() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  double_submit(app_with(store).await).await;
}

#[tokio::test]
async fn admin_completes_and_filters_orders() {
  let app = app().await;
  let cafe = seed(&app).await;
  let placed = send(
    &app,
    "POST",
    "/orders",
    None,
    Some(json!({ "member_id": cafe.member_id, "menu_id": cafe.menu_id, "temperature": "hot" })),
  )
  .await;
  let id = placed.body["order_id"].as_str().unwrap().to_owned();

  let done = send(
    &app,
    "PATCH",
    &format!("/admin/orders/{id}"),
    Some(&cafe.cookie),
    Some(json!({ "status": "completed" })),
  )
  .await;
  assert_eq!(done.body["status"], "completed");

  let pending = send(&app, "GET", "/admin/orders?status=pending", Some(&cafe.cookie), None).await;
  assert_eq!(pending.body, json!([]));
  let completed = send(&app, "GET", "/admin/orders?status=completed", Some(&cafe.cookie), None).await;
  assert_eq!(completed.body.as_array().unwrap().len(), 1);
  assert_eq!(completed.body[0]["menu_name"], "Latte");
}

#[tokio::test]
async fn closed_cafe_rejects_orders() {
  let app = app().await;
  let cafe = seed(&app).await;
  let mut closed = serde_json::to_value(always_open()).unwrap();
  closed["ordering_enabled"] = json!(false);
  closed["notice"] = json!("  Back next week  ");
  let saved = send(&app, "PUT", "/admin/settings", Some(&cafe.cookie), Some(closed)).await;
  assert_eq!(saved.status, StatusCode::OK);
  assert_eq!(saved.body["notice"], "Back next week");

  let status = send(&app, "GET", "/status", None, None).await;
  assert_eq!(status.body["status"]["state"], "closed");
  assert_eq!(status.body["status"]["reason"]["kind"], "disabled");

  let reply = send(
    &app,
    "POST",
    "/orders",
    None,
    Some(json!({ "member_id": cafe.member_id, "menu_id": cafe.menu_id, "temperature": "hot" })),
  )
  .await;
  assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

// ─── Gift exchange ───────────────────────────────────────────────────────────

async fn register(app: &Router, village: &str, names: &[&str]) {
  for name in names {
    let reply = send(
      app,
      "POST",
      "/gift/participants",
      None,
      Some(json!({ "name": name, "village_id": village })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
  }
}

async fn gift_flow(app: Router) {
  let cafe = seed(&app).await;
  let cookie = cafe.cookie.as_str();
  let other = send(&app, "POST", "/admin/villages", Some(cookie), Some(json!({ "name": "Shiloh" })))
    .await
    .body["village_id"]
    .as_str()
    .unwrap()
    .to_owned();
  register(&app, &cafe.village, &["A", "B"]).await;
  register(&app, &other, &["C"]).await;

  let generate = format!("/gift/generate-matches?event_id={EVENT}");
  let first = send(&app, "POST", &generate, Some(cookie), None).await;
  assert_eq!(first.status, StatusCode::OK);
  assert_eq!(first.body["count"], 3);
  for m in first.body["matches"].as_array().unwrap() {
    assert_ne!(m["giver_id"], m["receiver_id"]);
    assert_eq!(m["revealed"], false);
  }

  // Regenerating replaces rather than appends.
  send(&app, "POST", &generate, Some(cookie), None).await;
  let listed = send(&app, "GET", &format!("/gift/matches?event_id={EVENT}"), None, None).await;
  assert_eq!(listed.body.as_array().unwrap().len(), 3);

  let reveal_uri = format!("/gift/reveal?event_id={EVENT}");
  let reveal = send(&app, "GET", &reveal_uri, Some(cookie), None).await;
  assert_eq!(reveal.body["phase"], "spinning");
  assert_eq!(reveal.body["remaining"], 3);
  let flashes = reveal.body["flashes"].as_array().unwrap();
  assert_eq!(flashes.last().unwrap(), &reveal.body["current"]["receiver_name"]);

  let match_id = reveal.body["current"]["match_id"].clone();
  let body = json!({ "matchId": match_id, "isCompleted": true });
  let marked = send(&app, "PATCH", &format!("/gift/matches?event_id={EVENT}"), Some(cookie), Some(body.clone())).await;
  assert_eq!(marked.body["revealed"], true);
  // Idempotent.
  let again = send(&app, "PATCH", &format!("/gift/matches?event_id={EVENT}"), Some(cookie), Some(body)).await;
  assert_eq!(again.status, StatusCode::OK);

  let next = send(&app, "GET", &reveal_uri, Some(cookie), None).await;
  assert_eq!(next.body["remaining"], 2);
  assert_ne!(next.body["current"]["match_id"], match_id);

  // Other events are untouched by a reset.
  send(&app, "POST", "/gift/generate-matches?event_id=2024-12-23", Some(cookie), None).await;
  let reset = send(&app, "DELETE", &format!("/gift/reset-matches?event_id={EVENT}"), Some(cookie), None).await;
  assert_eq!(reset.body["deleted"], 3);
  let empty = send(&app, "GET", &format!("/gift/matches?event_id={EVENT}"), None, None).await;
  assert_eq!(empty.body, json!([]));
  let kept = send(&app, "GET", "/gift/matches?event_id=2024-12-23", None, None).await;
  assert_eq!(kept.body.as_array().unwrap().len(), 3);

  // A match is only completed through its own event.
  let foreign = json!({ "matchId": kept.body[0]["match_id"], "isCompleted": true });
  for uri in [format!("/gift/matches?event_id={EVENT}"), "/gift/matches?event_id=2024-12-21".into()] {
    let reply = send(&app, "PATCH", &uri, Some(cookie), Some(foreign.clone())).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
  }
  let kept = send(&app, "GET", "/gift/matches?event_id=2024-12-23", None, None).await;
  assert_eq!(kept.body[0]["revealed"], false);
  let unmark = json!({ "matchId": kept.body[0]["match_id"], "isCompleted": false });
  let reply = send(&app, "PATCH", &format!("/gift/matches?event_id={EVENT}"), Some(cookie), Some(unmark)).await;
  assert_eq!(reply.status, StatusCode::NOT_FOUND);

  let finished = send(&app, "GET", &reveal_uri, Some(cookie), None).await;
  assert_eq!(finished.body["phase"], "finished");
  assert_eq!(finished.body["current"], Value::Null);
}

#[tokio::test]
async fn gift_exchange_end_to_end_in_memory() { gift_flow(app().await).await; }

#[tokio::test]
async fn gift_exchange_end_to_end_on_sqlite() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  gift_flow(app_with(store).await).await;
}

#[tokio::test]
async fn generation_needs_two_participants() {
  let app = app().await;
  let cafe = seed(&app).await;
  let generate = format!("/gift/generate-matches?event_id={EVENT}");
  let matches = format!("/gift/matches?event_id={EVENT}");

  let none = send(&app, "POST", &generate, Some(&cafe.cookie), None).await;
  assert_eq!(none.status, StatusCode::BAD_REQUEST);
  assert!(none.body["error"].as_str().unwrap().contains("at least 2"));
  assert_eq!(send(&app, "GET", &matches, None, None).await.body, json!([]));

  register(&app, &cafe.village, &["Solo"]).await;
  let one = send(&app, "POST", &generate, Some(&cafe.cookie), None).await;
  assert_eq!(one.status, StatusCode::BAD_REQUEST);
  assert!(one.body["error"].as_str().unwrap().contains("at least 2"));
  assert_eq!(send(&app, "GET", &matches, None, None).await.body, json!([]));
}

#[tokio::test]
async fn duplicate_participant_is_conflict() {
  let app = app().await;
  let cafe = seed(&app).await;
  register(&app, &cafe.village, &["A"]).await;
  let reply = send(
    &app,
    "POST",
    "/gift/participants",
    None,
    Some(json!({ "name": " A ", "village_id": cafe.village })),
  )
  .await;
  assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_event_id_is_bad_request() {
  let app = app().await;
  let reply = send(&app, "GET", "/gift/matches?event_id=2024-1-1", None, None).await;
  assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
