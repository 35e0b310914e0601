//! Villages, members, menu and orders.

use chrono::{DateTime, Duration, Utc};
use haven_core::{
  cafe::{
    menu::{MenuItem, MenuItemInput},
    order::{NewOrder, Order, OrderFilter, OrderStatus, OrderView, Placement, find_duplicate},
    village::{Member, MemberView, Village},
  },
  store::{MemberStore, MenuStore, OrderStore, VillageStore},
};
use uuid::Uuid;

use crate::{Error, MemoryStore, Result, store::State};

fn check_village_name(state: &State, name: &str, except: Option<Uuid>) -> Result<()> {
  let taken = state
    .villages
    .iter()
    .any(|v| v.name == name && Some(v.village_id) != except);
  if taken {
    return Err(Error::Duplicate { what: "village", name: name.to_owned() });
  }
  Ok(())
}

fn check_member_name(state: &State, village_id: Uuid, name: &str, except: Option<Uuid>) -> Result<()> {
  let taken = state
    .members
    .iter()
    .any(|m| m.village_id == village_id && m.name == name && Some(m.member_id) != except);
  if taken {
    return Err(Error::Duplicate { what: "member", name: name.to_owned() });
  }
  Ok(())
}

// ─── Villages ────────────────────────────────────────────────────────────────

impl VillageStore for MemoryStore {
  async fn create_village(&self, name: String) -> Result<Village> {
    let mut state = self.state.write().await;
    check_village_name(&state, &name, None)?;

    let village = Village { village_id: Uuid::new_v4(), name, created_at: Utc::now() };
    state.villages.push(village.clone());
    Ok(village)
  }

  async fn list_villages(&self) -> Result<Vec<Village>> {
    let mut villages = self.state.read().await.villages.clone();
    villages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(villages)
  }

  async fn get_village(&self, id: Uuid) -> Result<Option<Village>> {
    Ok(self.state.read().await.village(id).cloned())
  }

  async fn rename_village(&self, id: Uuid, name: String) -> Result<Option<Village>> {
    let mut state = self.state.write().await;
    if state.village(id).is_none() {
      return Ok(None);
    }
    check_village_name(&state, &name, Some(id))?;

    let village = state.villages.iter_mut().find(|v| v.village_id == id);
    Ok(village.map(|v| {
      v.name = name;
      v.clone()
    }))
  }

  async fn delete_village(&self, id: Uuid) -> Result<bool> {
    let mut state = self.state.write().await;
    let Some(index) = state.villages.iter().position(|v| v.village_id == id) else {
      return Ok(false);
    };
    let referenced = state.members.iter().any(|m| m.village_id == id)
      || state.participants.iter().any(|p| p.village_id == id);
    if referenced {
      return Err(Error::InUse { what: "village", id });
    }
    state.villages.remove(index);
    Ok(true)
  }
}

// ─── Members ─────────────────────────────────────────────────────────────────

impl MemberStore for MemoryStore {
  async fn create_member(&self, village_id: Uuid, name: String) -> Result<MemberView> {
    let mut state = self.state.write().await;
    let village_name = state.require_village(village_id)?.name.clone();
    check_member_name(&state, village_id, &name, None)?;

    let member = Member { member_id: Uuid::new_v4(), village_id, name, created_at: Utc::now() };
    state.members.push(member.clone());
    Ok(MemberView { member, village_name })
  }

  async fn list_members(&self, village_id: Option<Uuid>) -> Result<Vec<MemberView>> {
    let state = self.state.read().await;
    let mut views: Vec<MemberView> = state
      .members
      .iter()
      .filter(|m| village_id.is_none_or(|v| m.village_id == v))
      .filter_map(|m| state.member_view(m))
      .collect();
    views.sort_by(|a, b| {
      (&a.village_name, &a.member.name).cmp(&(&b.village_name, &b.member.name))
    });
    Ok(views)
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<MemberView>> {
    let state = self.state.read().await;
    Ok(
      state
        .members
        .iter()
        .find(|m| m.member_id == id)
        .and_then(|m| state.member_view(m)),
    )
  }

  async fn update_member(
    &self,
    id: Uuid,
    village_id: Uuid,
    name: String,
  ) -> Result<Option<MemberView>> {
    let mut state = self.state.write().await;
    let village_name = state.require_village(village_id)?.name.clone();
    if !state.members.iter().any(|m| m.member_id == id) {
      return Ok(None);
    }
    check_member_name(&state, village_id, &name, Some(id))?;

    let member = state.members.iter_mut().find(|m| m.member_id == id);
    Ok(member.map(|m| {
      m.village_id = village_id;
      m.name = name;
      MemberView { member: m.clone(), village_name }
    }))
  }

  async fn delete_member(&self, id: Uuid) -> Result<bool> {
    let mut state = self.state.write().await;
    let before = state.members.len();
    state.members.retain(|m| m.member_id != id);
    if state.members.len() == before {
      return Ok(false);
    }
    state.orders.retain(|o| o.member_id != id);
    Ok(true)
  }
}

// ─── Menu ────────────────────────────────────────────────────────────────────

fn apply_input(item: &mut MenuItem, input: MenuItemInput) {
  item.name = input.name;
  item.description = input.description;
  item.category = input.category;
  item.price = input.price;
  item.temperatures = input.temperatures;
  item.has_strength = input.has_strength;
  item.available = input.available;
  item.sort_order = input.sort_order;
}

impl MenuStore for MemoryStore {
  async fn create_menu_item(&self, input: MenuItemInput) -> Result<MenuItem> {
    let item = MenuItem {
      menu_id:      Uuid::new_v4(),
      name:         input.name,
      description:  input.description,
      category:     input.category,
      price:        input.price,
      temperatures: input.temperatures,
      has_strength: input.has_strength,
      available:    input.available,
      sort_order:   input.sort_order,
      created_at:   Utc::now(),
    };
    self.state.write().await.menu.push(item.clone());
    Ok(item)
  }

  async fn list_menu_items(&self, only_available: bool) -> Result<Vec<MenuItem>> {
    let mut items: Vec<MenuItem> = self
      .state
      .read()
      .await
      .menu
      .iter()
      .filter(|i| !only_available || i.available)
      .cloned()
      .collect();
    items.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));
    Ok(items)
  }

  async fn get_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
    let state = self.state.read().await;
    Ok(state.menu.iter().find(|i| i.menu_id == id).cloned())
  }

  async fn update_menu_item(&self, id: Uuid, input: MenuItemInput) -> Result<Option<MenuItem>> {
    let mut state = self.state.write().await;
    Ok(state.menu.iter_mut().find(|i| i.menu_id == id).map(|item| {
      apply_input(item, input);
      item.clone()
    }))
  }

  async fn delete_menu_item(&self, id: Uuid) -> Result<bool> {
    let mut state = self.state.write().await;
    let Some(index) = state.menu.iter().position(|i| i.menu_id == id) else {
      return Ok(false);
    };
    if state.orders.iter().any(|o| o.menu_id == id) {
      return Err(Error::InUse { what: "menu item", id });
    }
    state.menu.remove(index);
    Ok(true)
  }
}

// ─── Orders ──────────────────────────────────────────────────────────────────

/// Append a pending order, checking its references first.
fn insert_order(state: &mut State, order: NewOrder, now: DateTime<Utc>) -> Result<OrderView> {
  if !state.members.iter().any(|m| m.member_id == order.member_id) {
    return Err(Error::MissingReference { what: "member", id: order.member_id });
  }
  if !state.menu.iter().any(|i| i.menu_id == order.menu_id) {
    return Err(Error::MissingReference { what: "menu item", id: order.menu_id });
  }

  let record = Order {
    order_id:    Uuid::new_v4(),
    member_id:   order.member_id,
    menu_id:     order.menu_id,
    quantity:    order.quantity,
    temperature: order.temperature,
    strength:    order.strength,
    note:        order.note,
    status:      OrderStatus::Pending,
    created_at:  now,
    updated_at:  now,
  };
  let view = state
    .order_view(&record)
    .ok_or(Error::MissingReference { what: "member", id: record.member_id })?;
  state.orders.push(record);
  Ok(view)
}

impl OrderStore for MemoryStore {
  async fn create_order(&self, order: NewOrder, now: DateTime<Utc>) -> Result<OrderView> {
    let mut state = self.state.write().await;
    insert_order(&mut state, order, now)
  }

  async fn place_order(
    &self,
    order: NewOrder,
    now: DateTime<Utc>,
    window: Duration,
  ) -> Result<Placement> {
    let mut state = self.state.write().await;
    let twin = find_duplicate(&state.orders, &order, now, window)
      .and_then(|o| state.order_view(o));
    if let Some(existing) = twin {
      return Ok(Placement::Duplicate(existing));
    }
    insert_order(&mut state, order, now).map(Placement::Created)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<OrderView>> {
    let state = self.state.read().await;
    Ok(
      state
        .orders
        .iter()
        .find(|o| o.order_id == id)
        .and_then(|o| state.order_view(o)),
    )
  }

  async fn list_orders<'a>(&'a self, filter: &'a OrderFilter) -> Result<Vec<OrderView>> {
    let state = self.state.read().await;
    // Walk newest insertion first so equal timestamps keep that order after
    // the stable sort.
    let mut views: Vec<OrderView> = state
      .orders
      .iter()
      .rev()
      .filter(|o| filter.matches(o))
      .filter_map(|o| state.order_view(o))
      .collect();
    views.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
    Ok(views)
  }

  async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<OrderView>> {
    let mut state = self.state.write().await;
    let Some(order) = state.orders.iter_mut().find(|o| o.order_id == id) else {
      return Ok(None);
    };
    order.status = status;
    order.updated_at = Utc::now();
    let order = order.clone();
    Ok(state.order_view(&order))
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    let mut state = self.state.write().await;
    let before = state.orders.len();
    state.orders.retain(|o| o.order_id != id);
    Ok(state.orders.len() < before)
  }
}
