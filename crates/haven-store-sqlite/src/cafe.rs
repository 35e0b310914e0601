//! Villages, members, menu and orders.

use chrono::{DateTime, Duration, Utc};
use haven_core::{
  cafe::{
    menu::{MenuItem, MenuItemInput},
    order::{NewOrder, OrderFilter, OrderStatus, OrderView, Placement},
    village::{MemberView, Village},
  },
  store::{MemberStore, MenuStore, OrderStore, VillageStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    MEMBER_SELECT, MENU_COLUMNS, ORDER_SELECT, RawMember, RawMenuItem, RawOrder, RawVillage,
    VILLAGE_COLUMNS, encode_dt, encode_temperatures, encode_uuid, store_precision,
  },
};

// ─── Sync helpers (run inside `Connection::call`) ────────────────────────────

fn select_village(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawVillage>> {
  conn
    .query_row(
      &format!("SELECT {VILLAGE_COLUMNS} FROM villages WHERE village_id = ?1"),
      rusqlite::params![id],
      RawVillage::read,
    )
    .optional()
}

fn select_member(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawMember>> {
  conn
    .query_row(
      &format!("{MEMBER_SELECT} WHERE m.member_id = ?1"),
      rusqlite::params![id],
      RawMember::read,
    )
    .optional()
}

fn select_menu_item(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawMenuItem>> {
  conn
    .query_row(
      &format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE menu_id = ?1"),
      rusqlite::params![id],
      RawMenuItem::read,
    )
    .optional()
}

fn select_order(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawOrder>> {
  conn
    .query_row(
      &format!("{ORDER_SELECT} WHERE o.order_id = ?1"),
      rusqlite::params![id],
      RawOrder::read,
    )
    .optional()
}

// ─── Villages ────────────────────────────────────────────────────────────────

impl VillageStore for SqliteStore {
  async fn create_village(&self, name: String) -> Result<Village> {
    let village = Village {
      village_id: Uuid::new_v4(),
      name,
      created_at: store_precision(Utc::now()),
    };

    let id_str = encode_uuid(village.village_id);
    let name_str = village.name.clone();
    let at_str = encode_dt(village.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO villages (village_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(village)
  }

  async fn list_villages(&self) -> Result<Vec<Village>> {
    let raws: Vec<RawVillage> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {VILLAGE_COLUMNS} FROM villages ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawVillage::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVillage::into_village).collect()
  }

  async fn get_village(&self, id: Uuid) -> Result<Option<Village>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_village(conn, &id_str)?))
      .await?;
    raw.map(RawVillage::into_village).transpose()
  }

  async fn rename_village(&self, id: Uuid, name: String) -> Result<Option<Village>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE villages SET name = ?2 WHERE village_id = ?1",
          rusqlite::params![id_str, name],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_village(conn, &id_str)?)
      })
      .await?;
    raw.map(RawVillage::into_village).transpose()
  }

  async fn delete_village(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM villages WHERE village_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── Members ─────────────────────────────────────────────────────────────────

impl MemberStore for SqliteStore {
  async fn create_member(&self, village_id: Uuid, name: String) -> Result<MemberView> {
    self.require_village(village_id).await?;

    let member_id = Uuid::new_v4();
    let id_str = encode_uuid(member_id);
    let village_str = encode_uuid(village_id);
    let at_str = encode_dt(store_precision(Utc::now()));

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO members (member_id, village_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, village_str, name, at_str],
        )?;
        Ok(select_member(conn, &id_str)?)
      })
      .await?;

    raw.ok_or(Error::Vanished("member"))?.into_view()
  }

  async fn list_members(&self, village_id: Option<Uuid>) -> Result<Vec<MemberView>> {
    let village_str = village_id.map(encode_uuid);

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{MEMBER_SELECT}
           WHERE (?1 IS NULL OR m.village_id = ?1)
           ORDER BY v.name, m.name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![village_str], RawMember::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_view).collect()
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<MemberView>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_member(conn, &id_str)?))
      .await?;
    raw.map(RawMember::into_view).transpose()
  }

  async fn update_member(
    &self,
    id: Uuid,
    village_id: Uuid,
    name: String,
  ) -> Result<Option<MemberView>> {
    self.require_village(village_id).await?;

    let id_str = encode_uuid(id);
    let village_str = encode_uuid(village_id);

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE members SET village_id = ?2, name = ?3 WHERE member_id = ?1",
          rusqlite::params![id_str, village_str, name],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_member(conn, &id_str)?)
      })
      .await?;

    raw.map(RawMember::into_view).transpose()
  }

  async fn delete_member(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM members WHERE member_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── Menu ────────────────────────────────────────────────────────────────────

impl MenuStore for SqliteStore {
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
      created_at:   store_precision(Utc::now()),
    };

    let id_str       = encode_uuid(item.menu_id);
    let name         = item.name.clone();
    let description  = item.description.clone();
    let category     = item.category.clone();
    let price        = item.price;
    let temperatures = encode_temperatures(&item.temperatures)?;
    let has_strength = item.has_strength;
    let available    = item.available;
    let sort_order   = item.sort_order;
    let at_str       = encode_dt(item.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO menu_items (
             menu_id, name, description, category, price, temperatures,
             has_strength, available, sort_order, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            name,
            description,
            category,
            price,
            temperatures,
            has_strength,
            available,
            sort_order,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn list_menu_items(&self, only_available: bool) -> Result<Vec<MenuItem>> {
    let raws: Vec<RawMenuItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MENU_COLUMNS} FROM menu_items
           WHERE (?1 = 0 OR available = 1)
           ORDER BY sort_order, name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![only_available], RawMenuItem::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMenuItem::into_item).collect()
  }

  async fn get_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_menu_item(conn, &id_str)?))
      .await?;
    raw.map(RawMenuItem::into_item).transpose()
  }

  async fn update_menu_item(&self, id: Uuid, input: MenuItemInput) -> Result<Option<MenuItem>> {
    let id_str       = encode_uuid(id);
    let temperatures = encode_temperatures(&input.temperatures)?;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE menu_items SET
             name = ?2, description = ?3, category = ?4, price = ?5,
             temperatures = ?6, has_strength = ?7, available = ?8, sort_order = ?9
           WHERE menu_id = ?1",
          rusqlite::params![
            id_str,
            input.name,
            input.description,
            input.category,
            input.price,
            temperatures,
            input.has_strength,
            input.available,
            input.sort_order,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_menu_item(conn, &id_str)?)
      })
      .await?;

    raw.map(RawMenuItem::into_item).transpose()
  }

  async fn delete_menu_item(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM menu_items WHERE menu_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── Orders ──────────────────────────────────────────────────────────────────

/// A [`NewOrder`] in column form, ready to bind.
struct OrderRow {
  order_id:    String,
  member_id:   String,
  menu_id:     String,
  quantity:    u32,
  temperature: Option<String>,
  strength:    Option<String>,
  note:        Option<String>,
  created_at:  String,
}

impl OrderRow {
  fn new(order: NewOrder, now: DateTime<Utc>) -> Self {
    Self {
      order_id:    encode_uuid(Uuid::new_v4()),
      member_id:   encode_uuid(order.member_id),
      menu_id:     encode_uuid(order.menu_id),
      quantity:    order.quantity,
      temperature: order.temperature.map(|t| t.as_ref().to_owned()),
      strength:    order.strength.map(|s| s.as_ref().to_owned()),
      note:        order.note,
      created_at:  encode_dt(store_precision(now)),
    }
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<Option<RawOrder>> {
    conn.execute(
      "INSERT INTO orders (
         order_id, member_id, menu_id, quantity, temperature, strength,
         note, status, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
      rusqlite::params![
        self.order_id,
        self.member_id,
        self.menu_id,
        self.quantity,
        self.temperature,
        self.strength,
        self.note,
        OrderStatus::Pending.as_ref(),
        self.created_at,
      ],
    )?;
    select_order(conn, &self.order_id)
  }

  /// Newest pending order for the same member, item and options created at
  /// or after `since`. `IS` compares the nullable option columns.
  fn pending_twin(
    &self,
    conn: &rusqlite::Connection,
    since: &str,
  ) -> rusqlite::Result<Option<RawOrder>> {
    conn
      .query_row(
        &format!(
          "{ORDER_SELECT}
           WHERE o.member_id   =  ?1
             AND o.menu_id     =  ?2
             AND o.temperature IS ?3
             AND o.strength    IS ?4
             AND o.status      =  ?5
             AND o.created_at  >= ?6
           ORDER BY o.created_at DESC, o.rowid DESC
           LIMIT 1"
        ),
        rusqlite::params![
          self.member_id,
          self.menu_id,
          self.temperature,
          self.strength,
          OrderStatus::Pending.as_ref(),
          since,
        ],
        RawOrder::read,
      )
      .optional()
  }
}

impl OrderStore for SqliteStore {
  async fn create_order(&self, order: NewOrder, now: DateTime<Utc>) -> Result<OrderView> {
    let row = OrderRow::new(order, now);
    let raw = self.conn.call(move |conn| Ok(row.insert(conn)?)).await?;
    raw.ok_or(Error::Vanished("order"))?.into_view()
  }

  async fn place_order(
    &self,
    order: NewOrder,
    now: DateTime<Utc>,
    window: Duration,
  ) -> Result<Placement> {
    let row = OrderRow::new(order, now);
    let since = encode_dt(store_precision(now - window));

    let (raw, created) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(existing) = row.pending_twin(&tx, &since)? {
          return Ok((Some(existing), false));
        }
        let inserted = row.insert(&tx)?;
        tx.commit()?;
        Ok((inserted, true))
      })
      .await?;

    let view = raw.ok_or(Error::Vanished("order"))?.into_view()?;
    if created {
      Ok(Placement::Created(view))
    } else {
      tracing::debug!(order_id = %view.order.order_id, "pending twin found");
      Ok(Placement::Duplicate(view))
    }
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<OrderView>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_order(conn, &id_str)?))
      .await?;
    raw.map(RawOrder::into_view).transpose()
  }

  async fn list_orders<'a>(&'a self, filter: &'a OrderFilter) -> Result<Vec<OrderView>> {
    let status = filter.status.map(|s| s.as_ref().to_owned());
    let member = filter.member_id.map(encode_uuid);
    let after  = filter.created_after.map(encode_dt);
    let before = filter.created_before.map(encode_dt);

    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{ORDER_SELECT}
           WHERE (?1 IS NULL OR o.status     =  ?1)
             AND (?2 IS NULL OR o.member_id  =  ?2)
             AND (?3 IS NULL OR o.created_at >= ?3)
             AND (?4 IS NULL OR o.created_at <  ?4)
           ORDER BY o.created_at DESC, o.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status, member, after, before], RawOrder::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_view).collect()
  }

  async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<OrderView>> {
    let id_str     = encode_uuid(id);
    let status_str = status.as_ref().to_owned();
    let at_str     = encode_dt(store_precision(Utc::now()));

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE orders SET status = ?2, updated_at = ?3 WHERE order_id = ?1",
          rusqlite::params![id_str, status_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_order(conn, &id_str)?)
      })
      .await?;

    raw.map(RawOrder::into_view).transpose()
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM orders WHERE order_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(changed > 0)
  }
}
