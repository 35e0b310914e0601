//! SQL schema for the Haven SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS villages (
    village_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    member_id   TEXT PRIMARY KEY,
    village_id  TEXT NOT NULL REFERENCES villages(village_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (village_id, name)
);

CREATE TABLE IF NOT EXISTS menu_items (
    menu_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT,
    category      TEXT NOT NULL,
    price         INTEGER NOT NULL CHECK (price >= 0),
    temperatures  TEXT NOT NULL DEFAULT '[]',  -- JSON array of 'hot' | 'iced'
    has_strength  INTEGER NOT NULL DEFAULT 0,
    available     INTEGER NOT NULL DEFAULT 1,
    sort_order    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Deleting a member removes their orders; menu items in use cannot be
-- deleted.
CREATE TABLE IF NOT EXISTS orders (
    order_id     TEXT PRIMARY KEY,
    member_id    TEXT NOT NULL REFERENCES members(member_id) ON DELETE CASCADE,
    menu_id      TEXT NOT NULL REFERENCES menu_items(menu_id),
    quantity     INTEGER NOT NULL CHECK (quantity > 0),
    temperature  TEXT,             -- 'hot' | 'iced' | NULL
    strength     TEXT,             -- 'mild' | 'regular' | 'strong' | NULL
    note         TEXT,
    status       TEXT NOT NULL DEFAULT 'pending',
    created_at   TEXT NOT NULL,    -- fixed-width RFC 3339 UTC; sorts as text
    updated_at   TEXT NOT NULL
);

-- Single-row table.
CREATE TABLE IF NOT EXISTS settings (
    id             INTEGER PRIMARY KEY CHECK (id = 1),
    settings_json  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    participant_id  TEXT PRIMARY KEY,
    village_id      TEXT NOT NULL REFERENCES villages(village_id),
    name            TEXT NOT NULL,
    registered_at   TEXT NOT NULL,
    UNIQUE (village_id, name)
);

-- One generation per event id; replaced wholesale on regeneration.
CREATE TABLE IF NOT EXISTS matches (
    match_id     TEXT PRIMARY KEY,
    event_id     TEXT NOT NULL,    -- YYYY-MM-DD
    giver_id     TEXT NOT NULL REFERENCES participants(participant_id),
    receiver_id  TEXT NOT NULL REFERENCES participants(participant_id),
    revealed     INTEGER NOT NULL DEFAULT 0,
    position     INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    CHECK  (giver_id != receiver_id),
    UNIQUE (event_id, giver_id),
    UNIQUE (event_id, receiver_id),
    UNIQUE (event_id, position)
);

CREATE INDEX IF NOT EXISTS members_village_idx  ON members(village_id);
CREATE INDEX IF NOT EXISTS orders_member_idx    ON orders(member_id);
CREATE INDEX IF NOT EXISTS orders_created_idx   ON orders(created_at);
CREATE INDEX IF NOT EXISTS matches_event_idx    ON matches(event_id);

PRAGMA user_version = 1;
";
