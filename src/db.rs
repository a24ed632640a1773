// 🗄️ List Store - SQLite + WAL
//
// Lists are loaded and saved wholesale per operation, like the JSON file
// they replace, but every read-modify-write runs inside an IMMEDIATE
// transaction so two scanners counting into the same list cannot lose
// each other's updates.

use crate::barcode::{resolve, BarcodeError, CanonicalCode, CatalogueLookup, ResolvedItem};
use crate::inventory::{InventoryError, InventoryList, LineItem, ManualDetails, ScanOutcome};
use crate::price::Price;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("list not found: {0}")]
    ListNotFound(String),

    #[error("list already exists: {0}")]
    ListExists(String),

    #[error(transparent)]
    Barcode(#[from] BarcodeError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("corrupt row in list store: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Errors caused by the request rather than the store.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            StoreError::Barcode(_)
                | StoreError::Inventory(InventoryError::ZeroDelta)
                | StoreError::Inventory(InventoryError::EmptyName)
                | StoreError::Inventory(InventoryError::QuantityOutOfRange { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// Audit trail entry: every change to a list is an event
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }

    fn for_list(event_type: &str, list: &str, data: serde_json::Value, actor: &str) -> Self {
        Event::new(event_type, "list", list, data, actor)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Open (creating if needed) the list database at `path`.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS lists (
            name TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            next_token INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS list_items (
            list_name TEXT NOT NULL REFERENCES lists(name) ON DELETE CASCADE,
            item_key TEXT NOT NULL,
            code TEXT NOT NULL,
            brand TEXT NOT NULL,
            description TEXT NOT NULL,
            price_cents INTEGER NOT NULL,
            qty INTEGER NOT NULL,
            scale INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (list_name, item_key)
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
        CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);",
    )?;

    Ok(())
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Per-list figures for the list picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    pub name: String,
    pub created: DateTime<Utc>,
    pub lines: usize,
    pub total_qty: i64,
    pub grand_total_cents: i64,
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {:?}: {}", value, e)))
}

fn load_items(conn: &Connection, name: &str) -> Result<BTreeMap<String, LineItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_key, code, brand, description, price_cents, qty, scale
         FROM list_items WHERE list_name = ?1 ORDER BY item_key",
    )?;

    let rows = stmt.query_map(params![name], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, bool>(6)?,
        ))
    })?;

    let mut items = BTreeMap::new();
    for row in rows {
        let (key, code, brand, description, price_cents, qty, scale) = row?;
        let code = CanonicalCode::new(code)
            .map_err(|e| StoreError::Corrupt(format!("list {:?} line {:?}: {}", name, key, e)))?;
        let price_cents = u64::try_from(price_cents)
            .map_err(|_| StoreError::Corrupt(format!("negative price on line {:?}", key)))?;

        items.insert(
            key,
            LineItem {
                code,
                brand,
                description,
                price: Price::from_cents(price_cents),
                qty,
                scale,
            },
        );
    }

    Ok(items)
}

/// Load one list with all its lines.
pub fn load_list(conn: &Connection, name: &str) -> Result<Option<InventoryList>> {
    let header = conn
        .query_row(
            "SELECT name, created_at, next_token FROM lists WHERE name = ?1",
            params![name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((name, created_at, next_token)) = header else {
        return Ok(None);
    };

    let items = load_items(conn, &name)?;
    Ok(Some(InventoryList {
        created: parse_time(&created_at)?,
        next_token: next_token.max(1) as u64,
        items,
        name,
    }))
}

/// List names, ordered.
pub fn list_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM lists ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Every list, ordered by name.
pub fn load_all_lists(conn: &Connection) -> Result<Vec<InventoryList>> {
    let names = list_names(conn)?;

    let mut lists = Vec::with_capacity(names.len());
    for name in names {
        if let Some(list) = load_list(conn, &name)? {
            lists.push(list);
        }
    }
    Ok(lists)
}

pub fn list_summaries(conn: &Connection) -> Result<Vec<ListSummary>> {
    Ok(load_all_lists(conn)?
        .into_iter()
        .map(|list| ListSummary {
            lines: list.len(),
            total_qty: list.total_qty(),
            grand_total_cents: list.grand_total_cents(),
            created: list.created,
            name: list.name,
        })
        .collect())
}

/// Write a list back wholesale. Call inside a transaction.
fn save_list(conn: &Connection, list: &InventoryList) -> Result<()> {
    conn.execute(
        "UPDATE lists SET next_token = ?2 WHERE name = ?1",
        params![list.name, list.next_token as i64],
    )?;
    conn.execute(
        "DELETE FROM list_items WHERE list_name = ?1",
        params![list.name],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO list_items (list_name, item_key, code, brand, description, price_cents, qty, scale)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (key, item) in list.lines() {
        let price_cents = i64::try_from(item.price.cents()).map_err(|_| {
            StoreError::Corrupt(format!("price out of range on line {:?}", key))
        })?;
        stmt.execute(params![
            list.name,
            key,
            item.code.as_str(),
            item.brand,
            item.description,
            price_cents,
            item.qty,
            item.scale,
        ])?;
    }

    Ok(())
}

// ============================================================================
// LIST OPERATIONS
// ============================================================================

pub fn create_list(conn: &Connection, name: &str) -> Result<InventoryList> {
    let list = InventoryList::new(name)?;

    let result = conn.execute(
        "INSERT INTO lists (name, created_at, next_token) VALUES (?1, ?2, ?3)",
        params![list.name, list.created.to_rfc3339(), list.next_token as i64],
    );

    match result {
        Ok(_) => {
            tracing::info!(list = %list.name, "list created");
            Ok(list)
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::ListExists(list.name))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete one list and its lines. Returns the number of lines dropped.
pub fn delete_list(conn: &mut Connection, name: &str, actor: &str) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let lines = tx.execute("DELETE FROM list_items WHERE list_name = ?1", params![name])?;
    let deleted = tx.execute("DELETE FROM lists WHERE name = ?1", params![name])?;
    if deleted == 0 {
        return Err(StoreError::ListNotFound(name.to_string()));
    }

    insert_event(
        &tx,
        &Event::for_list("list_deleted", name, serde_json::json!({ "lines": lines }), actor),
    )?;
    tx.commit()?;

    tracing::info!(list = name, lines, "list deleted");
    Ok(lines)
}

/// Delete every list. Returns how many lists were removed.
pub fn delete_all_lists(conn: &mut Connection, actor: &str) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute("DELETE FROM list_items", [])?;
    let deleted = tx.execute("DELETE FROM lists", [])?;

    insert_event(
        &tx,
        &Event::new(
            "all_lists_deleted",
            "list",
            "*",
            serde_json::json!({ "lists": deleted }),
            actor,
        ),
    )?;
    tx.commit()?;

    tracing::info!(lists = deleted, "all lists deleted");
    Ok(deleted)
}

/// Resolve a raw scan and count it into a list.
///
/// The barcode is resolved before touching the database, so an empty or
/// over-long code never opens a transaction.
pub fn record_scan<L>(
    conn: &mut Connection,
    catalogue: &L,
    list_name: &str,
    raw_code: &str,
    manual: &ManualDetails,
    delta: i64,
    actor: &str,
) -> Result<(ResolvedItem, ScanOutcome)>
where
    L: CatalogueLookup + ?Sized,
{
    let resolved = resolve(raw_code, catalogue)?;
    if delta == 0 {
        return Err(InventoryError::ZeroDelta.into());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut list =
        load_list(&tx, list_name)?.ok_or_else(|| StoreError::ListNotFound(list_name.to_string()))?;

    let outcome = list.apply_scan(&resolved, manual, delta)?;
    save_list(&tx, &list)?;

    insert_event(
        &tx,
        &Event::for_list(
            "item_counted",
            &list.name,
            serde_json::json!({
                "raw": raw_code,
                "key": outcome.key,
                "code": resolved.code,
                "shape": resolved.shape,
                "delta": delta,
                "qty": outcome.item.qty,
                "price": outcome.item.price,
                "found": resolved.is_found(),
            }),
            actor,
        ),
    )?;
    tx.commit()?;

    tracing::debug!(list = list_name, key = %outcome.key, qty = outcome.item.qty, "scan recorded");
    Ok((resolved, outcome))
}

/// Change the quantity of one existing line (e.g. a single scale sticker).
pub fn adjust_line(
    conn: &mut Connection,
    list_name: &str,
    key: &str,
    delta: i64,
    actor: &str,
) -> Result<ScanOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut list =
        load_list(&tx, list_name)?.ok_or_else(|| StoreError::ListNotFound(list_name.to_string()))?;

    let outcome = list.adjust_line(key, delta)?;
    save_list(&tx, &list)?;

    insert_event(
        &tx,
        &Event::for_list(
            "line_adjusted",
            &list.name,
            serde_json::json!({ "key": key, "delta": delta, "qty": outcome.item.qty }),
            actor,
        ),
    )?;
    tx.commit()?;

    Ok(outcome)
}

/// What the counting screen needs before the quantity is entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemLookup {
    pub resolved: ResolvedItem,

    /// Details previously typed on this list for an item the catalogue lacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<LineItem>,
}

pub fn lookup_for_list<L>(
    conn: &Connection,
    catalogue: &L,
    list_name: &str,
    raw_code: &str,
) -> Result<ItemLookup>
where
    L: CatalogueLookup + ?Sized,
{
    let resolved = resolve(raw_code, catalogue)?;
    let list =
        load_list(conn, list_name)?.ok_or_else(|| StoreError::ListNotFound(list_name.to_string()))?;

    let previous = if resolved.is_found() || resolved.is_scale() {
        None
    } else {
        list.previous_details(&resolved.code).cloned()
    };

    Ok(ItemLookup { resolved, previous })
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (event_id, timestamp, event_type, entity_type, entity_id, data, actor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![entity_type, entity_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (event_id, timestamp, event_type, entity_type, entity_id, data, actor) = row?;
        events.push(Event {
            event_id,
            timestamp: parse_time(&timestamp)?,
            event_type,
            entity_type,
            entity_id,
            data: serde_json::from_str(&data)?,
            actor,
        });
    }

    Ok(events)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{Catalogue, CatalogueEntry};
    use crate::inventory::MAX_QTY;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn catalogue() -> Catalogue {
        Catalogue::from_entries(vec![CatalogueEntry {
            code: CanonicalCode::new("0061414100003").unwrap(),
            brand: "Acme".to_string(),
            description: "Peanut Butter".to_string(),
            price: Price::from_cents(499),
            subdept: "Grocery".to_string(),
        }])
    }

    #[test]
    fn test_create_and_load_list() {
        let conn = test_db();
        create_list(&conn, "Aisle 4").unwrap();

        let list = load_list(&conn, "Aisle 4").unwrap().unwrap();
        assert_eq!(list.name, "Aisle 4");
        assert!(list.is_empty());
        assert_eq!(list.next_token, 1);
        assert!(load_list(&conn, "Nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_list_rejected() {
        let conn = test_db();
        create_list(&conn, "Aisle 4").unwrap();
        assert!(matches!(
            create_list(&conn, "Aisle 4"),
            Err(StoreError::ListExists(_))
        ));
        assert!(matches!(
            create_list(&conn, "  "),
            Err(StoreError::Inventory(InventoryError::EmptyName))
        ));
    }

    #[test]
    fn test_record_scan_merges_and_persists() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Aisle 4").unwrap();

        let manual = ManualDetails::new(Some("Ignored".to_string()), None, None);
        record_scan(&mut conn, &cat, "Aisle 4", "614141000036", &manual, 2, "test").unwrap();
        let (resolved, outcome) =
            record_scan(&mut conn, &cat, "Aisle 4", "0061414100003", &manual, 1, "test").unwrap();

        assert!(resolved.is_found());
        assert_eq!(outcome.item.qty, 3);

        let list = load_list(&conn, "Aisle 4").unwrap().unwrap();
        assert_eq!(list.len(), 1);
        let line = list.get("0061414100003").unwrap();
        assert_eq!(line.brand, "Acme");
        assert_eq!(line.price, Price::from_cents(499));
    }

    #[test]
    fn test_scale_token_survives_reload() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Deli").unwrap();

        let none = ManualDetails::default();
        let (_, a) = record_scan(&mut conn, &cat, "Deli", "27088050707", &none, 1, "test").unwrap();
        let (_, b) = record_scan(&mut conn, &cat, "Deli", "27088050707", &none, 1, "test").unwrap();

        assert_eq!(a.key, "2708805000000-0707-1");
        assert_eq!(b.key, "2708805000000-0707-2");

        let list = load_list(&conn, "Deli").unwrap().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.next_token, 3);
        assert!(list.get(&a.key).unwrap().scale);
    }

    #[test]
    fn test_record_scan_errors() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Aisle 4").unwrap();
        let none = ManualDetails::default();

        let empty = record_scan(&mut conn, &cat, "Aisle 4", "  ", &none, 1, "test").unwrap_err();
        assert!(matches!(empty, StoreError::Barcode(BarcodeError::EmptyCode)));
        assert!(empty.is_user_error());

        let missing = record_scan(&mut conn, &cat, "Nope", "1", &none, 1, "test").unwrap_err();
        assert!(matches!(missing, StoreError::ListNotFound(_)));
        assert!(!missing.is_user_error());

        let zero = record_scan(&mut conn, &cat, "Aisle 4", "1", &none, 0, "test").unwrap_err();
        assert!(matches!(zero, StoreError::Inventory(InventoryError::ZeroDelta)));
    }

    #[test]
    fn test_largest_line_round_trips() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Backroom").unwrap();

        let manual = ManualDetails::new(
            Some("Bulk".to_string()),
            None,
            Some(Price::parse("999999.99").unwrap()),
        );
        record_scan(&mut conn, &cat, "Backroom", "4006381333931", &manual, MAX_QTY, "test").unwrap();

        let list = load_list(&conn, "Backroom").unwrap().unwrap();
        let line = list.get("4006381333931").unwrap();
        assert_eq!(line.price.cents(), Price::MAX_CENTS);
        assert_eq!(line.qty, MAX_QTY);
        assert_eq!(line.total_cents(), 99_999_999 * 1_000_000_000);

        let summaries = list_summaries(&conn).unwrap();
        assert_eq!(summaries[0].grand_total_cents, 99_999_999 * 1_000_000_000);
    }

    #[test]
    fn test_oversized_delta_leaves_store_readable() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Aisle 4").unwrap();
        let none = ManualDetails::default();

        record_scan(&mut conn, &cat, "Aisle 4", "614141000036", &none, 1, "test").unwrap();
        let err = record_scan(
            &mut conn,
            &cat,
            "Aisle 4",
            "614141000036",
            &none,
            100_000_000_000_000_000,
            "test",
        )
        .unwrap_err();
        assert!(err.is_user_error());
        assert!(matches!(
            err,
            StoreError::Inventory(InventoryError::QuantityOutOfRange { .. })
        ));

        let err = adjust_line(&mut conn, "Aisle 4", "0061414100003", i64::MAX, "test").unwrap_err();
        assert!(err.is_user_error());

        let summaries = list_summaries(&conn).unwrap();
        assert_eq!(summaries[0].total_qty, 1);
        assert_eq!(summaries[0].grand_total_cents, 499);
    }

    #[test]
    fn test_save_refuses_price_beyond_storage() {
        let conn = test_db();
        let mut list = create_list(&conn, "Aisle 4").unwrap();
        list.items.insert(
            "4006381333931".to_string(),
            LineItem {
                code: CanonicalCode::new("4006381333931").unwrap(),
                brand: String::new(),
                description: String::new(),
                price: Price::from_cents(u64::MAX),
                qty: 1,
                scale: false,
            },
        );

        assert!(matches!(save_list(&conn, &list), Err(StoreError::Corrupt(_))));
        assert!(list_summaries(&conn).is_ok());
    }

    #[test]
    fn test_adjust_and_remove_line() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Deli").unwrap();

        let none = ManualDetails::default();
        let (_, scan) = record_scan(&mut conn, &cat, "Deli", "27088050707", &none, 1, "test").unwrap();
        let outcome = adjust_line(&mut conn, "Deli", &scan.key, -1, "test").unwrap();

        assert!(outcome.removed);
        assert!(load_list(&conn, "Deli").unwrap().unwrap().is_empty());
        assert!(matches!(
            adjust_line(&mut conn, "Deli", &scan.key, 1, "test"),
            Err(StoreError::Inventory(InventoryError::LineNotFound(_)))
        ));
    }

    #[test]
    fn test_lookup_prefills_manual_details() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Backroom").unwrap();

        let manual = ManualDetails::new(
            Some("Stabilo".to_string()),
            Some("Highlighter".to_string()),
            Some(Price::from_cents(125)),
        );
        record_scan(&mut conn, &cat, "Backroom", "4006381333931", &manual, 1, "test").unwrap();

        let lookup = lookup_for_list(&conn, &cat, "Backroom", "4006381333931").unwrap();
        assert!(lookup.resolved.entry.is_none());
        assert_eq!(lookup.previous.unwrap().brand, "Stabilo");

        let known = lookup_for_list(&conn, &cat, "Backroom", "614141000036").unwrap();
        assert!(known.previous.is_none());
        assert!(known.resolved.is_found());
    }

    #[test]
    fn test_delete_lists() {
        let mut conn = test_db();
        create_list(&conn, "A").unwrap();
        create_list(&conn, "B").unwrap();
        create_list(&conn, "C").unwrap();

        delete_list(&mut conn, "A", "test").unwrap();
        assert!(matches!(
            delete_list(&mut conn, "A", "test"),
            Err(StoreError::ListNotFound(_))
        ));
        assert_eq!(list_summaries(&conn).unwrap().len(), 2);

        assert_eq!(delete_all_lists(&mut conn, "test").unwrap(), 2);
        assert!(load_all_lists(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_summaries_and_events() {
        let mut conn = test_db();
        let cat = catalogue();
        create_list(&conn, "Aisle 4").unwrap();

        let none = ManualDetails::default();
        record_scan(&mut conn, &cat, "Aisle 4", "614141000036", &none, 2, "scanner-1").unwrap();

        let summaries = list_summaries(&conn).unwrap();
        assert_eq!(summaries[0].lines, 1);
        assert_eq!(summaries[0].total_qty, 2);
        assert_eq!(summaries[0].grand_total_cents, 998);

        let events = get_events_for_entity(&conn, "list", "Aisle 4").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "item_counted");
        assert_eq!(events[0].actor, "scanner-1");
        assert_eq!(events[0].data["key"], "0061414100003");
    }
}
