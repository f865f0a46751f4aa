//! SQLite-backed append-only record store.
//!
//! Durable backend for [`crate::store::RecordStore`] with:
//! - WAL mode for durability and concurrent readers
//! - Strict append-only semantics (no UPDATE or DELETE paths exist)
//! - Monotone rowids providing the newest-first read ordering

use crate::error::StoreError;
use crate::store::RecordStore;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite store. The connection is guarded by a mutex; each trait call
/// holds the lock for exactly one statement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        info!(path = %path.display(), "Opening record store");

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tbl TEXT NOT NULL,
                key TEXT NOT NULL,
                record TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
            );

            CREATE INDEX IF NOT EXISTS idx_records_tbl_key ON records(tbl, key);
            "#,
        )?;

        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn insert(&self, table: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let text = serde_json::to_string(&record)?;
        conn.execute(
            "INSERT INTO records (tbl, key, record) VALUES (?1, ?2, ?3)",
            params![table, key, text],
        )?;
        Ok(())
    }

    fn latest(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let row: Option<String> = conn
            .query_row(
                "SELECT record FROM records WHERE tbl = ?1 AND key = ?2 ORDER BY id DESC LIMIT 1",
                params![table, key],
                |row| row.get(0),
            )
            .optional()?;

        match row {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn all(&self, table: &str, key: &str) -> Result<Vec<Value>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn
            .prepare("SELECT record FROM records WHERE tbl = ?1 AND key = ?2 ORDER BY id DESC")?;
        let rows = stmt.query_map(params![table, key], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_latest() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert("configurations", "1:1", json!({"v": 1})).unwrap();
        store.insert("configurations", "1:1", json!({"v": 2})).unwrap();

        let latest = store.latest("configurations", "1:1").unwrap().unwrap();
        assert_eq!(latest["v"], 2);
    }

    #[test]
    fn all_orders_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        for v in 0..4 {
            store.insert("firmwares", "7", json!({"v": v})).unwrap();
        }

        let all = store.all("firmwares", "7").unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0]["v"], 3);
        assert_eq!(all[3]["v"], 0);
    }

    #[test]
    fn missing_key_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.latest("firmwares", "none").unwrap().is_none());
        assert!(store.all("firmwares", "none").unwrap().is_empty());
    }
}
