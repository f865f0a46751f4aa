//! Append-only keyed record store.
//!
//! The device's persisted facets (configurations, firmware history,
//! mechanic test attestations) are append-only sequences of JSON records
//! keyed by a logical table name and a record key. The store exposes
//! exactly three operations: append, latest-by-key, and all-by-key
//! (newest first). Nothing is ever updated or deleted.
//!
//! Two backends implement the trait: [`MemoryStore`] for tests and the
//! SQLite-backed store in [`crate::sqlite_store`] for deployment. Each
//! call is atomic; multi-call sequences are not transactional, so readers
//! must always take the latest record rather than rely on a write
//! acknowledgment.

use crate::error::StoreError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Append-only keyed store contract.
///
/// Implementations must serialize concurrent calls internally; callers
/// share a store across threads via `Arc<dyn RecordStore>`.
pub trait RecordStore: Send + Sync {
    /// Append one record under `(table, key)`.
    fn insert(&self, table: &str, key: &str, record: Value) -> Result<(), StoreError>;

    /// The most recently appended record for `(table, key)`, if any.
    fn latest(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Every record for `(table, key)`, newest first.
    fn all(&self, table: &str, key: &str) -> Result<Vec<Value>, StoreError>;
}

/// In-memory store backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(String, String), Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, table: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        rows.entry((table.to_string(), key.to_string()))
            .or_default()
            .push(record);
        Ok(())
    }

    fn latest(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .get(&(table.to_string(), key.to_string()))
            .and_then(|seq| seq.last().cloned()))
    }

    fn all(&self, table: &str, key: &str) -> Result<Vec<Value>, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .get(&(table.to_string(), key.to_string()))
            .map(|seq| seq.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
