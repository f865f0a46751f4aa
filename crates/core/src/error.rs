//! Core error types

use thiserror::Error;

/// Errors produced by the append-only record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend database failure
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Interior lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}
