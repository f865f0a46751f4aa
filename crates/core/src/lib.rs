//! Core functionality for the Motorist vehicle trust system.
//!
//! This crate provides the plumbing shared by every other crate in the
//! workspace: configuration loading, structured logging initialization,
//! and the append-only record store that backs the device's persisted
//! configuration, firmware and test histories.

pub mod config;
pub mod error;
pub mod logging;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use config::{CarSection, Config, StoreSection, TrustSection};
pub use error::StoreError;
pub use store::{MemoryStore, RecordStore};

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteStore;
