//! Persisted record shapes for the car's append-only facets.

use motorist_crypto::Document;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Table of protected configuration documents.
pub const CONFIG_TABLE: &str = "configurations";
/// Table of firmware installations.
pub const FIRMWARE_TABLE: &str = "firmwares";
/// Table of mechanic test attestations.
pub const TEST_TABLE: &str = "mechanic_tests";

/// One accepted configuration update. The document's fields are
/// protected under the car key before it reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigRecord {
    pub car_id: String,
    pub owner_id: String,
    pub document: Document,
    pub inserted_at: u64,
}

/// One installed firmware image, with the manufacturer's detached
/// signature over the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirmwareRecord {
    pub car_id: String,
    pub payload: String,
    /// Base64 RSA-PSS signature by the manufacturer
    pub signature: String,
    pub inserted_at: u64,
}

/// One mechanic test attestation. Stored as presented; verification
/// happens when the record is read back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestRecord {
    pub car_id: String,
    pub payload: String,
    /// Base64 RSA-PSS signature by the attesting mechanic
    pub signature: String,
    /// Base64 DER certificate of the attesting mechanic
    pub attesting_cert: String,
    pub inserted_at: u64,
}

/// Store key for configuration records.
pub fn config_key(car_id: &str, owner_id: &str) -> String {
    format!("{car_id}:{owner_id}")
}

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
