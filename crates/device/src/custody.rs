//! Chain-of-custody verification for firmware and test records.
//!
//! Records are re-verified every time they are read; a record that
//! verified at write time buys nothing at read time. Audit reads
//! annotate each record with its verification outcome and never filter
//! failing records out. A tampered log entry is evidence, not noise.

use crate::records::{FirmwareRecord, TestRecord};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use motorist_crypto::verify_with_spki;
use motorist_identity::leaf_public_key_der;

/// A firmware record with its read-time verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFirmware {
    pub record: FirmwareRecord,
    pub verified: bool,
}

/// A test record with its read-time verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTest {
    pub record: TestRecord,
    pub verified: bool,
}

/// Check a firmware record's signature against the manufacturer
/// certificate. Any decoding failure counts as unverified.
pub fn verify_firmware(manufacturer_cert_der: &[u8], record: &FirmwareRecord) -> bool {
    match leaf_public_key_der(manufacturer_cert_der) {
        Ok(spki) => verify_with_spki(&spki, &record.payload, &record.signature),
        Err(_) => false,
    }
}

/// Check a test record's signature against its own stored attesting
/// certificate. Mechanics rotate; each record carries its signer.
pub fn verify_test(record: &TestRecord) -> bool {
    let Ok(cert_der) = BASE64.decode(&record.attesting_cert) else {
        return false;
    };
    match leaf_public_key_der(&cert_der) {
        Ok(spki) => verify_with_spki(&spki, &record.payload, &record.signature),
        Err(_) => false,
    }
}
