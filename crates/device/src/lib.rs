//! Device-side trust and authorization protocol for a Motorist car.
//!
//! A [`Car`] authorizes every state-changing request against an
//! [`Entity`](motorist_identity::Entity) derived from a verified peer
//! certificate, bootstraps its symmetric key over RSA-OAEP key
//! transport, keeps configuration confidential with the field-level
//! codec, and maintains a signed append-only chain of custody for
//! firmware installs and mechanic test attestations. Custody records
//! are re-verified every time they are read.

pub mod car;
pub mod custody;
pub mod error;
pub mod records;
pub mod source;

pub use car::Car;
pub use custody::{verify_firmware, verify_test, VerifiedFirmware, VerifiedTest};
pub use error::DeviceError;
pub use records::{
    config_key, ConfigRecord, FirmwareRecord, TestRecord, CONFIG_TABLE, FIRMWARE_TABLE, TEST_TABLE,
};
pub use source::FirmwareSource;
