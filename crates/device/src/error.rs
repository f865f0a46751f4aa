//! Error types for the device trust protocol.

use motorist_core::StoreError;
use motorist_crypto::{CryptoError, FieldError};
use motorist_identity::IdentityError;
use thiserror::Error;

/// Errors that can occur in car operations.
///
/// The first three variants are the authorization taxonomy; callers
/// mapping to a transport layer must keep them distinguishable.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Entity's role or ownership does not authorize the operation
    #[error("Operation forbidden for this entity")]
    Forbidden,

    /// The car key has not been bootstrapped yet
    #[error("Car key has not been bootstrapped")]
    KeyRequired,

    /// Operation requires maintenance mode to be on
    #[error("Maintenance mode is off")]
    MaintenanceOff,

    /// Firmware signature did not verify against the manufacturer
    #[error("Firmware signature verification failed")]
    InvalidSignature,

    /// Field-level codec failure
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Cryptographic primitive failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Identity or certificate failure
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invariant violation inside the device itself
    #[error("Internal device error: {0}")]
    Internal(String),
}
