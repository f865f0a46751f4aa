//! Error types for certificate authority and identity operations.

use thiserror::Error;

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Peer certificate failed chain or policy verification
    #[error("Certificate verification failed: {0}")]
    VerificationFailed(String),

    /// Certificate carries no RFC-822 subject alternative name
    #[error("Certificate carries no RFC-822 subject alternative name")]
    MissingEmail,

    /// Certificate carries no role claim
    #[error("Certificate carries no role claim")]
    MissingRole,

    /// Role claim payload names no known role
    #[error("Unknown role claim: {0}")]
    UnknownRole(String),

    /// Certificate or key material could not be decoded
    #[error("Certificate encoding error: {0}")]
    CertificateEncoding(String),

    /// Certificate issuance failed
    #[error("Certificate issuance failed: {0}")]
    Issuance(String),
}

impl From<rcgen::Error> for IdentityError {
    fn from(err: rcgen::Error) -> Self {
        IdentityError::Issuance(err.to_string())
    }
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
