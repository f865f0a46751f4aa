//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from the primitive adapters.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD key is not 16, 24 or 32 bytes long
    #[error("Invalid AEAD key length: {len} (expected 16, 24 or 32 bytes)")]
    InvalidKeyLength { len: usize },

    /// AEAD nonce is not 12 bytes long
    #[error("Invalid AEAD nonce length: {len} (expected 12 bytes)")]
    InvalidNonceLength { len: usize },

    /// Ciphertext failed tag verification
    #[error("AEAD authentication failed")]
    AuthenticationFailed,

    /// RSA-OAEP encryption/decryption failure
    #[error("Asymmetric operation failed: {0}")]
    Asymmetric(String),

    /// RSA-PSS signing failure
    #[error("Signing failed: {0}")]
    Signature(String),

    /// Key generation or encoding failure
    #[error("Key handling error: {0}")]
    Key(String),

    /// Document value (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the field-level codec, naming the offending field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Target field is missing or not shaped as `{nonce, ciphertext}`
    #[error("Field '{0}' is missing or not a valid protected field")]
    InvalidShape(String),

    /// Target field failed AEAD tag verification
    #[error("Authentication failed for field '{0}'")]
    AuthenticationFailed(String),

    /// Underlying primitive failure unrelated to a single field's shape
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
