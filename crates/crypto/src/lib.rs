//! Cryptographic primitives and the field-level codec for Motorist.
//!
//! This crate is the single place where cipher and signature primitives
//! are touched. Everything above it works with opaque key handles and
//! typed errors.
//!
//! # Capabilities
//!
//! - **AEAD**: ChaCha20-Poly1305 (32-byte keys) and AES-GCM (16/24-byte
//!   keys) with 96-bit nonces
//! - **Signatures**: RSA-PSS over SHA-256 digests, base64-encoded
//! - **Key transport**: RSA-OAEP (SHA-256) for wrapping device keys
//! - **Field codec**: selective authenticated encryption of named fields
//!   of a JSON document
//!
//! # Security notes
//!
//! - All verification failures surface as `false` or a typed error,
//!   never a panic
//! - Key material is handled through opaque types and is never logged

pub mod aead;
pub mod asymmetric;
pub mod codec;
pub mod error;

pub use aead::{aead_decrypt, aead_encrypt, generate_key, generate_nonce, KEY_SIZE, NONCE_SIZE};
pub use asymmetric::{
    asymmetric_decrypt, asymmetric_encrypt, generate_keypair, sign, verify, verify_with_spki,
    DEFAULT_KEY_BITS,
};
pub use codec::{check, protect, unprotect, Document, ProtectedField};
pub use error::{CryptoError, FieldError};
