//! Field-level authenticated encryption over JSON documents.
//!
//! [`protect`] replaces the values of named top-level fields with
//! `{"nonce": base64, "ciphertext": base64}` objects; [`unprotect`]
//! restores them. Field values are canonically JSON-encoded before
//! encryption (`serde_json`'s map keeps keys sorted), so a protected
//! value decrypts back to the exact original JSON value.

use crate::aead::{aead_decrypt, aead_encrypt, generate_nonce, NONCE_SIZE};
use crate::error::{CryptoError, FieldError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON document: the top-level object whose fields are protected.
pub type Document = serde_json::Map<String, Value>;

/// Encrypted replacement for a document field value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtectedField {
    /// Base64 of the 12-byte AEAD nonce
    pub nonce: String,
    /// Base64 of ciphertext plus tag
    pub ciphertext: String,
}

/// Encrypt the listed fields of `document` in place of their values.
///
/// Fields named in `target_fields` but absent from the document are
/// skipped; all other fields pass through untouched. One nonce is drawn
/// per call and shared by every field it protects.
pub fn protect(
    document: &Document,
    key: &[u8],
    target_fields: &[&str],
) -> Result<Document, CryptoError> {
    let nonce = generate_nonce();
    let mut protected = document.clone();

    for &field in target_fields {
        let Some(value) = document.get(field) else {
            continue;
        };
        let plaintext = serde_json::to_vec(value)?;
        let ciphertext = aead_encrypt(key, &nonce, &plaintext)?;
        let replacement = ProtectedField {
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
        };
        protected.insert(field.to_string(), serde_json::to_value(replacement)?);
    }

    Ok(protected)
}

/// Decrypt the listed fields of `document`, restoring their values.
///
/// Every target field must be present and shaped as a
/// [`ProtectedField`]; the first failing field aborts the whole call.
/// Callers needing partial results must pre-filter `target_fields`.
pub fn unprotect(
    document: &Document,
    key: &[u8],
    target_fields: &[&str],
) -> Result<Document, FieldError> {
    let mut restored = document.clone();

    for &field in target_fields {
        let protected = parse_protected(document, field)?;
        let nonce = decode_exact(&protected.nonce, NONCE_SIZE)
            .ok_or_else(|| FieldError::InvalidShape(field.to_string()))?;
        let ciphertext = BASE64
            .decode(&protected.ciphertext)
            .map_err(|_| FieldError::InvalidShape(field.to_string()))?;

        let plaintext = aead_decrypt(key, &nonce, &ciphertext).map_err(|e| match e {
            CryptoError::AuthenticationFailed => {
                FieldError::AuthenticationFailed(field.to_string())
            }
            other => FieldError::Crypto(other),
        })?;

        let value: Value = serde_json::from_slice(&plaintext)
            .map_err(|e| FieldError::Crypto(CryptoError::Serialization(e)))?;
        restored.insert(field.to_string(), value);
    }

    Ok(restored)
}

/// Integrity probe: `true` iff every target field decrypts cleanly.
pub fn check(document: &Document, key: &[u8], target_fields: &[&str]) -> bool {
    unprotect(document, key, target_fields).is_ok()
}

fn parse_protected(document: &Document, field: &str) -> Result<ProtectedField, FieldError> {
    document
        .get(field)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .ok_or_else(|| FieldError::InvalidShape(field.to_string()))
}

fn decode_exact(b64: &str, len: usize) -> Option<Vec<u8>> {
    let bytes = BASE64.decode(b64).ok()?;
    (bytes.len() == len).then_some(bytes)
}
