//! Authenticated encryption adapter.
//!
//! ChaCha20-Poly1305 is the primary cipher, selected for 32-byte keys;
//! 16- and 24-byte keys map to AES-128-GCM and AES-192-GCM so the
//! documented key-length contract holds for every accepted length.
//! Nonces are always 96 bits and are drawn from the OS CSPRNG when not
//! supplied by the caller.

use crate::error::CryptoError;
use aes_gcm::aead::consts::U12;
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, AesGcm};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};

/// AEAD nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Preferred AEAD key size in bytes.
pub const KEY_SIZE: usize = 32;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Cipher instance selected by key length.
enum AeadCipher {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    ChaCha(Box<ChaCha20Poly1305>),
}

impl AeadCipher {
    fn from_key(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(|c| Self::Aes128(Box::new(c)))
                .map_err(|e| CryptoError::Key(e.to_string())),
            24 => Aes192Gcm::new_from_slice(key)
                .map(|c| Self::Aes192(Box::new(c)))
                .map_err(|e| CryptoError::Key(e.to_string())),
            32 => ChaCha20Poly1305::new_from_slice(key)
                .map(|c| Self::ChaCha(Box::new(c)))
                .map_err(|e| CryptoError::Key(e.to_string())),
            len => Err(CryptoError::InvalidKeyLength { len }),
        }
    }

    fn encrypt(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::aead::Error> {
        match self {
            Self::Aes128(c) => c.encrypt(nonce, plaintext),
            Self::Aes192(c) => c.encrypt(nonce, plaintext),
            Self::ChaCha(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>, aes_gcm::aead::Error> {
        match self {
            Self::Aes128(c) => c.decrypt(nonce, ciphertext),
            Self::Aes192(c) => c.decrypt(nonce, ciphertext),
            Self::ChaCha(c) => c.decrypt(nonce, ciphertext),
        }
    }
}

fn check_nonce(nonce: &[u8]) -> Result<&Nonce, CryptoError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidNonceLength { len: nonce.len() });
    }
    Ok(Nonce::from_slice(nonce))
}

/// Encrypt `plaintext` under `key` and a 12-byte `nonce`.
///
/// The returned ciphertext carries the authentication tag.
pub fn aead_encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = AeadCipher::from_key(key)?;
    let nonce = check_nonce(nonce)?;
    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Key("AEAD encryption failed".to_string()))
}

/// Decrypt and authenticate `ciphertext`.
///
/// A failed tag check yields [`CryptoError::AuthenticationFailed`];
/// authentication failures are definitive and are never retried.
pub fn aead_decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = AeadCipher::from_key(key)?;
    let nonce = check_nonce(nonce)?;
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Draw a fresh 12-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Draw a fresh 32-byte AEAD key from the OS CSPRNG.
pub fn generate_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}
