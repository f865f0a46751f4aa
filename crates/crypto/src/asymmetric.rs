//! RSA signing and key-transport adapter.
//!
//! Detached signatures are RSA-PSS over a SHA-256 digest of the data's
//! UTF-8 bytes, MGF1-SHA-256, maximum salt length, base64-encoded.
//! Key transport is RSA-OAEP with SHA-256 and no label. Verification
//! never propagates primitive failures: a bad key, bad base64 or bad
//! signature all come back as `false`.

use crate::error::CryptoError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Default RSA modulus size for provisioned identities.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Generate a fresh RSA private key.
pub fn generate_keypair(bits: usize) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| CryptoError::Key(e.to_string()))
}

/// Maximum PSS salt length for a given modulus: emLen - hLen - 2.
fn max_salt_len(modulus_bits: usize) -> usize {
    let em_len = (modulus_bits - 1).div_ceil(8);
    em_len - <Sha256 as Digest>::output_size() - 2
}

/// Sign `data` with RSA-PSS (SHA-256, maximum salt length).
///
/// Returns the base64-encoded signature.
pub fn sign(key: &RsaPrivateKey, data: &str) -> Result<String, CryptoError> {
    let digest = Sha256::digest(data.as_bytes());
    let padding = Pss::new_with_salt::<Sha256>(max_salt_len(key.n().bits()));
    let signature = key
        .sign_with_rng(&mut OsRng, padding, &digest)
        .map_err(|e| CryptoError::Signature(e.to_string()))?;
    Ok(BASE64.encode(signature))
}

/// Verify a base64 RSA-PSS signature over `data`.
///
/// Any failure, including bad base64, is reported as `false`.
pub fn verify(key: &RsaPublicKey, data: &str, signature_b64: &str) -> bool {
    let Ok(signature) = BASE64.decode(signature_b64) else {
        return false;
    };
    let digest = Sha256::digest(data.as_bytes());
    let padding = Pss::new_with_salt::<Sha256>(max_salt_len(key.n().bits()));
    key.verify(padding, &digest, &signature).is_ok()
}

/// [`verify`] with the public key taken from a DER-encoded
/// SubjectPublicKeyInfo, as embedded in a certificate.
pub fn verify_with_spki(spki_der: &[u8], data: &str, signature_b64: &str) -> bool {
    match RsaPublicKey::from_public_key_der(spki_der) {
        Ok(key) => verify(&key, data, signature_b64),
        Err(_) => false,
    }
}

/// Encrypt `plaintext` to `key` with RSA-OAEP (SHA-256, no label).
///
/// Returns base64 ciphertext, sized for key transport (the plaintext
/// must fit in one OAEP block).
pub fn asymmetric_encrypt(key: &RsaPublicKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let ciphertext = key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
    Ok(BASE64.encode(ciphertext))
}

/// Decrypt base64 RSA-OAEP ciphertext with the private key.
pub fn asymmetric_decrypt(key: &RsaPrivateKey, ciphertext_b64: &str) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
    key.decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .map_err(|e| CryptoError::Asymmetric(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePublicKey;

    fn test_key() -> RsaPrivateKey {
        generate_keypair(DEFAULT_KEY_BITS).unwrap()
    }

    #[test]
    fn sign_verify_round_trip() {
        let key = test_key();
        let public = key.to_public_key();

        let signature = sign(&key, "firmware-7-v1700000000").unwrap();
        assert!(verify(&public, "firmware-7-v1700000000", &signature));
    }

    #[test]
    fn mutated_data_fails_verification() {
        let key = test_key();
        let public = key.to_public_key();

        let signature = sign(&key, "firmware-7-v1").unwrap();
        assert!(!verify(&public, "firmware-7-v1x", &signature));
    }

    #[test]
    fn mutated_signature_fails_verification() {
        let key = test_key();
        let public = key.to_public_key();

        let signature = sign(&key, "firmware-7-v1").unwrap();
        let mut tampered: Vec<char> = signature.chars().collect();
        tampered[7] = if tampered[7] == 'x' { 'y' } else { 'x' };
        let tampered: String = tampered.into_iter().collect();
        assert!(!verify(&public, "firmware-7-v1", &tampered));
    }

    #[test]
    fn garbage_signature_is_false_not_panic() {
        let key = test_key();
        let public = key.to_public_key();
        assert!(!verify(&public, "data", "not-base64!!!"));
        assert!(!verify(&public, "data", ""));
    }

    #[test]
    fn spki_verification_matches_key_verification() {
        let key = test_key();
        let public = key.to_public_key();
        let spki = public.to_public_key_der().unwrap();

        let signature = sign(&key, "attested tests").unwrap();
        assert!(verify_with_spki(spki.as_bytes(), "attested tests", &signature));
        assert!(!verify_with_spki(spki.as_bytes(), "other data", &signature));
        assert!(!verify_with_spki(b"not a key", "attested tests", &signature));
    }

    #[test]
    fn oaep_round_trip() {
        let key = test_key();
        let public = key.to_public_key();

        let wrapped = asymmetric_encrypt(&public, &[7u8; 32]).unwrap();
        let unwrapped = asymmetric_decrypt(&key, &wrapped).unwrap();
        assert_eq!(unwrapped, vec![7u8; 32]);
    }

    #[test]
    fn oaep_wrong_key_fails() {
        let key = test_key();
        let other = test_key();

        let wrapped = asymmetric_encrypt(&key.to_public_key(), &[7u8; 32]).unwrap();
        assert!(asymmetric_decrypt(&other, &wrapped).is_err());
    }
}
