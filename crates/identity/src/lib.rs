//! Certificate authority and identity attributes for the Motorist
//! fleet.
//!
//! This crate issues the fleet PKI (root CA, intermediate CA, leaf
//! certificates for cars, owners, mechanics and the manufacturer),
//! embeds role and ownership claims as OtherName subject-alternative-
//! name entries, verifies peer certificates against a trust store, and
//! derives the ephemeral [`Entity`] the device layer authorizes
//! against.
//!
//! Certificate signatures are RSA PKCS#1 v1.5 / SHA-256; detached data
//! signatures elsewhere in the system are RSA-PSS and never pass
//! through this crate.

pub mod ca;
pub mod claims;
pub mod entity;
pub mod error;
pub mod verify;

pub use ca::{CertificateAuthority, LeafIdentity, LeafRequest, DEFAULT_ROOT_VALIDITY_DAYS};
pub use claims::{Claim, CAR_OWNER_CLAIM_OID, ROLE_CLAIM_OID};
pub use entity::{derive_entity, Entity, Role};
pub use error::{IdentityError, IdentityResult};
pub use verify::{
    claims_of, extract_claim, extract_subject_email, leaf_public_key_der, verify_peer, TrustStore,
    VerifiedPeer,
};

// Callers build `LeafRequest`s with rcgen's extended key usage enum.
pub use rcgen::ExtendedKeyUsagePurpose;
