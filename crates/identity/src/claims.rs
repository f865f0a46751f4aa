//! Typed identity claims carried as OtherName subject-alternative-name
//! entries.
//!
//! Each claim kind pairs a private OID with a fixed payload prefix, so
//! any reader that knows the convention can extract a claim without
//! consulting the issuing CA. The payload is a DER UTF8String of
//! `<prefix><value>`.

/// OID tagging a role claim (1.3.6.1.4.1.56741.1.1).
pub const ROLE_CLAIM_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 56741, 1, 1];

/// OID tagging an owned-car claim (1.3.6.1.4.1.56741.1.2).
pub const CAR_OWNER_CLAIM_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 56741, 1, 2];

const ROLE_PREFIX: &str = "motorist-role:";
const CAR_OWNER_PREFIX: &str = "motorist-car:";

/// An identity claim embedded in a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Authorization role of the subject ("user" or "mechanic")
    Role(String),
    /// Identifier of the car the subject owns
    CarOwner(String),
}

struct ClaimKind {
    oid: &'static [u64],
    prefix: &'static str,
    build: fn(String) -> Claim,
}

const CLAIM_KINDS: &[ClaimKind] = &[
    ClaimKind {
        oid: ROLE_CLAIM_OID,
        prefix: ROLE_PREFIX,
        build: Claim::Role,
    },
    ClaimKind {
        oid: CAR_OWNER_CLAIM_OID,
        prefix: CAR_OWNER_PREFIX,
        build: Claim::CarOwner,
    },
];

impl Claim {
    /// The OID tagging this claim kind in a SAN OtherName entry.
    pub fn oid(&self) -> &'static [u64] {
        match self {
            Claim::Role(_) => ROLE_CLAIM_OID,
            Claim::CarOwner(_) => CAR_OWNER_CLAIM_OID,
        }
    }

    /// The bare claim value, without the kind prefix.
    pub fn value(&self) -> &str {
        match self {
            Claim::Role(v) | Claim::CarOwner(v) => v,
        }
    }

    /// The UTF8String payload written into the certificate.
    pub fn encoded_payload(&self) -> String {
        let prefix = match self {
            Claim::Role(_) => ROLE_PREFIX,
            Claim::CarOwner(_) => CAR_OWNER_PREFIX,
        };
        format!("{prefix}{}", self.value())
    }

    /// Rebuild a claim from an OtherName OID and decoded payload.
    ///
    /// Unknown OIDs and payloads missing the expected prefix yield
    /// `None`; readers skip such entries rather than failing.
    pub fn from_oid_payload(oid: &[u64], payload: &str) -> Option<Claim> {
        let kind = CLAIM_KINDS.iter().find(|kind| kind.oid == oid)?;
        let value = payload.strip_prefix(kind.prefix)?;
        Some((kind.build)(value.to_string()))
    }
}
