//! Peer certificate verification and claim extraction.
//!
//! Verification walks the chain from the presented leaf to a trust
//! anchor, checking issuer/subject linkage, signatures, and validity
//! windows at every hop. Claim extraction decodes the OtherName
//! subject-alternative-name entries written at issuance; any reader
//! holding the certificate can do it, the CA is not consulted.

use crate::claims::Claim;
use crate::error::IdentityError;
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

const MAX_CHAIN_DEPTH: usize = 4;

/// Trust anchors and known intermediates for peer verification.
#[derive(Debug, Default)]
pub struct TrustStore {
    roots: Vec<Vec<u8>>,
    intermediates: Vec<Vec<u8>>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a DER-encoded trust anchor.
    pub fn add_root(&mut self, cert_der: Vec<u8>) {
        self.roots.push(cert_der);
    }

    /// Add a DER-encoded intermediate available for chain building.
    pub fn add_intermediate(&mut self, cert_der: Vec<u8>) {
        self.intermediates.push(cert_der);
    }
}

/// Outcome of successful peer verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPeer {
    /// The leaf's RFC-822 subject alternative name
    pub email: String,
    /// Claims embedded in the leaf
    pub claims: Vec<Claim>,
    /// The verified leaf certificate, DER
    pub cert_der: Vec<u8>,
}

/// Verify a peer's leaf certificate against the trust store.
///
/// The leaf must be currently valid, carry the client-auth extended
/// key usage, and chain through known intermediates to a root. There
/// is no partial result; any failure rejects the peer.
pub fn verify_peer(store: &TrustStore, cert_der: &[u8]) -> Result<VerifiedPeer, IdentityError> {
    let (_, leaf) = X509Certificate::from_der(cert_der)
        .map_err(|e| IdentityError::VerificationFailed(format!("leaf parse failure: {e}")))?;

    if !leaf.validity().is_valid() {
        return Err(IdentityError::VerificationFailed(
            "leaf certificate is outside its validity window".to_string(),
        ));
    }
    require_client_auth(&leaf)?;
    chain_to_root(store, cert_der, 0)?;

    let email = subject_email(&leaf)?;
    let claims = leaf_claims(&leaf);
    debug!(subject = %email, claims = claims.len(), "peer certificate verified");

    Ok(VerifiedPeer {
        email,
        claims,
        cert_der: cert_der.to_vec(),
    })
}

/// The single RFC-822 subject alternative name of a certificate.
pub fn extract_subject_email(cert_der: &[u8]) -> Result<String, IdentityError> {
    let cert = parse(cert_der)?;
    subject_email(&cert)
}

/// The claim value tagged by `oid`, with its kind prefix stripped.
pub fn extract_claim(cert_der: &[u8], oid: &[u64]) -> Result<Option<String>, IdentityError> {
    let cert = parse(cert_der)?;
    Ok(leaf_claims(&cert)
        .into_iter()
        .find(|claim| claim.oid() == oid)
        .map(|claim| claim.value().to_string()))
}

/// All claims embedded in a certificate. Unknown OtherName entries are
/// skipped.
pub fn claims_of(cert_der: &[u8]) -> Result<Vec<Claim>, IdentityError> {
    let cert = parse(cert_der)?;
    Ok(leaf_claims(&cert))
}

/// The certificate's SubjectPublicKeyInfo, DER-encoded, for detached
/// signature verification.
pub fn leaf_public_key_der(cert_der: &[u8]) -> Result<Vec<u8>, IdentityError> {
    let cert = parse(cert_der)?;
    Ok(cert.public_key().raw.to_vec())
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>, IdentityError> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| IdentityError::CertificateEncoding(e.to_string()))
}

fn require_client_auth(leaf: &X509Certificate<'_>) -> Result<(), IdentityError> {
    let eku = leaf
        .extended_key_usage()
        .map_err(|e| IdentityError::VerificationFailed(e.to_string()))?;
    match eku {
        Some(eku) if eku.value.client_auth || eku.value.any => Ok(()),
        _ => Err(IdentityError::VerificationFailed(
            "leaf certificate lacks the client-auth extended key usage".to_string(),
        )),
    }
}

fn chain_to_root(store: &TrustStore, der: &[u8], depth: usize) -> Result<(), IdentityError> {
    if depth > MAX_CHAIN_DEPTH {
        return Err(IdentityError::VerificationFailed(
            "certificate chain too deep".to_string(),
        ));
    }
    let (_, current) = X509Certificate::from_der(der)
        .map_err(|e| IdentityError::VerificationFailed(format!("chain parse failure: {e}")))?;

    for root_der in &store.roots {
        if let Ok((_, root)) = X509Certificate::from_der(root_der) {
            if root.validity().is_valid() && signed_by(&current, &root) {
                return Ok(());
            }
        }
    }
    for intermediate_der in &store.intermediates {
        if let Ok((_, intermediate)) = X509Certificate::from_der(intermediate_der) {
            if intermediate.validity().is_valid() && signed_by(&current, &intermediate) {
                return chain_to_root(store, intermediate_der, depth + 1);
            }
        }
    }

    Err(IdentityError::VerificationFailed(
        "no trusted issuer for certificate".to_string(),
    ))
}

fn signed_by(child: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    child.issuer().as_raw() == issuer.subject().as_raw()
        && child.verify_signature(Some(issuer.public_key())).is_ok()
}

fn subject_email(cert: &X509Certificate<'_>) -> Result<String, IdentityError> {
    let san = cert
        .subject_alternative_name()
        .map_err(|e| IdentityError::CertificateEncoding(e.to_string()))?;
    if let Some(san) = san {
        for name in &san.value.general_names {
            if let GeneralName::RFC822Name(email) = name {
                return Ok((*email).to_string());
            }
        }
    }
    Err(IdentityError::MissingEmail)
}

fn leaf_claims(cert: &X509Certificate<'_>) -> Vec<Claim> {
    let Ok(Some(san)) = cert.subject_alternative_name() else {
        return Vec::new();
    };
    san.value
        .general_names
        .iter()
        .filter_map(|name| match name {
            GeneralName::OtherName(oid, data) => {
                let components: Vec<u64> = oid.iter()?.collect();
                let payload = other_name_utf8(data)?;
                Claim::from_oid_payload(&components, &payload)
            }
            _ => None,
        })
        .collect()
}

/// Decode the UTF8String payload of an OtherName value, unwrapping the
/// `[0] EXPLICIT` tag when present.
fn other_name_utf8(data: &[u8]) -> Option<String> {
    let (class, constructed, tag, value, _) = read_tlv(data)?;
    let (class, tag, value) = if class == 2 && constructed && tag == 0 {
        let (inner_class, _, inner_tag, inner_value, _) = read_tlv(value)?;
        (inner_class, inner_tag, inner_value)
    } else {
        (class, tag, value)
    };
    if class != 0 || tag != 12 {
        return None;
    }
    String::from_utf8(value.to_vec()).ok()
}

fn read_tlv(input: &[u8]) -> Option<(u8, bool, u32, &[u8], &[u8])> {
    if input.len() < 2 {
        return None;
    }
    let first = input[0];
    let class = first >> 6;
    let constructed = (first & 0b0010_0000) != 0;
    let tag = u32::from(first & 0b0001_1111);
    // high-tag-number form never appears in these payloads
    if tag == 0b0001_1111 {
        return None;
    }

    let mut idx = 1;
    let len_byte = input[idx];
    idx += 1;
    let len = if len_byte & 0x80 == 0 {
        usize::from(len_byte)
    } else {
        let num = usize::from(len_byte & 0x7f);
        if num == 0 || num > 4 || idx + num > input.len() {
            return None;
        }
        let mut len = 0usize;
        for i in 0..num {
            len = (len << 8) | usize::from(input[idx + i]);
        }
        idx += num;
        len
    };

    if idx + len > input.len() {
        return None;
    }
    Some((
        class,
        constructed,
        tag,
        &input[idx..idx + len],
        &input[idx + len..],
    ))
}
