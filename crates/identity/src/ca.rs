//! Certificate authority: root, intermediate and leaf issuance.
//!
//! All certificates use RSA-2048 keys generated by the crypto adapter
//! and are signed with PKCS#1 v1.5 / SHA-256. Leaf certificates embed
//! the subject's RFC-822 email, optional DNS names, and claim
//! OtherName entries in the subject alternative name extension.

use crate::claims::Claim;
use crate::error::IdentityError;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, Ia5String,
    IsCa, KeyPair, KeyUsagePurpose, OtherNameValue, SanType, PKCS_RSA_SHA256,
};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::RsaPrivateKey;
use rustls_pki_types::PrivatePkcs8KeyDer;
use time::{Duration, OffsetDateTime};
use tracing::info;

/// Default validity for a root CA certificate.
pub const DEFAULT_ROOT_VALIDITY_DAYS: i64 = 3650;

const INTERMEDIATE_VALIDITY_DAYS: i64 = 1825;
const LEAF_VALIDITY_DAYS: i64 = 365;
const CLOCK_SKEW_HOURS: i64 = 1;

const ORG: &str = "Motorist Fleet";
const ROOT_CN: &str = "Motorist Root CA";
const INTERMEDIATE_CN: &str = "Motorist Intermediate CA";

/// A signing authority: certificate plus private key, held in memory
/// for the lifetime of a provisioning run.
pub struct CertificateAuthority {
    cert: Certificate,
    key: KeyPair,
    cert_der: Vec<u8>,
    key_der: Vec<u8>,
}

/// Issued leaf identity: certificate and private key in DER and PEM.
pub struct LeafIdentity {
    pub cert_der: Vec<u8>,
    pub key_der: Vec<u8>,
    pub cert_pem: String,
    pub key_pem: String,
}

/// What to put in a leaf certificate.
pub struct LeafRequest {
    /// Subject common name
    pub subject: String,
    /// The single RFC-822 subject alternative name
    pub email: String,
    /// Optional DNS subject alternative names
    pub dns_names: Vec<String>,
    /// Claims embedded as OtherName entries
    pub claims: Vec<Claim>,
    /// Extended key usages (client auth for parties, server auth for cars)
    pub extended_key_usages: Vec<ExtendedKeyUsagePurpose>,
}

impl LeafIdentity {
    /// The subject's RSA private key, decoded from PKCS#8.
    pub fn private_key(&self) -> Result<RsaPrivateKey, IdentityError> {
        RsaPrivateKey::from_pkcs8_der(&self.key_der)
            .map_err(|e| IdentityError::CertificateEncoding(e.to_string()))
    }
}

impl CertificateAuthority {
    /// Generate a self-signed root CA.
    pub fn generate_root(validity_days: i64) -> Result<Self, IdentityError> {
        let mut params = CertificateParams::new(Vec::default())?;
        params.distinguished_name.push(DnType::CommonName, ROOT_CN);
        params.distinguished_name.push(DnType::OrganizationName, ORG);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        set_ca_usages(&mut params);
        set_validity(&mut params, validity_days);

        let (key, key_der) = rsa_signing_key()?;
        let cert = params.self_signed(&key)?;
        let cert_der = cert.der().to_vec();
        info!(subject = ROOT_CN, "generated root CA");

        Ok(Self {
            cert,
            key,
            cert_der,
            key_der,
        })
    }

    /// Generate an intermediate CA signed by this authority.
    ///
    /// Path length zero: the intermediate can sign leaves only.
    pub fn generate_intermediate(&self) -> Result<Self, IdentityError> {
        let mut params = CertificateParams::new(Vec::default())?;
        params
            .distinguished_name
            .push(DnType::CommonName, INTERMEDIATE_CN);
        params.distinguished_name.push(DnType::OrganizationName, ORG);
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        set_ca_usages(&mut params);
        set_validity(&mut params, INTERMEDIATE_VALIDITY_DAYS);

        let (key, key_der) = rsa_signing_key()?;
        let cert = params.signed_by(&key, &self.cert, &self.key)?;
        let cert_der = cert.der().to_vec();
        info!(subject = INTERMEDIATE_CN, "generated intermediate CA");

        Ok(Self {
            cert,
            key,
            cert_der,
            key_der,
        })
    }

    /// Issue a leaf certificate signed by this authority.
    ///
    /// Exactly one email goes into the SAN; callers wanting none or
    /// several have a provisioning error, not an API.
    pub fn issue_leaf(&self, request: LeafRequest) -> Result<LeafIdentity, IdentityError> {
        let mut params = CertificateParams::new(request.dns_names)?;
        params
            .distinguished_name
            .push(DnType::CommonName, &request.subject);
        params.distinguished_name.push(DnType::OrganizationName, ORG);
        params.key_usages.push(KeyUsagePurpose::DigitalSignature);
        params.key_usages.push(KeyUsagePurpose::KeyEncipherment);
        params.extended_key_usages = request.extended_key_usages;
        params.use_authority_key_identifier_extension = true;
        set_validity(&mut params, LEAF_VALIDITY_DAYS);

        params
            .subject_alt_names
            .push(SanType::Rfc822Name(Ia5String::try_from(
                request.email.as_str(),
            )?));
        for claim in &request.claims {
            params.subject_alt_names.push(SanType::OtherName((
                claim.oid().to_vec(),
                OtherNameValue::Utf8String(claim.encoded_payload()),
            )));
        }

        let (key, key_der) = rsa_signing_key()?;
        let cert = params.signed_by(&key, &self.cert, &self.key)?;
        info!(
            subject = %request.subject,
            email = %request.email,
            claims = request.claims.len(),
            "issued leaf certificate"
        );

        Ok(LeafIdentity {
            cert_der: cert.der().to_vec(),
            key_der: key.serialize_der(),
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        })
    }

    /// DER-encoded CA certificate.
    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    /// PEM-encoded CA certificate.
    pub fn cert_pem(&self) -> String {
        self.cert.pem()
    }

    /// PKCS#8 DER private key.
    pub fn key_der(&self) -> &[u8] {
        &self.key_der
    }

    /// PKCS#8 PEM private key.
    pub fn key_pem(&self) -> String {
        self.key.serialize_pem()
    }
}

fn set_ca_usages(params: &mut CertificateParams) {
    params.key_usages.push(KeyUsagePurpose::DigitalSignature);
    params.key_usages.push(KeyUsagePurpose::KeyCertSign);
    params.key_usages.push(KeyUsagePurpose::CrlSign);
}

fn set_validity(params: &mut CertificateParams, days: i64) {
    let now = OffsetDateTime::now_utc();
    params.not_before = now - Duration::hours(CLOCK_SKEW_HOURS);
    params.not_after = now + Duration::days(days);
}

/// Generate an RSA-2048 key and load it as an rcgen signing key.
pub(crate) fn rsa_signing_key() -> Result<(KeyPair, Vec<u8>), IdentityError> {
    let private = motorist_crypto::generate_keypair(motorist_crypto::DEFAULT_KEY_BITS)
        .map_err(|e| IdentityError::Issuance(e.to_string()))?;
    let key_der = private
        .to_pkcs8_der()
        .map_err(|e| IdentityError::Issuance(e.to_string()))?
        .as_bytes()
        .to_vec();
    let pkcs8 = PrivatePkcs8KeyDer::from(key_der.as_slice());
    let key = KeyPair::from_pkcs8_der_and_sign_algo(&pkcs8, &PKCS_RSA_SHA256)?;
    Ok((key, key_der))
}
