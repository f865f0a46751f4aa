//! Shared fixture: a provisioned fleet with one car.

use motorist_core::MemoryStore;
use motorist_crypto::{asymmetric_encrypt, generate_key};
use motorist_device::Car;
use motorist_identity::{
    CertificateAuthority, Claim, ExtendedKeyUsagePurpose, LeafIdentity, LeafRequest, TrustStore,
    DEFAULT_ROOT_VALIDITY_DAYS,
};
use rsa::RsaPublicKey;
use serde_json::json;
use std::sync::Arc;

pub const CAR_ID: &str = "7";
pub const OWNER_ID: &str = "7";

/// A fully provisioned fleet: PKI, trust store, and one car backed by
/// an in-memory store.
pub struct Fleet {
    pub trust_store: TrustStore,
    pub car: Car,
    pub car_public: RsaPublicKey,
    pub owner_leaf: LeafIdentity,
    pub mechanic_leaf: LeafIdentity,
    pub manufacturer_leaf: LeafIdentity,
    pub store: Arc<MemoryStore>,
    pub intermediate: CertificateAuthority,
}

impl Fleet {
    pub fn provision() -> Self {
        let root = CertificateAuthority::generate_root(DEFAULT_ROOT_VALIDITY_DAYS).unwrap();
        let intermediate = root.generate_intermediate().unwrap();

        let car_leaf = intermediate
            .issue_leaf(LeafRequest {
                subject: format!("motorist-car-{CAR_ID}"),
                email: format!("car-{CAR_ID}@fleet.motorist.example"),
                dns_names: vec![format!("car-{CAR_ID}.fleet.motorist.example")],
                claims: Vec::new(),
                extended_key_usages: vec![ExtendedKeyUsagePurpose::ServerAuth],
            })
            .unwrap();
        let owner_leaf = intermediate
            .issue_leaf(LeafRequest {
                subject: format!("motorist-owner-{OWNER_ID}"),
                email: format!("owner-{OWNER_ID}@fleet.motorist.example"),
                dns_names: Vec::new(),
                claims: vec![
                    Claim::Role("user".to_string()),
                    Claim::CarOwner(CAR_ID.to_string()),
                ],
                extended_key_usages: vec![ExtendedKeyUsagePurpose::ClientAuth],
            })
            .unwrap();
        let mechanic_leaf = intermediate
            .issue_leaf(LeafRequest {
                subject: "motorist-mechanic".to_string(),
                email: "mechanic@fleet.motorist.example".to_string(),
                dns_names: Vec::new(),
                claims: vec![Claim::Role("mechanic".to_string())],
                extended_key_usages: vec![ExtendedKeyUsagePurpose::ClientAuth],
            })
            .unwrap();
        let manufacturer_leaf = intermediate
            .issue_leaf(LeafRequest {
                subject: "motorist-manufacturer".to_string(),
                email: "firmware@motorist.example".to_string(),
                dns_names: Vec::new(),
                claims: Vec::new(),
                extended_key_usages: vec![ExtendedKeyUsagePurpose::ClientAuth],
            })
            .unwrap();

        let mut trust_store = TrustStore::new();
        trust_store.add_root(root.cert_der().to_vec());
        trust_store.add_intermediate(intermediate.cert_der().to_vec());

        let car_key = car_leaf.private_key().unwrap();
        let car_public = car_key.to_public_key();
        let store = Arc::new(MemoryStore::new());
        let car = Car::new(
            CAR_ID,
            OWNER_ID,
            car_key,
            manufacturer_leaf.cert_der.clone(),
            json!({"ac": "off", "seats": "2"}).as_object().cloned().unwrap(),
            store.clone(),
        );

        Self {
            trust_store,
            car,
            car_public,
            owner_leaf,
            mechanic_leaf,
            manufacturer_leaf,
            store,
            intermediate,
        }
    }

    /// A fresh 32-byte car key, OAEP-wrapped to the car's public key.
    pub fn wrapped_car_key(&self) -> ([u8; 32], String) {
        let key = generate_key();
        let wrapped = asymmetric_encrypt(&self.car_public, &key).unwrap();
        (key, wrapped)
    }
}
