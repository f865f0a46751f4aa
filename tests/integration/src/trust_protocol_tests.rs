//! The certificate-to-configuration trust path, end to end.

use crate::test_utils::{Fleet, CAR_ID};
use motorist_crypto::unprotect;
use motorist_device::DeviceError;
use motorist_identity::{
    derive_entity, verify_peer, CertificateAuthority, IdentityError, Role,
    DEFAULT_ROOT_VALIDITY_DAYS,
};
use serde_json::json;

#[test]
fn owner_certificate_drives_a_protected_config_update() {
    let fleet = Fleet::provision();

    // mTLS handshake surrogate: verify the owner's certificate chain
    let peer = verify_peer(&fleet.trust_store, &fleet.owner_leaf.cert_der).unwrap();
    assert_eq!(peer.email, "owner-7@fleet.motorist.example");

    let entity = derive_entity(&peer.cert_der).unwrap();
    assert_eq!(entity.role, Role::User);
    assert!(entity.owns(CAR_ID));

    // key transport and bootstrap
    let (key, wrapped) = fleet.wrapped_car_key();
    fleet.car.bootstrap_key(&entity, &wrapped).unwrap();

    // protected configuration update
    let doc = json!({"x": 1}).as_object().cloned().unwrap();
    fleet.car.update_config(&entity, &doc).unwrap();

    let protected = fleet.car.current_config().unwrap().unwrap();
    let field = protected["x"].as_object().unwrap();
    assert!(field.contains_key("nonce"));
    assert!(field.contains_key("ciphertext"));

    let restored = unprotect(&protected, &key, &["x"]).unwrap();
    assert_eq!(restored["x"], json!(1));
}

#[test]
fn forged_certificate_never_reaches_the_car() {
    let fleet = Fleet::provision();

    let rogue = CertificateAuthority::generate_root(DEFAULT_ROOT_VALIDITY_DAYS).unwrap();
    let forged = rogue
        .issue_leaf(motorist_identity::LeafRequest {
            subject: "motorist-owner-7".to_string(),
            email: "owner-7@fleet.motorist.example".to_string(),
            dns_names: Vec::new(),
            claims: vec![
                motorist_identity::Claim::Role("user".to_string()),
                motorist_identity::Claim::CarOwner(CAR_ID.to_string()),
            ],
            extended_key_usages: vec![motorist_identity::ExtendedKeyUsagePurpose::ClientAuth],
        })
        .unwrap();

    let result = verify_peer(&fleet.trust_store, &forged.cert_der);
    assert!(matches!(result, Err(IdentityError::VerificationFailed(_))));
}

#[test]
fn mechanic_certificate_cannot_bootstrap_or_configure() {
    let fleet = Fleet::provision();
    let mechanic = derive_entity(
        &verify_peer(&fleet.trust_store, &fleet.mechanic_leaf.cert_der)
            .unwrap()
            .cert_der,
    )
    .unwrap();
    assert_eq!(mechanic.role, Role::Mechanic);

    let (_, wrapped) = fleet.wrapped_car_key();
    assert!(matches!(
        fleet.car.bootstrap_key(&mechanic, &wrapped),
        Err(DeviceError::Forbidden)
    ));

    // bootstrap as the owner, then retry as the mechanic
    let owner = derive_entity(&fleet.owner_leaf.cert_der).unwrap();
    fleet.car.bootstrap_key(&owner, &wrapped).unwrap();

    let doc = json!({"x": 1}).as_object().cloned().unwrap();
    assert!(matches!(
        fleet.car.update_config(&mechanic, &doc),
        Err(DeviceError::Forbidden)
    ));
}

#[test]
fn manufacturer_certificate_has_no_role() {
    let fleet = Fleet::provision();
    let result = derive_entity(&fleet.manufacturer_leaf.cert_der);
    assert!(matches!(result, Err(IdentityError::MissingRole)));
}

#[test]
fn battery_meters_across_the_full_protocol() {
    let fleet = Fleet::provision();
    let owner = derive_entity(&fleet.owner_leaf.cert_der).unwrap();
    let (_, wrapped) = fleet.wrapped_car_key();
    fleet.car.bootstrap_key(&owner, &wrapped).unwrap();

    let doc = json!({"x": 1}).as_object().cloned().unwrap();
    for _ in 0..10 {
        fleet.car.update_config(&owner, &doc).unwrap();
    }
    assert_eq!(fleet.car.battery_level().unwrap(), 95);

    fleet.car.charge_battery(&owner).unwrap();
    assert_eq!(fleet.car.battery_level().unwrap(), 100);
}
