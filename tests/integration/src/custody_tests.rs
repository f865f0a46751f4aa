//! Firmware and test-attestation chain of custody, driven by
//! certificate-derived identities.

use crate::test_utils::Fleet;
use motorist_crypto::sign;
use motorist_device::DeviceError;
use motorist_identity::derive_entity;
use serde_json::json;

fn bootstrapped(fleet: &Fleet) -> (motorist_identity::Entity, motorist_identity::Entity) {
    let owner = derive_entity(&fleet.owner_leaf.cert_der).unwrap();
    let mechanic = derive_entity(&fleet.mechanic_leaf.cert_der).unwrap();
    let (_, wrapped) = fleet.wrapped_car_key();
    fleet.car.bootstrap_key(&owner, &wrapped).unwrap();
    (owner, mechanic)
}

#[test]
fn firmware_custody_across_maintenance_session() {
    let fleet = Fleet::provision();
    let (owner, mechanic) = bootstrapped(&fleet);

    let manufacturer_key = fleet.manufacturer_leaf.private_key().unwrap();
    let signature = sign(&manufacturer_key, "fw-v2").unwrap();

    // maintenance off: rejected regardless of role and signature
    assert!(matches!(
        fleet.car.update_firmware(&mechanic, "fw-v2", &signature),
        Err(DeviceError::MaintenanceOff)
    ));

    fleet.car.set_maintenance_mode(&owner, true).unwrap();
    fleet.car.update_firmware(&mechanic, "fw-v2", &signature).unwrap();
    fleet.car.set_maintenance_mode(&owner, false).unwrap();

    let current = fleet.car.current_firmware().unwrap().unwrap();
    assert!(current.verified);
    assert_eq!(current.record.payload, "fw-v2");
}

#[test]
fn mechanic_signed_firmware_is_not_manufacturer_firmware() {
    let fleet = Fleet::provision();
    let (owner, mechanic) = bootstrapped(&fleet);
    fleet.car.set_maintenance_mode(&owner, true).unwrap();

    let mechanic_key = fleet.mechanic_leaf.private_key().unwrap();
    let signature = sign(&mechanic_key, "fw-rogue").unwrap();
    assert!(matches!(
        fleet.car.update_firmware(&mechanic, "fw-rogue", &signature),
        Err(DeviceError::InvalidSignature)
    ));
}

#[test]
fn test_attestations_survive_mechanic_rotation() {
    let fleet = Fleet::provision();
    let (owner, mechanic) = bootstrapped(&fleet);
    fleet.car.set_maintenance_mode(&owner, true).unwrap();

    // first mechanic attests
    let first_key = fleet.mechanic_leaf.private_key().unwrap();
    let payload = "brakes: pass";
    fleet
        .car
        .record_test_result(
            &mechanic,
            payload,
            &sign(&first_key, payload).unwrap(),
            &fleet.mechanic_leaf.cert_der,
        )
        .unwrap();

    // a different mechanic, issued later, attests next
    let second_leaf = fleet
        .intermediate
        .issue_leaf(motorist_identity::LeafRequest {
            subject: "motorist-mechanic-2".to_string(),
            email: "mechanic-2@fleet.motorist.example".to_string(),
            dns_names: Vec::new(),
            claims: vec![motorist_identity::Claim::Role("mechanic".to_string())],
            extended_key_usages: vec![motorist_identity::ExtendedKeyUsagePurpose::ClientAuth],
        })
        .unwrap();
    let second = derive_entity(&second_leaf.cert_der).unwrap();
    let payload2 = "suspension: pass";
    fleet
        .car
        .record_test_result(
            &second,
            payload2,
            &sign(&second_leaf.private_key().unwrap(), payload2).unwrap(),
            &second_leaf.cert_der,
        )
        .unwrap();

    // both verify against their own attesting certificates
    let all = fleet.car.all_tests_verified().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|t| t.verified));
    assert_eq!(all[0].record.payload, "suspension: pass");
}

#[test]
fn mechanic_draft_workflow() {
    let fleet = Fleet::provision();
    let (owner, mechanic) = bootstrapped(&fleet);
    fleet.car.set_maintenance_mode(&owner, true).unwrap();

    let draft = json!({"ac": "serviced", "note": "filter replaced"})
        .as_object()
        .cloned()
        .unwrap();
    fleet.car.update_mechanic_draft(&mechanic, draft.clone()).unwrap();
    assert_eq!(fleet.car.read_mechanic_draft(&mechanic).unwrap(), draft);

    fleet.car.set_maintenance_mode(&owner, false).unwrap();
    assert!(matches!(
        fleet.car.read_mechanic_draft(&mechanic),
        Err(DeviceError::MaintenanceOff)
    ));
}
