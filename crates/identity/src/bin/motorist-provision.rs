//! Provision the fleet PKI for one car.
//!
//! Generates root CA → intermediate CA → car, owner, mechanic and
//! manufacturer identities and writes the PEM files into a key-store
//! directory:
//!
//! ```text
//! motorist-provision [OUT_DIR] [CAR_ID] [OWNER_ID]
//! ```
//!
//! Defaults come from `motorist_core::Config::default_config()`.

use anyhow::Context;
use motorist_core::Config;
use motorist_identity::{
    CertificateAuthority, Claim, ExtendedKeyUsagePurpose, LeafIdentity, LeafRequest,
    DEFAULT_ROOT_VALIDITY_DAYS,
};
use std::fs;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    motorist_core::logging::init();

    let defaults = Config::default_config();
    let mut args = std::env::args().skip(1);
    let out_dir = args.next().unwrap_or_else(|| "key_store".to_string());
    let car_id = args.next().unwrap_or(defaults.car.car_id);
    let owner_id = args.next().unwrap_or(defaults.car.owner_id);

    let out = Path::new(&out_dir);
    fs::create_dir_all(out).with_context(|| format!("creating {out_dir}"))?;

    let root = CertificateAuthority::generate_root(DEFAULT_ROOT_VALIDITY_DAYS)?;
    let intermediate = root.generate_intermediate()?;

    let car = intermediate.issue_leaf(LeafRequest {
        subject: format!("motorist-car-{car_id}"),
        email: format!("car-{car_id}@fleet.motorist.example"),
        dns_names: vec![format!("car-{car_id}.fleet.motorist.example")],
        claims: Vec::new(),
        extended_key_usages: vec![ExtendedKeyUsagePurpose::ServerAuth],
    })?;

    let owner = intermediate.issue_leaf(LeafRequest {
        subject: format!("motorist-owner-{owner_id}"),
        email: format!("owner-{owner_id}@fleet.motorist.example"),
        dns_names: Vec::new(),
        claims: vec![
            Claim::Role("user".to_string()),
            Claim::CarOwner(car_id.clone()),
        ],
        extended_key_usages: vec![ExtendedKeyUsagePurpose::ClientAuth],
    })?;

    let mechanic = intermediate.issue_leaf(LeafRequest {
        subject: "motorist-mechanic".to_string(),
        email: "mechanic@fleet.motorist.example".to_string(),
        dns_names: Vec::new(),
        claims: vec![Claim::Role("mechanic".to_string())],
        extended_key_usages: vec![ExtendedKeyUsagePurpose::ClientAuth],
    })?;

    let manufacturer = intermediate.issue_leaf(LeafRequest {
        subject: "motorist-manufacturer".to_string(),
        email: "firmware@motorist.example".to_string(),
        dns_names: Vec::new(),
        claims: Vec::new(),
        extended_key_usages: vec![ExtendedKeyUsagePurpose::ClientAuth],
    })?;

    write_pem(out, "ca.crt", &root.cert_pem())?;
    write_pem(out, "ca.key", &root.key_pem())?;
    write_pem(out, "intermediate.crt", &intermediate.cert_pem())?;
    write_pem(out, "intermediate.key", &intermediate.key_pem())?;
    write_leaf(out, &format!("car{car_id}"), &car)?;
    write_leaf(out, &format!("owner{owner_id}"), &owner)?;
    write_leaf(out, "mechanic", &mechanic)?;
    write_leaf(out, "manufacturer", &manufacturer)?;

    info!(out_dir = %out_dir, car_id = %car_id, owner_id = %owner_id, "key store provisioned");
    Ok(())
}

fn write_leaf(out: &Path, name: &str, leaf: &LeafIdentity) -> anyhow::Result<()> {
    write_pem(out, &format!("{name}.crt"), &leaf.cert_pem)?;
    write_pem(out, &format!("{name}.key"), &leaf.key_pem)?;
    Ok(())
}

fn write_pem(out: &Path, name: &str, pem: &str) -> anyhow::Result<()> {
    let path = out.join(name);
    fs::write(&path, pem).with_context(|| format!("writing {}", path.display()))?;
    info!(file = %path.display(), "wrote");
    Ok(())
}
