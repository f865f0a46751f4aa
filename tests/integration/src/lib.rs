//! End-to-end tests across the Motorist crates.
//!
//! These exercise the whole trust path: PKI provisioning, peer
//! verification, entity derivation, key bootstrap, protected
//! configuration, and the firmware/test chain of custody.

pub mod test_utils;

#[cfg(test)]
mod custody_tests;
#[cfg(test)]
mod trust_protocol_tests;
