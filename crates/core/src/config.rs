//! Configuration management for a Motorist device process.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for one car device process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub car: CarSection,
    pub store: StoreSection,
    pub trust: TrustSection,
}

/// Identity of the car served by this process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarSection {
    pub car_id: String,
    pub owner_id: String,
    /// Path to the default configuration document (JSON).
    pub default_config_path: String,
}

/// Persistence backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// SQLite database path.
    pub path: String,
}

/// Provisioned key and certificate material locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustSection {
    /// Directory holding the provisioned PEM files for this device.
    pub key_store_dir: String,
    /// Trust anchor certificate (PEM).
    pub root_ca_path: String,
    /// Manufacturer certificate used to verify firmware signatures (PEM).
    pub manufacturer_cert_path: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            car: CarSection {
                car_id: "1".to_string(),
                owner_id: "1".to_string(),
                default_config_path: "config/default-car.json".to_string(),
            },
            store: StoreSection {
                path: "data/motorist-car.db".to_string(),
            },
            trust: TrustSection {
                key_store_dir: "key_store/car1".to_string(),
                root_ca_path: "key_store/ca.crt".to_string(),
                manufacturer_cert_path: "key_store/manufacturer.crt".to_string(),
            },
        }
    }
}
