//! The car: authorization gates, key bootstrap, configuration,
//! maintenance and the firmware/test chain of custody.
//!
//! All mutable state sits behind one mutex; store calls are atomic per
//! call through the shared [`RecordStore`]. Audit reads go straight to
//! the store and never take the car mutex. Gate order for
//! state-changing operations is fixed: missing key, then maintenance
//! mode, then role/ownership.

use crate::custody::{self, VerifiedFirmware, VerifiedTest};
use crate::error::DeviceError;
use crate::records::{
    config_key, now_unix, ConfigRecord, FirmwareRecord, TestRecord, CONFIG_TABLE, FIRMWARE_TABLE,
    TEST_TABLE,
};
use crate::source::FirmwareSource;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use motorist_core::{RecordStore, StoreError};
use motorist_crypto::{asymmetric_decrypt, protect, CryptoError, Document};
use motorist_identity::{Entity, Role};
use rsa::RsaPrivateKey;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};
use zeroize::Zeroizing;

const FULL_BATTERY: u8 = 100;
const METER_WINDOW: u32 = 10;
const DRAIN_PER_WINDOW: u8 = 5;

/// Mutable car state, guarded by a single mutex.
struct CarState {
    maintenance_mode: bool,
    car_key: Option<Zeroizing<Vec<u8>>>,
    initialized: bool,
    battery_level: u8,
    op_count: u32,
    current_config: Option<Document>,
    mechanic_draft: Option<Document>,
}

/// One vehicle's trust endpoint.
pub struct Car {
    id: String,
    owner_id: String,
    private_key: RsaPrivateKey,
    manufacturer_cert_der: Vec<u8>,
    default_config: Document,
    store: Arc<dyn RecordStore>,
    firmware_source: Option<Arc<dyn FirmwareSource>>,
    state: Mutex<CarState>,
}

impl Car {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        private_key: RsaPrivateKey,
        manufacturer_cert_der: Vec<u8>,
        default_config: Document,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            private_key,
            manufacturer_cert_der,
            default_config,
            store,
            firmware_source: None,
            state: Mutex::new(CarState {
                maintenance_mode: false,
                car_key: None,
                initialized: false,
                battery_level: FULL_BATTERY,
                op_count: 0,
                current_config: None,
                mechanic_draft: None,
            }),
        }
    }

    /// Attach an upstream firmware source for first-boot fetches.
    pub fn with_firmware_source(mut self, source: Arc<dyn FirmwareSource>) -> Self {
        self.firmware_source = Some(source);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Install the car's symmetric key from an RSA-OAEP-wrapped
    /// transport blob. Owner-only. A later bootstrap replaces the key;
    /// last write wins.
    ///
    /// The first successful bootstrap also initializes the car: the
    /// latest stored configuration is loaded, or the default
    /// configuration is protected under the new key and appended as
    /// the first record.
    pub fn bootstrap_key(
        &self,
        entity: &Entity,
        encrypted_key_b64: &str,
    ) -> Result<(), DeviceError> {
        self.require_owner(entity)?;

        let key = asymmetric_decrypt(&self.private_key, encrypted_key_b64)?;
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(DeviceError::Crypto(CryptoError::InvalidKeyLength {
                len: key.len(),
            }));
        }

        let mut state = self.lock()?;
        state.car_key = Some(Zeroizing::new(key));
        if !state.initialized {
            self.complete_init(&mut state)?;
        }
        info!(car_id = %self.id, subject = %entity.email, "car key bootstrapped");
        Ok(())
    }

    /// Finish first-boot initialization under an installed key.
    fn complete_init(&self, state: &mut CarState) -> Result<(), DeviceError> {
        let key = state
            .car_key
            .as_ref()
            .ok_or(DeviceError::KeyRequired)?
            .clone();
        let store_key = config_key(&self.id, &self.owner_id);

        match self.store.latest(CONFIG_TABLE, &store_key)? {
            Some(value) => {
                let record: ConfigRecord = decode(value)?;
                state.current_config = Some(record.document);
            }
            None => {
                let fields: Vec<&str> = self.default_config.keys().map(String::as_str).collect();
                let protected = protect(&self.default_config, &key, &fields)?;
                let record = ConfigRecord {
                    car_id: self.id.clone(),
                    owner_id: self.owner_id.clone(),
                    document: protected.clone(),
                    inserted_at: now_unix(),
                };
                self.store.insert(CONFIG_TABLE, &store_key, encode(&record)?)?;
                state.current_config = Some(protected);
            }
        }
        state.initialized = true;
        info!(car_id = %self.id, "car initialized");
        Ok(())
    }

    /// Switch maintenance mode. Owner-only, key required.
    ///
    /// Entering maintenance snapshots the default configuration as the
    /// mechanic's working draft; leaving discards the draft.
    pub fn set_maintenance_mode(&self, entity: &Entity, on: bool) -> Result<(), DeviceError> {
        let mut state = self.lock()?;
        if state.car_key.is_none() {
            return Err(DeviceError::KeyRequired);
        }
        self.require_owner(entity)?;

        state.maintenance_mode = on;
        state.mechanic_draft = if on {
            Some(self.default_config.clone())
        } else {
            None
        };
        info!(car_id = %self.id, maintenance = on, "maintenance mode switched");
        Ok(())
    }

    /// Replace the mechanic's working draft. Mechanic role, maintenance
    /// on; ownership is not required.
    pub fn update_mechanic_draft(
        &self,
        entity: &Entity,
        document: Document,
    ) -> Result<(), DeviceError> {
        let mut state = self.lock()?;
        if state.car_key.is_none() {
            return Err(DeviceError::KeyRequired);
        }
        if !state.maintenance_mode {
            return Err(DeviceError::MaintenanceOff);
        }
        require_mechanic(entity)?;

        state.mechanic_draft = Some(document);
        Ok(())
    }

    /// Read the mechanic's working draft. Same gates as the update.
    pub fn read_mechanic_draft(&self, entity: &Entity) -> Result<Document, DeviceError> {
        let state = self.lock()?;
        if state.car_key.is_none() {
            return Err(DeviceError::KeyRequired);
        }
        if !state.maintenance_mode {
            return Err(DeviceError::MaintenanceOff);
        }
        require_mechanic(entity)?;

        state
            .mechanic_draft
            .clone()
            .ok_or_else(|| DeviceError::Internal("maintenance on without a draft".to_string()))
    }

    /// Accept a configuration update. Owner-only, key required.
    ///
    /// Every top-level field of the document is protected under the
    /// car key before the record is appended. Every tenth accepted
    /// update drains the battery by five points until empty.
    pub fn update_config(&self, entity: &Entity, document: &Document) -> Result<(), DeviceError> {
        let mut state = self.lock()?;
        let key = state
            .car_key
            .as_ref()
            .ok_or(DeviceError::KeyRequired)?
            .clone();
        self.require_owner(entity)?;

        let fields: Vec<&str> = document.keys().map(String::as_str).collect();
        let protected = protect(document, &key, &fields)?;
        let record = ConfigRecord {
            car_id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            document: protected.clone(),
            inserted_at: now_unix(),
        };
        self.store.insert(
            CONFIG_TABLE,
            &config_key(&self.id, &self.owner_id),
            encode(&record)?,
        )?;
        state.current_config = Some(protected);

        state.op_count += 1;
        if state.op_count >= METER_WINDOW {
            state.op_count = 0;
            if state.battery_level > 0 {
                state.battery_level = state.battery_level.saturating_sub(DRAIN_PER_WINDOW);
            }
        }
        info!(car_id = %self.id, battery = state.battery_level, "configuration updated");
        Ok(())
    }

    /// The latest stored configuration document, fields still
    /// protected.
    pub fn current_config(&self) -> Result<Option<Document>, DeviceError> {
        match self
            .store
            .latest(CONFIG_TABLE, &config_key(&self.id, &self.owner_id))?
        {
            Some(value) => {
                let record: ConfigRecord = decode(value)?;
                Ok(Some(record.document))
            }
            None => Ok(None),
        }
    }

    /// Current battery level, 0..=100.
    pub fn battery_level(&self) -> Result<u8, DeviceError> {
        Ok(self.lock()?.battery_level)
    }

    /// Recharge to full. Owner-only, key required. Also resets the
    /// metering window.
    pub fn charge_battery(&self, entity: &Entity) -> Result<(), DeviceError> {
        let mut state = self.lock()?;
        if state.car_key.is_none() {
            return Err(DeviceError::KeyRequired);
        }
        self.require_owner(entity)?;

        state.battery_level = FULL_BATTERY;
        state.op_count = 0;
        info!(car_id = %self.id, "battery charged");
        Ok(())
    }

    /// Install a firmware image. Key, maintenance on, mechanic role,
    /// in that gate order. The signature must verify against the
    /// manufacturer certificate before anything is persisted.
    pub fn update_firmware(
        &self,
        entity: &Entity,
        payload: &str,
        signature: &str,
    ) -> Result<(), DeviceError> {
        let state = self.lock()?;
        if state.car_key.is_none() {
            return Err(DeviceError::KeyRequired);
        }
        if !state.maintenance_mode {
            return Err(DeviceError::MaintenanceOff);
        }
        require_mechanic(entity)?;

        // guard stays held through the insert: a record can only land
        // while the maintenance session that admitted it is still open
        let record = FirmwareRecord {
            car_id: self.id.clone(),
            payload: payload.to_string(),
            signature: signature.to_string(),
            inserted_at: now_unix(),
        };
        if !custody::verify_firmware(&self.manufacturer_cert_der, &record) {
            warn!(car_id = %self.id, subject = %entity.email, "rejected firmware with bad signature");
            return Err(DeviceError::InvalidSignature);
        }

        self.store.insert(FIRMWARE_TABLE, &self.id, encode(&record)?)?;
        info!(car_id = %self.id, "firmware installed");
        Ok(())
    }

    /// Record a mechanic test attestation. Key and maintenance on.
    ///
    /// The record is persisted as presented, signature unchecked; the
    /// read path is the trust boundary. An attestation that fails to
    /// verify later is evidence of tampering and must stay in the log.
    pub fn record_test_result(
        &self,
        entity: &Entity,
        payload: &str,
        signature: &str,
        attesting_cert_der: &[u8],
    ) -> Result<(), DeviceError> {
        let state = self.lock()?;
        if state.car_key.is_none() {
            return Err(DeviceError::KeyRequired);
        }
        if !state.maintenance_mode {
            return Err(DeviceError::MaintenanceOff);
        }

        // guard stays held through the insert, as in update_firmware
        let record = TestRecord {
            car_id: self.id.clone(),
            payload: payload.to_string(),
            signature: signature.to_string(),
            attesting_cert: BASE64.encode(attesting_cert_der),
            inserted_at: now_unix(),
        };
        self.store.insert(TEST_TABLE, &self.id, encode(&record)?)?;
        info!(car_id = %self.id, subject = %entity.email, "test attestation recorded");
        Ok(())
    }

    /// The latest firmware record, re-verified at read time.
    ///
    /// With no local history and a configured [`FirmwareSource`], the
    /// car fetches from upstream, verifies, persists, and returns the
    /// result. An upstream image that fails verification is rejected
    /// and not persisted.
    pub fn current_firmware(&self) -> Result<Option<VerifiedFirmware>, DeviceError> {
        if let Some(value) = self.store.latest(FIRMWARE_TABLE, &self.id)? {
            let record: FirmwareRecord = decode(value)?;
            let verified = custody::verify_firmware(&self.manufacturer_cert_der, &record);
            return Ok(Some(VerifiedFirmware { record, verified }));
        }

        let Some(source) = &self.firmware_source else {
            return Ok(None);
        };
        let (payload, signature) = source
            .fetch(&self.id)
            .map_err(|e| DeviceError::Internal(format!("firmware fetch failed: {e}")))?;
        let record = FirmwareRecord {
            car_id: self.id.clone(),
            payload,
            signature,
            inserted_at: now_unix(),
        };
        if !custody::verify_firmware(&self.manufacturer_cert_der, &record) {
            warn!(car_id = %self.id, "upstream firmware failed verification");
            return Err(DeviceError::InvalidSignature);
        }
        self.store.insert(FIRMWARE_TABLE, &self.id, encode(&record)?)?;
        info!(car_id = %self.id, "firmware fetched from upstream");
        Ok(Some(VerifiedFirmware {
            record,
            verified: true,
        }))
    }

    /// Every firmware record, newest first, each re-verified.
    pub fn all_firmware_verified(&self) -> Result<Vec<VerifiedFirmware>, DeviceError> {
        self.store
            .all(FIRMWARE_TABLE, &self.id)?
            .into_iter()
            .map(|value| {
                let record: FirmwareRecord = decode(value)?;
                let verified = custody::verify_firmware(&self.manufacturer_cert_der, &record);
                Ok(VerifiedFirmware { record, verified })
            })
            .collect()
    }

    /// The latest test attestation, re-verified against its stored
    /// attesting certificate.
    pub fn latest_test(&self) -> Result<Option<VerifiedTest>, DeviceError> {
        match self.store.latest(TEST_TABLE, &self.id)? {
            Some(value) => {
                let record: TestRecord = decode(value)?;
                let verified = custody::verify_test(&record);
                Ok(Some(VerifiedTest { record, verified }))
            }
            None => Ok(None),
        }
    }

    /// Every test attestation, newest first, each re-verified.
    pub fn all_tests_verified(&self) -> Result<Vec<VerifiedTest>, DeviceError> {
        self.store
            .all(TEST_TABLE, &self.id)?
            .into_iter()
            .map(|value| {
                let record: TestRecord = decode(value)?;
                let verified = custody::verify_test(&record);
                Ok(VerifiedTest { record, verified })
            })
            .collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, CarState>, DeviceError> {
        self.state
            .lock()
            .map_err(|_| DeviceError::Internal("car state mutex poisoned".to_string()))
    }

    fn require_owner(&self, entity: &Entity) -> Result<(), DeviceError> {
        if entity.role == Role::User && entity.owns(&self.id) {
            Ok(())
        } else {
            Err(DeviceError::Forbidden)
        }
    }
}

fn require_mechanic(entity: &Entity) -> Result<(), DeviceError> {
    if entity.role == Role::Mechanic {
        Ok(())
    } else {
        Err(DeviceError::Forbidden)
    }
}

fn encode<T: serde::Serialize>(record: &T) -> Result<Value, DeviceError> {
    serde_json::to_value(record).map_err(|e| DeviceError::Store(StoreError::from(e)))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, DeviceError> {
    serde_json::from_value(value).map_err(|e| DeviceError::Store(StoreError::from(e)))
}
