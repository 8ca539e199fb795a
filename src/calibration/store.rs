//! Durable persistence of task profiles, keyed by hardware fingerprint
//! (spec §4.7, `CalibrationStore`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::FingerprintMismatchPolicy;
use crate::event_bus::HardwareFingerprint;

/// A serializable snapshot of one [`super::profile::TaskProfile`]'s
/// learned parameters, keyed by a stable task name (task identities
/// themselves are per-session slot-map keys and aren't stable across
/// process restarts).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub baseline_ns: f64,
    pub cost_per_unit_ns: f64,
    pub work_units: f64,
}

/// The durable, JSON-shaped record persisted to disk (spec §4.7,
/// "durable key→blob storage (JSON-shaped records)").
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibrationRecord {
    fingerprint: HardwareFingerprint,
    profiles: HashMap<String, ProfileSnapshot>,
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("failed to read calibration store at {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to write calibration store at {0}: {1}")]
    Write(PathBuf, std::io::Error),
    #[error("failed to parse calibration store at {0}: {1}")]
    Parse(PathBuf, serde_json::Error),
    #[error("failed to serialize calibration record: {0}")]
    Serialize(serde_json::Error),
}

/// Loads and saves task-profile snapshots across process runs (spec
/// §4.7). A driver-version mismatch against the stored record's
/// fingerprint is either tolerated (`WarnAndLoad`, logging a warning) or
/// rejected (`Discard`, starting cold) per [`FingerprintMismatchPolicy`].
pub struct CalibrationStore {
    path: PathBuf,
    mismatch_policy: FingerprintMismatchPolicy,
}

impl CalibrationStore {
    pub fn new(path: impl Into<PathBuf>, mismatch_policy: FingerprintMismatchPolicy) -> Self {
        Self { path: path.into(), mismatch_policy }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile snapshots matching `fingerprint`, per spec §4.7:
    /// "On `ApplicationInitialized` with a `DeviceMetadata` event, the
    /// store loads the matching record". Returns an empty map (cold
    /// start) if no file exists yet.
    pub fn load(&self, fingerprint: &HardwareFingerprint) -> Result<HashMap<String, ProfileSnapshot>, CalibrationError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(&self.path).map_err(|e| CalibrationError::Read(self.path.clone(), e))?;
        let record: CalibrationRecord =
            serde_json::from_slice(&bytes).map_err(|e| CalibrationError::Parse(self.path.clone(), e))?;

        if record.fingerprint.vendor_id == fingerprint.vendor_id
            && record.fingerprint.device_id == fingerprint.device_id
            && record.fingerprint.driver_version != fingerprint.driver_version
        {
            match self.mismatch_policy {
                FingerprintMismatchPolicy::WarnAndLoad => {
                    warn!(
                        "calibration store driver version mismatch: stored {}, current {} — loading anyway",
                        record.fingerprint.driver_version, fingerprint.driver_version
                    );
                }
                FingerprintMismatchPolicy::Discard => {
                    return Ok(HashMap::new());
                }
            }
        } else if record.fingerprint != *fingerprint {
            // Different GPU entirely: always start cold.
            return Ok(HashMap::new());
        }

        Ok(record.profiles)
    }

    /// Save the current profile snapshots, per spec §4.7: "On
    /// `ApplicationShuttingDown`, it saves the updated profiles."
    pub fn save(
        &self,
        fingerprint: &HardwareFingerprint,
        profiles: HashMap<String, ProfileSnapshot>,
    ) -> Result<(), CalibrationError> {
        let record = CalibrationRecord { fingerprint: fingerprint.clone(), profiles };
        let bytes = serde_json::to_vec_pretty(&record).map_err(CalibrationError::Serialize)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| CalibrationError::Write(self.path.clone(), e))?;
            }
        }
        fs::write(&self.path, bytes).map_err(|e| CalibrationError::Write(self.path.clone(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(driver: &str) -> HardwareFingerprint {
        HardwareFingerprint { vendor_id: 0x10DE, device_id: 0x2504, driver_version: driver.to_string() }
    }

    #[test]
    fn round_trips_profiles_through_a_temp_file() {
        let dir = std::env::temp_dir().join(format!("vixen-calib-test-{}", std::process::id()));
        let path = dir.join("profiles.json");
        let store = CalibrationStore::new(path.clone(), FingerprintMismatchPolicy::WarnAndLoad);

        let mut profiles = HashMap::new();
        profiles.insert("shadow_pass".to_string(), ProfileSnapshot { baseline_ns: 100.0, cost_per_unit_ns: 5.0, work_units: 4.0 });
        store.save(&fingerprint("535.154.05"), profiles.clone()).unwrap();

        let loaded = store.load(&fingerprint("535.154.05")).unwrap();
        assert_eq!(loaded.get("shadow_pass").unwrap().baseline_ns, 100.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn driver_mismatch_discards_when_policy_is_discard() {
        let dir = std::env::temp_dir().join(format!("vixen-calib-test-mismatch-{}", std::process::id()));
        let path = dir.join("profiles.json");
        let store = CalibrationStore::new(path.clone(), FingerprintMismatchPolicy::Discard);

        let mut profiles = HashMap::new();
        profiles.insert("shadow_pass".to_string(), ProfileSnapshot { baseline_ns: 1.0, cost_per_unit_ns: 1.0, work_units: 1.0 });
        store.save(&fingerprint("535.154.05"), profiles).unwrap();

        let loaded = store.load(&fingerprint("540.00.01")).unwrap();
        assert!(loaded.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_yields_cold_start() {
        let store = CalibrationStore::new("/tmp/vixen-calib-definitely-missing.json", FingerprintMismatchPolicy::WarnAndLoad);
        let loaded = store.load(&fingerprint("1.0")).unwrap();
        assert!(loaded.is_empty());
    }
}
