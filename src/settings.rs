use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::capture::{default_chain, CaptureConfig, EnvironmentCapabilities, StillDevice};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            program: "tesseract".into(),
            args: ["stdin", "stdout", "--psm", "6"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    pub devices: Vec<StillDevice>,
    pub secure_context: bool,
    /// Replaces the built-in fallback chain when set.
    pub configurations: Option<Vec<CaptureConfig>>,
    pub ready_timeout_ms: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            secure_context: true,
            configurations: None,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
        }
    }
}

impl CameraSettings {
    pub fn fallback_chain(&self) -> Vec<CaptureConfig> {
        self.configurations.clone().unwrap_or_else(default_chain)
    }

    pub fn capabilities(&self) -> EnvironmentCapabilities {
        EnvironmentCapabilities {
            secure_context: self.secure_context,
            capture_api_present: !self.devices.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannerSettings {
    pub recognizer: RecognizerSettings,
    pub camera: CameraSettings,
    /// Manufacturer name to base price, layered over the built-in table.
    pub price_overrides: BTreeMap<String, u32>,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ScannerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring unreadable settings at {}: {err}", path.display());
                ScannerSettings::default()
            })
        } else {
            ScannerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn scanner(&self) -> Result<ScannerSettings> {
        Ok(self.read()?.clone())
    }

    pub fn update_scanner(&self, settings: ScannerSettings) -> Result<()> {
        let mut guard = self.write()?;
        *guard = settings;
        self.persist(&guard)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ScannerSettings>> {
        self.data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ScannerSettings>> {
        self.data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn persist(&self, data: &ScannerSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FacingMode;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.scanner().unwrap();
        assert_eq!(settings.recognizer.program, "tesseract");
        assert_eq!(settings.camera.fallback_chain(), default_chain());
        assert!(!settings.camera.capabilities().capture_api_present);
    }

    #[test]
    fn updates_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.scanner().unwrap();
        settings.camera.devices.push(StillDevice {
            facing: FacingMode::Environment,
            path: "/tmp/plate.png".into(),
        });
        settings.price_overrides.insert("Tesla".into(), 52_000);
        store.update_scanner(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.scanner().unwrap(), settings);
        assert!(reopened.scanner().unwrap().camera.capabilities().capture_api_present);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"camera":{"secureContext":false}}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().scanner().unwrap();
        assert!(!settings.camera.secure_context);
        assert_eq!(settings.camera.ready_timeout_ms, DEFAULT_READY_TIMEOUT_MS);
        assert_eq!(settings.recognizer, RecognizerSettings::default());
    }

    #[test]
    fn corrupt_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.scanner().unwrap(), ScannerSettings::default());
    }
}
