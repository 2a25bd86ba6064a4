use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::capture::{BarcodeFormat, CaptureConfig};

pub const DEFAULT_STORAGE_KEY: &str = "shelf_scanner_items";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScannerSettings {
    /// Slot the record list is saved under.
    pub storage_key: String,
    pub debounce_ms: u64,
    pub frame_interval_ms: u64,
    pub detect_timeout_ms: u64,
    /// Symbologies accepted from the detector.
    pub formats: Vec<BarcodeFormat>,
    /// Where CSV exports land; the user's download folder when unset.
    pub export_dir: Option<PathBuf>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            debounce_ms: 1500,
            frame_interval_ms: 16,
            detect_timeout_ms: 2000,
            formats: BarcodeFormat::SHELF_DEFAULTS.to_vec(),
            export_dir: None,
        }
    }
}

impl ScannerSettings {
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            // a zero interval would make tokio's ticker panic
            frame_interval: Duration::from_millis(self.frame_interval_ms.max(1)),
            debounce_window: Duration::from_millis(self.debounce_ms),
            detect_timeout: Duration::from_millis(self.detect_timeout_ms.max(1)),
            formats: if self.formats.is_empty() {
                BarcodeFormat::SHELF_DEFAULTS.to_vec()
            } else {
                self.formats.clone()
            },
        }
    }
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
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            ScannerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> ScannerSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: ScannerSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: ScannerSettings = serde_json::from_str(&contents)?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &ScannerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
