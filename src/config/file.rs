//! JSON configuration document
//!
//! ```json
//! {
//!   "config": {
//!     "wait_for_registration": 30,
//!     "valid_ping_time": 15.0,
//!     "signal_threshold": -70
//!   }
//! }
//! ```

use crate::error::{AppError, Result};
use crate::models::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level shape of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub config: ThresholdSection,
}

/// Qualification thresholds and timing overrides.
///
/// Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSection {
    pub wait_for_registration: u64,
    pub valid_ping_time: f64,
    #[serde(default)]
    pub signal_threshold: Option<i32>,
    #[serde(default)]
    pub poll_interval: Option<u64>,
    #[serde(default)]
    pub settle_delay: Option<u64>,
    #[serde(default)]
    pub post_test_delay: Option<u64>,
    #[serde(default)]
    pub ping_count: Option<u32>,
}

impl ConfigDocument {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| AppError::config(format!("Invalid config document: {}", e)))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        Self::from_json(&content)
            .map_err(|e| AppError::config(format!("{} ({})", e, path.display())))
    }

    /// Load `path` when it exists. A missing file is only an error when the
    /// user named it explicitly.
    pub fn load_optional(path: &Path, explicit: bool) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else if explicit {
            Err(AppError::config(format!("Config file {} does not exist", path.display())))
        } else {
            Ok(None)
        }
    }

    /// Copy the document's values over `config`
    pub fn apply_to(&self, config: &mut Config) {
        let section = &self.config;
        config.wait_for_registration = Some(section.wait_for_registration);
        config.valid_ping_time_ms = Some(section.valid_ping_time);

        if let Some(signal) = section.signal_threshold {
            config.signal_threshold_dbm = signal;
        }
        if let Some(secs) = section.poll_interval {
            config.timing.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = section.settle_delay {
            config.timing.settle_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = section.post_test_delay {
            config.timing.post_test_delay = Duration::from_secs(secs);
        }
        if let Some(count) = section.ping_count {
            config.timing.ping_count = count;
        }
    }
}
