//! Validated configuration structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use trailmark_location::SamplingConfig;
use trailmark_util::default_data_dir;

use crate::schema::{RawConfig, RawStorageConfig, RawTrackingConfig};

/// Key the session list is stored under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "tracking_sessions";

/// How the tracking manager keeps `distance` current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMode {
    /// Sum every segment of the path again on each sample
    #[default]
    #[serde(rename = "full")]
    FullRecompute,
    /// Add only the newest segment to a running total
    #[serde(rename = "incremental")]
    Incremental,
}

/// Validated configuration ready for use
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            tracking: TrackingConfig::from_raw(raw.tracking),
            storage: StorageConfig::from_raw(raw.storage),
        }
    }
}

/// Tracking configuration
#[derive(Debug, Clone, Default)]
pub struct TrackingConfig {
    pub sampling: SamplingConfig,
    pub distance_mode: DistanceMode,
}

impl TrackingConfig {
    fn from_raw(raw: RawTrackingConfig) -> Self {
        let defaults = SamplingConfig::default();
        Self {
            sampling: SamplingConfig {
                accuracy: raw.accuracy.unwrap_or(defaults.accuracy),
                min_interval: raw
                    .min_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.min_interval),
                min_distance_m: raw.min_distance_m.unwrap_or(defaults.min_distance_m),
            },
            distance_mode: raw.distance_mode.unwrap_or_default(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub storage_key: String,
}

impl StorageConfig {
    fn from_raw(raw: RawStorageConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            storage_key: raw
                .storage_key
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::from_raw(RawStorageConfig::default())
    }
}
