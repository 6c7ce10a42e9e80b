//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trailmark_location::Accuracy;

use crate::DistanceMode;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Live tracking settings
    #[serde(default)]
    pub tracking: RawTrackingConfig,

    /// Session history storage settings
    #[serde(default)]
    pub storage: RawStorageConfig,
}

/// Tracking settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTrackingConfig {
    /// Requested fix accuracy (default: high)
    pub accuracy: Option<Accuracy>,

    /// Minimum time between fixes in milliseconds (default: 1000)
    pub min_interval_ms: Option<u64>,

    /// Minimum movement between fixes in meters (default: 5)
    pub min_distance_m: Option<f64>,

    /// How the running distance is maintained (default: full)
    pub distance_mode: Option<DistanceMode>,
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorageConfig {
    /// Directory holding the session database
    pub data_dir: Option<PathBuf>,

    /// Key the session list is stored under
    pub storage_key: Option<String>,
}
