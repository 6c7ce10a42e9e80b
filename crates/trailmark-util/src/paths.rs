//! Default paths for trailmark
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/trailmark/config.toml` or `~/.config/trailmark/config.toml`
//! - Data: `$XDG_DATA_HOME/trailmark` or `~/.local/share/trailmark`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const TRAILMARK_DATA_DIR_ENV: &str = "TRAILMARK_DATA_DIR";

/// Environment variable for overriding the config file path
pub const TRAILMARK_CONFIG_ENV: &str = "TRAILMARK_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "trailmark";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "trailmark.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$TRAILMARK_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/trailmark/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/trailmark/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(TRAILMARK_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$TRAILMARK_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/trailmark` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/trailmark` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TRAILMARK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the TRAILMARK_DATA_DIR env var.
fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_contains_app_name() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("trailmark"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }
}
