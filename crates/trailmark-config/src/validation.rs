//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Upper bound on the sampling interval (ten minutes)
const MAX_INTERVAL_MS: u64 = 10 * 60 * 1000;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("tracking.{field}: {message}")]
    TrackingError { field: &'static str, message: String },

    #[error("storage.{field}: {message}")]
    StorageError { field: &'static str, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let tracking = &config.tracking;

    if let Some(ms) = tracking.min_interval_ms {
        if ms > MAX_INTERVAL_MS {
            errors.push(ValidationError::TrackingError {
                field: "min_interval_ms",
                message: format!("{} exceeds maximum of {}", ms, MAX_INTERVAL_MS),
            });
        }
    }

    if let Some(meters) = tracking.min_distance_m {
        if !meters.is_finite() || meters < 0.0 {
            errors.push(ValidationError::TrackingError {
                field: "min_distance_m",
                message: format!("must be a non-negative number, got {}", meters),
            });
        }
    }

    if let Some(key) = &config.storage.storage_key {
        if key.trim().is_empty() {
            errors.push(ValidationError::StorageError {
                field: "storage_key",
                message: "cannot be empty".into(),
            });
        }
    }

    if let Some(dir) = &config.storage.data_dir {
        if dir.as_os_str().is_empty() {
            errors.push(ValidationError::StorageError {
                field: "data_dir",
                message: "cannot be empty".into(),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> RawConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&parse("config_version = 1")).is_empty());
    }

    #[test]
    fn collects_every_error() {
        let raw = parse(
            r#"
            config_version = 1
            [tracking]
            min_interval_ms = 99999999
            min_distance_m = -3.0
            [storage]
            storage_key = "  "
        "#,
        );

        let errors = validate_config(&raw);
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors[1].to_string(),
            "tracking.min_distance_m: must be a non-negative number, got -3"
        );
    }
}
