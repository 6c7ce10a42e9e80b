//! Sampling policy requested from a provider

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trailmark_util::haversine_distance;

use crate::RawSample;

/// Requested fix accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Lowest,
    Low,
    Balanced,
    #[default]
    High,
    Highest,
}

/// Options passed to `LocationProvider::subscribe`
///
/// A provider may withhold fixes that arrive sooner than `min_interval` or
/// closer than `min_distance_m` to the last delivered fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub accuracy: Accuracy,
    pub min_interval: Duration,
    pub min_distance_m: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_interval: Duration::from_millis(1000),
            min_distance_m: 5.0,
        }
    }
}

/// Applies a `SamplingConfig`'s thresholds to a stream of fixes
///
/// The first fix always passes. After that a fix passes only if it is at
/// least `min_interval` after and `min_distance_m` away from the last fix
/// that passed. Fixes without a provider time skip the interval check.
#[derive(Debug, Clone)]
pub struct SampleThrottle {
    config: SamplingConfig,
    last: Option<RawSample>,
}

impl SampleThrottle {
    pub fn new(config: SamplingConfig) -> Self {
        Self { config, last: None }
    }

    /// Returns `true` if the sample should be delivered
    pub fn admit(&mut self, sample: &RawSample) -> bool {
        let Some(last) = &self.last else {
            self.last = Some(*sample);
            return true;
        };

        let interval_ok = match (last.fix_time, sample.fix_time) {
            (Some(prev), Some(cur)) => {
                cur.saturating_sub(prev) >= self.config.min_interval.as_millis() as i64
            }
            _ => true,
        };
        let distance_ok = haversine_distance(last, sample) >= self.config.min_distance_m;

        if interval_ok && distance_ok {
            self.last = Some(*sample);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let config = SamplingConfig::default();
        assert_eq!(config.accuracy, Accuracy::High);
        assert_eq!(config.min_interval, Duration::from_secs(1));
        assert_eq!(config.min_distance_m, 5.0);
    }

    #[test]
    fn first_sample_always_passes() {
        let mut throttle = SampleThrottle::new(SamplingConfig::default());
        assert!(throttle.admit(&RawSample::at(0.0, 0.0, 0)));
    }

    #[test]
    fn drops_samples_too_soon() {
        let mut throttle = SampleThrottle::new(SamplingConfig::default());
        assert!(throttle.admit(&RawSample::at(0.0, 0.0, 0)));
        // ~111 m away but only 500 ms later
        assert!(!throttle.admit(&RawSample::at(0.0, 0.001, 500)));
        assert!(throttle.admit(&RawSample::at(0.0, 0.001, 1_000)));
    }

    #[test]
    fn drops_samples_too_close() {
        let mut throttle = SampleThrottle::new(SamplingConfig::default());
        assert!(throttle.admit(&RawSample::at(0.0, 0.0, 0)));
        // ~1.1 m away
        assert!(!throttle.admit(&RawSample::at(0.0, 0.00001, 5_000)));
        assert!(throttle.admit(&RawSample::at(0.0, 0.0001, 6_000)));
    }

    #[test]
    fn untimed_samples_only_check_distance() {
        let mut throttle = SampleThrottle::new(SamplingConfig::default());
        assert!(throttle.admit(&RawSample::new(0.0, 0.0)));
        assert!(throttle.admit(&RawSample::new(0.0, 0.001)));
        assert!(!throttle.admit(&RawSample::new(0.0, 0.001)));
    }
}
