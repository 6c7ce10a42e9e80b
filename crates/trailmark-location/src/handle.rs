//! Subscription handles and raw samples

use serde::{Deserialize, Serialize};
use std::fmt;
use trailmark_util::LatLon;

/// Opaque handle to an active sample subscription
///
/// Created by the provider on `subscribe` and handed back on `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A position fix as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub latitude: f64,
    pub longitude: f64,

    /// Provider fix time in epoch milliseconds, if it reports one.
    /// Used for throttling only; recorded points carry the receipt time.
    #[serde(default, alias = "timestamp")]
    pub fix_time: Option<i64>,
}

impl RawSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            fix_time: None,
        }
    }

    pub fn at(latitude: f64, longitude: f64, fix_time: i64) -> Self {
        Self {
            latitude,
            longitude,
            fix_time: Some(fix_time),
        }
    }
}

impl LatLon for RawSample {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}
