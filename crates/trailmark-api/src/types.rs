//! Location points and tracking sessions

use serde::{Deserialize, Serialize};
use trailmark_util::{LatLon, SessionId};

/// A single recorded position
///
/// `timestamp` is the local receipt time in epoch milliseconds, not the
/// provider's fix time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

impl LocationPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }
}

impl LatLon for LocationPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// One contiguous tracking interval and its recorded path
///
/// Field names serialize in camelCase to match the stored history format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    pub id: SessionId,

    /// Epoch milliseconds when tracking started
    pub start_time: i64,

    /// Epoch milliseconds when tracking stopped; absent while active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,

    /// `end_time - start_time` in milliseconds; absent while active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Path length in meters
    pub distance: f64,

    /// Points in arrival order
    pub path: Vec<LocationPoint>,

    pub is_active: bool,
}

impl TrackingSession {
    /// Create an empty, active session
    pub fn begin(id: SessionId, start_time: i64) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
            duration: None,
            distance: 0.0,
            path: Vec::new(),
            is_active: true,
        }
    }

    /// Whether the session recorded at least one point
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Summary statistics; only available once finalized
    pub fn stats(&self) -> Option<SessionStats> {
        let end_time = self.end_time?;
        Some(self.stats_at(end_time))
    }

    /// Summary statistics as of `now` (epoch milliseconds)
    ///
    /// A finalized session ignores `now`. An active one is measured up to
    /// `now`, never less than zero.
    pub fn stats_at(&self, now: i64) -> SessionStats {
        let end_time = self.end_time.unwrap_or(now.max(self.start_time));
        let duration = self.duration.unwrap_or(end_time - self.start_time);

        let average_speed = if duration > 0 {
            self.distance / (duration as f64 / 1000.0)
        } else {
            0.0
        };

        SessionStats {
            total_distance: self.distance,
            duration,
            start_time: self.start_time,
            end_time,
            average_speed,
        }
    }
}

/// Derived statistics for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Meters
    pub total_distance: f64,
    /// Milliseconds
    pub duration: i64,
    pub start_time: i64,
    pub end_time: i64,
    /// Meters per second
    pub average_speed: f64,
}
