//! Events emitted by the tracking manager

use trailmark_util::SessionId;

use crate::LocationPoint;

/// Events emitted by the tracking manager
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A permission request completed
    PermissionChanged { granted: bool },

    /// A new session began
    TrackingStarted {
        session_id: SessionId,
        start_time: i64,
    },

    /// A sample was appended to the active session
    PointRecorded {
        session_id: SessionId,
        point: LocationPoint,
        distance: f64,
        point_count: usize,
    },

    /// The active session was discarded without finalizing
    TrackingCancelled { session_id: SessionId },
}
