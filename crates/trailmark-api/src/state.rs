//! Live tracking state exposed to the presentation layer

use serde::{Deserialize, Serialize};

use crate::{LocationPoint, TrackingSession};

/// Phase of the tracking state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    /// Nothing in progress; tracking may start if permission is granted
    #[default]
    Idle,
    /// Waiting on the provider's permission prompt
    PermissionPending,
    /// The provider refused location access
    PermissionDenied,
    /// A session is active and receiving samples
    Tracking,
    /// The last session was finalized and is available as `current_session`
    Stopped,
}

/// Snapshot of everything a screen needs to render live tracking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveState {
    pub phase: TrackerPhase,

    /// `None` until a permission request has completed
    pub has_permission: Option<bool>,

    /// Most recent recorded point
    pub current_location: Option<LocationPoint>,

    /// Active session, or the last finalized one
    pub current_session: Option<TrackingSession>,
}

impl LiveState {
    pub fn is_tracking(&self) -> bool {
        self.phase == TrackerPhase::Tracking
    }
}
