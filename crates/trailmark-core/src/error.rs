//! Tracking errors

use thiserror::Error;
use trailmark_location::LocationError;

/// Errors and rejected operations from the tracking manager
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("A tracking session is already active")]
    AlreadyTracking,

    #[error("No tracking session is active")]
    NotTracking,

    #[error("Failed to subscribe to location updates: {0}")]
    Subscription(LocationError),

    #[error("Location provider error: {0}")]
    Provider(#[from] LocationError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
