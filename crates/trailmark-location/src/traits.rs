//! Location provider trait

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{RawSample, SamplingConfig, SubscriptionHandle};

/// Errors from location provider operations
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(SubscriptionHandle),

    #[error("Invalid track data: {0}")]
    InvalidTrack(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LocationResult<T> = Result<T, LocationError>;

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// An active sample stream
///
/// Samples arrive on `samples` until the subscription is cancelled or the
/// provider runs out of fixes, at which point the channel closes.
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub samples: mpsc::UnboundedReceiver<RawSample>,
}

/// Location provider trait - implemented by platform or replay sources
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for permission to read the device position
    async fn request_permission(&self) -> LocationResult<PermissionStatus>;

    /// Start delivering samples according to `config`
    async fn subscribe(&self, config: &SamplingConfig) -> LocationResult<Subscription>;

    /// Stop a subscription; no further samples are sent on its channel
    async fn unsubscribe(&self, handle: SubscriptionHandle) -> LocationResult<()>;
}
