//! Mock location provider for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::{
    LocationError, LocationProvider, LocationResult, PermissionStatus, RawSample, SamplingConfig,
    Subscription, SubscriptionHandle,
};

/// Mock provider for unit/integration testing
///
/// Samples are pushed by hand with [`MockLocationProvider::emit`] and go to
/// every open subscription unfiltered.
pub struct MockLocationProvider {
    next_id: AtomicU64,
    subscribers: Arc<Mutex<HashMap<u64, mpsc::UnboundedSender<RawSample>>>>,
    last_config: Mutex<Option<SamplingConfig>>,

    /// Answer given to permission requests
    pub permission: Arc<Mutex<PermissionStatus>>,

    /// Configure permission requests to error
    pub fail_permission: Arc<Mutex<bool>>,

    /// Configure subscribe to fail
    pub fail_subscribe: Arc<Mutex<bool>>,

    /// Configure unsubscribe to fail
    pub fail_unsubscribe: Arc<Mutex<bool>>,
}

impl MockLocationProvider {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            last_config: Mutex::new(None),
            permission: Arc::new(Mutex::new(PermissionStatus::Granted)),
            fail_permission: Arc::new(Mutex::new(false)),
            fail_subscribe: Arc::new(Mutex::new(false)),
            fail_unsubscribe: Arc::new(Mutex::new(false)),
        }
    }

    /// A provider whose permission prompt is always refused
    pub fn denying() -> Self {
        let provider = Self::new();
        provider.set_permission(PermissionStatus::Denied);
        provider
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        *self.permission.lock().unwrap() = status;
    }

    /// Push a sample to every open subscription; returns how many received it
    pub fn emit(&self, sample: RawSample) -> usize {
        let subscribers = self.subscribers.lock().unwrap();
        subscribers
            .values()
            .filter(|tx| tx.send(sample).is_ok())
            .count()
    }

    /// Number of subscriptions not yet cancelled
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Sampling policy passed to the most recent `subscribe`
    pub fn last_config(&self) -> Option<SamplingConfig> {
        *self.last_config.lock().unwrap()
    }
}

impl Default for MockLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    async fn request_permission(&self) -> LocationResult<PermissionStatus> {
        if *self.fail_permission.lock().unwrap() {
            return Err(LocationError::Unavailable("Mock permission failure".into()));
        }
        Ok(*self.permission.lock().unwrap())
    }

    async fn subscribe(&self, config: &SamplingConfig) -> LocationResult<Subscription> {
        if *self.fail_subscribe.lock().unwrap() {
            return Err(LocationError::SubscriptionFailed("Mock subscribe failure".into()));
        }
        if !self.permission.lock().unwrap().is_granted() {
            return Err(LocationError::PermissionDenied);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();

        self.subscribers.lock().unwrap().insert(id, tx);
        *self.last_config.lock().unwrap() = Some(*config);

        Ok(Subscription {
            handle: SubscriptionHandle::new(id),
            samples: rx,
        })
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> LocationResult<()> {
        if *self.fail_unsubscribe.lock().unwrap() {
            return Err(LocationError::Unavailable("Mock unsubscribe failure".into()));
        }

        match self.subscribers.lock().unwrap().remove(&handle.id()) {
            Some(_) => Ok(()),
            None => Err(LocationError::UnknownSubscription(handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_subscribe_emit_unsubscribe() {
        let provider = MockLocationProvider::new();
        let mut sub = provider.subscribe(&SamplingConfig::default()).await.unwrap();

        assert_eq!(provider.active_subscriptions(), 1);
        assert_eq!(provider.emit(RawSample::new(1.0, 2.0)), 1);
        assert_eq!(sub.samples.recv().await, Some(RawSample::new(1.0, 2.0)));

        provider.unsubscribe(sub.handle).await.unwrap();
        assert_eq!(provider.active_subscriptions(), 0);
        assert_eq!(provider.emit(RawSample::new(3.0, 4.0)), 0);

        // Sender dropped on unsubscribe, so the stream ends
        assert_eq!(sub.samples.recv().await, None);
    }

    #[tokio::test]
    async fn mock_subscribe_failure() {
        let provider = MockLocationProvider::new();
        *provider.fail_subscribe.lock().unwrap() = true;

        let result = provider.subscribe(&SamplingConfig::default()).await;
        assert!(matches!(result, Err(LocationError::SubscriptionFailed(_))));
    }

    #[tokio::test]
    async fn mock_denied_permission_blocks_subscribe() {
        let provider = MockLocationProvider::denying();

        let status = provider.request_permission().await.unwrap();
        assert_eq!(status, PermissionStatus::Denied);

        let result = provider.subscribe(&SamplingConfig::default()).await;
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
    }

    #[tokio::test]
    async fn mock_unknown_unsubscribe() {
        let provider = MockLocationProvider::new();
        let result = provider.unsubscribe(SubscriptionHandle::new(42)).await;
        assert!(matches!(result, Err(LocationError::UnknownSubscription(_))));
    }
}
