//! Tracking state machine

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use trailmark_api::{LiveState, LocationPoint, TrackerEvent, TrackerPhase, TrackingSession};
use trailmark_config::TrackingConfig;
use trailmark_location::{LocationProvider, RawSample, SubscriptionHandle};
use trailmark_util::SessionId;

use crate::{ActiveSession, TrackerError, TrackerResult};

/// Live subscription and the session it feeds
struct Tracking {
    active: ActiveSession,
    handle: SubscriptionHandle,
    /// `None` once the provider closed the stream
    samples: Option<mpsc::UnboundedReceiver<RawSample>>,
}

enum TrackerState {
    Idle,
    PermissionPending,
    PermissionDenied,
    Tracking(Tracking),
    Stopped,
}

impl TrackerState {
    fn phase(&self) -> TrackerPhase {
        match self {
            TrackerState::Idle => TrackerPhase::Idle,
            TrackerState::PermissionPending => TrackerPhase::PermissionPending,
            TrackerState::PermissionDenied => TrackerPhase::PermissionDenied,
            TrackerState::Tracking(_) => TrackerPhase::Tracking,
            TrackerState::Stopped => TrackerPhase::Stopped,
        }
    }
}

/// Owns the live-tracking state and the provider subscription
///
/// At most one session is active at a time. Every transition republishes a
/// [`LiveState`] snapshot to watchers.
pub struct TrackingManager {
    provider: Arc<dyn LocationProvider>,
    config: TrackingConfig,
    state: TrackerState,
    has_permission: Option<bool>,
    current_location: Option<LocationPoint>,
    /// Last finalized session, kept until the next start
    last_session: Option<TrackingSession>,
    live: watch::Sender<LiveState>,
}

impl TrackingManager {
    pub fn new(provider: Arc<dyn LocationProvider>, config: TrackingConfig) -> Self {
        let (live, _) = watch::channel(LiveState::default());

        debug!(
            accuracy = ?config.sampling.accuracy,
            min_interval_ms = config.sampling.min_interval.as_millis() as u64,
            min_distance_m = config.sampling.min_distance_m,
            distance_mode = ?config.distance_mode,
            "Tracking manager initialized"
        );

        Self {
            provider,
            config,
            state: TrackerState::Idle,
            has_permission: None,
            current_location: None,
            last_session: None,
            live,
        }
    }

    pub fn phase(&self) -> TrackerPhase {
        self.state.phase()
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking(_))
    }

    /// Tracking and the provider stream is still open
    pub fn is_receiving(&self) -> bool {
        matches!(&self.state, TrackerState::Tracking(t) if t.samples.is_some())
    }

    /// `None` until a permission request has completed
    pub fn has_permission(&self) -> Option<bool> {
        self.has_permission
    }

    pub fn current_location(&self) -> Option<&LocationPoint> {
        self.current_location.as_ref()
    }

    /// The active session, or the last finalized one
    pub fn current_session(&self) -> Option<&TrackingSession> {
        match &self.state {
            TrackerState::Tracking(t) => Some(t.active.session()),
            _ => self.last_session.as_ref(),
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Snapshot of the state shown to the presentation layer
    pub fn live_state(&self) -> LiveState {
        LiveState {
            phase: self.phase(),
            has_permission: self.has_permission,
            current_location: self.current_location,
            current_session: self.current_session().cloned(),
        }
    }

    /// Watch live state changes
    pub fn subscribe(&self) -> watch::Receiver<LiveState> {
        self.live.subscribe()
    }

    /// Ask the provider for location permission
    ///
    /// A grant makes the manager eligible to start; a refusal or provider
    /// error moves it to `PermissionDenied`. Call again to re-prompt. A
    /// finalized session stays available as `current_session` throughout.
    pub async fn request_permission(&mut self) -> TrackerResult<TrackerEvent> {
        if self.is_tracking() {
            return Err(TrackerError::AlreadyTracking);
        }

        let was_stopped = matches!(self.state, TrackerState::Stopped);
        self.state = TrackerState::PermissionPending;
        self.publish();

        let result = self.provider.request_permission().await;
        let granted = matches!(&result, Ok(status) if status.is_granted());

        self.has_permission = Some(granted);
        self.state = if granted && was_stopped {
            TrackerState::Stopped
        } else if granted {
            TrackerState::Idle
        } else {
            TrackerState::PermissionDenied
        };
        self.publish();

        match result {
            Ok(status) => {
                info!(status = ?status, "Location permission resolved");
                Ok(TrackerEvent::PermissionChanged { granted })
            }
            Err(e) => {
                warn!(error = %e, "Error requesting location permission");
                Err(TrackerError::Provider(e))
            }
        }
    }

    /// Begin a new session at `now` (epoch milliseconds)
    ///
    /// Nothing changes if permission is missing, a session is already active,
    /// or the provider refuses the subscription.
    pub async fn start(&mut self, now: i64) -> TrackerResult<TrackerEvent> {
        if self.is_tracking() {
            warn!("Start requested while already tracking");
            return Err(TrackerError::AlreadyTracking);
        }
        if self.has_permission != Some(true) {
            warn!("No location permission");
            return Err(TrackerError::PermissionDenied);
        }

        let subscription = self
            .provider
            .subscribe(&self.config.sampling)
            .await
            .map_err(|e| {
                warn!(error = %e, "Error starting location tracking");
                TrackerError::Subscription(e)
            })?;

        let session_id = SessionId::new();
        let active = ActiveSession::new(session_id.clone(), now, self.config.distance_mode);

        info!(
            session_id = %session_id,
            subscription = %subscription.handle,
            "Tracking started"
        );

        self.last_session = None;
        self.state = TrackerState::Tracking(Tracking {
            active,
            handle: subscription.handle,
            samples: Some(subscription.samples),
        });
        self.publish();

        Ok(TrackerEvent::TrackingStarted {
            session_id,
            start_time: now,
        })
    }

    /// Wait for the next provider sample
    ///
    /// Returns `None` when not tracking or once the provider closes the
    /// stream. Cancel-safe: a sample is never lost if this future is dropped.
    pub async fn next_sample(&mut self) -> Option<RawSample> {
        let TrackerState::Tracking(tracking) = &mut self.state else {
            return None;
        };
        let samples = tracking.samples.as_mut()?;

        match samples.recv().await {
            Some(sample) => Some(sample),
            None => {
                debug!(subscription = %tracking.handle, "Location stream ended");
                tracking.samples = None;
                None
            }
        }
    }

    /// Record a sample received at `now` (epoch milliseconds)
    ///
    /// The point keeps the provider's coordinates and the local receipt time.
    /// Samples that arrive when no session is active are dropped.
    pub fn apply_sample(&mut self, sample: RawSample, now: i64) -> Option<TrackerEvent> {
        let TrackerState::Tracking(tracking) = &mut self.state else {
            debug!("Dropping sample received while not tracking");
            return None;
        };

        let point = LocationPoint::new(sample.latitude, sample.longitude, now);
        tracking.active.record(point);

        let event = TrackerEvent::PointRecorded {
            session_id: tracking.active.id().clone(),
            point,
            distance: tracking.active.session().distance,
            point_count: tracking.active.point_count(),
        };

        self.current_location = Some(point);
        self.publish();

        Some(event)
    }

    /// Wait for the next sample and record it with the current clock
    pub async fn process_next_sample(&mut self) -> Option<TrackerEvent> {
        let sample = self.next_sample().await?;
        self.apply_sample(sample, trailmark_util::now_millis())
    }

    /// Finalize the active session at `now` (epoch milliseconds)
    ///
    /// The subscription is cancelled first; a failure to cancel is logged and
    /// does not prevent finalization. A second call without an intervening
    /// `start` is rejected and leaves the finalized session untouched.
    pub async fn stop(&mut self, now: i64) -> TrackerResult<TrackingSession> {
        if !self.is_tracking() {
            debug!("Stop requested while not tracking");
            return Err(TrackerError::NotTracking);
        }
        let TrackerState::Tracking(tracking) =
            std::mem::replace(&mut self.state, TrackerState::Idle)
        else {
            return Err(TrackerError::NotTracking);
        };

        info!(session_id = %tracking.active.id(), "Stopping location tracking");

        // Drop the receiver before awaiting so nothing more is delivered
        drop(tracking.samples);
        self.cancel_subscription(tracking.handle).await;

        let session = tracking.active.finalize(now);

        info!(
            session_id = %session.id,
            duration_ms = session.duration.unwrap_or_default(),
            distance_m = session.distance,
            points = session.path.len(),
            "Tracking stopped"
        );

        self.state = TrackerState::Stopped;
        self.last_session = Some(session.clone());
        self.publish();

        Ok(session)
    }

    /// Cancel any active subscription and discard its unfinished session
    pub async fn teardown(&mut self) -> Option<TrackerEvent> {
        if !self.is_tracking() {
            return None;
        }
        let TrackerState::Tracking(tracking) =
            std::mem::replace(&mut self.state, TrackerState::Idle)
        else {
            return None;
        };

        drop(tracking.samples);
        self.cancel_subscription(tracking.handle).await;

        let session_id = tracking.active.id().clone();
        info!(session_id = %session_id, "Tracking cancelled");
        self.publish();

        Some(TrackerEvent::TrackingCancelled { session_id })
    }

    async fn cancel_subscription(&self, handle: SubscriptionHandle) {
        if let Err(e) = self.provider.unsubscribe(handle).await {
            warn!(error = %e, subscription = %handle, "Failed to cancel location subscription");
        }
    }

    fn publish(&self) {
        self.live.send_replace(self.live_state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailmark_config::DistanceMode;
    use trailmark_location::{MockLocationProvider, PermissionStatus};
    use trailmark_util::{haversine_distance, path_distance};

    fn manager_with(provider: Arc<MockLocationProvider>) -> TrackingManager {
        TrackingManager::new(provider, TrackingConfig::default())
    }

    async fn permitted() -> (Arc<MockLocationProvider>, TrackingManager) {
        let provider = Arc::new(MockLocationProvider::new());
        let mut manager = manager_with(provider.clone());
        manager.request_permission().await.unwrap();
        (provider, manager)
    }

    #[tokio::test]
    async fn permission_grant_and_denial() {
        let provider = Arc::new(MockLocationProvider::new());
        let mut manager = manager_with(provider.clone());
        assert_eq!(manager.has_permission(), None);

        let event = manager.request_permission().await.unwrap();
        assert_eq!(event, TrackerEvent::PermissionChanged { granted: true });
        assert_eq!(manager.phase(), TrackerPhase::Idle);
        assert_eq!(manager.has_permission(), Some(true));

        provider.set_permission(PermissionStatus::Denied);
        let event = manager.request_permission().await.unwrap();
        assert_eq!(event, TrackerEvent::PermissionChanged { granted: false });
        assert_eq!(manager.phase(), TrackerPhase::PermissionDenied);
        assert_eq!(manager.has_permission(), Some(false));
    }

    #[tokio::test]
    async fn permission_error_counts_as_denied() {
        let provider = Arc::new(MockLocationProvider::new());
        *provider.fail_permission.lock().unwrap() = true;
        let mut manager = manager_with(provider);

        assert!(matches!(
            manager.request_permission().await,
            Err(TrackerError::Provider(_))
        ));
        assert_eq!(manager.phase(), TrackerPhase::PermissionDenied);
        assert_eq!(manager.has_permission(), Some(false));
    }

    #[tokio::test]
    async fn start_without_permission_is_rejected() {
        let provider = Arc::new(MockLocationProvider::new());
        let mut manager = manager_with(provider.clone());

        assert!(matches!(manager.start(0).await, Err(TrackerError::PermissionDenied)));
        assert_eq!(manager.phase(), TrackerPhase::Idle);
        assert_eq!(provider.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn subscription_failure_leaves_state_unchanged() {
        let (provider, mut manager) = permitted().await;
        *provider.fail_subscribe.lock().unwrap() = true;

        assert!(matches!(manager.start(0).await, Err(TrackerError::Subscription(_))));
        assert_eq!(manager.phase(), TrackerPhase::Idle);
        assert!(manager.current_session().is_none());
    }

    #[tokio::test]
    async fn start_creates_empty_session_with_configured_policy() {
        let (provider, mut manager) = permitted().await;

        let event = manager.start(5_000).await.unwrap();
        let TrackerEvent::TrackingStarted { start_time, .. } = event else {
            panic!("unexpected event {:?}", event);
        };
        assert_eq!(start_time, 5_000);

        let session = manager.current_session().unwrap();
        assert!(session.is_active);
        assert!(session.path.is_empty());
        assert_eq!(session.distance, 0.0);
        assert_eq!(session.start_time, 5_000);

        assert_eq!(provider.last_config(), Some(manager.config().sampling));
        assert_eq!(provider.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();
        let first_id = manager.current_session().unwrap().id.clone();

        assert!(matches!(manager.start(1).await, Err(TrackerError::AlreadyTracking)));
        assert_eq!(manager.current_session().unwrap().id, first_id);
        assert_eq!(provider.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn samples_accumulate_path_and_distance() {
        let (provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();

        let fixes = [(0.0, 0.0), (0.0, 0.001), (0.0, 0.002)];
        for (i, (lat, lon)) in fixes.iter().enumerate() {
            provider.emit(RawSample::at(*lat, *lon, 999_999));
            let sample = manager.next_sample().await.unwrap();
            let event = manager.apply_sample(sample, 1_000 * (i as i64 + 1)).unwrap();

            let TrackerEvent::PointRecorded { point_count, .. } = event else {
                panic!("unexpected event {:?}", event);
            };
            assert_eq!(point_count, i + 1);
        }

        let session = manager.current_session().unwrap();
        assert_eq!(session.path.len(), 3);
        // Receipt time, not provider fix time
        assert_eq!(session.path[2].timestamp, 3_000);
        assert_eq!(session.distance, path_distance(&session.path));
        assert!((session.distance - 2.0 * haversine_distance(&(0.0, 0.0), &(0.0, 0.001))).abs() < 1e-9);

        assert_eq!(manager.current_location(), Some(&session.path[2]));
    }

    #[tokio::test]
    async fn stop_finalizes_and_cancels_subscription() {
        let (provider, mut manager) = permitted().await;
        manager.start(10_000).await.unwrap();
        manager.apply_sample(RawSample::new(1.0, 1.0), 11_000);

        let session = manager.stop(70_000).await.unwrap();
        assert!(!session.is_active);
        assert_eq!(session.end_time, Some(70_000));
        assert_eq!(session.duration, Some(60_000));
        assert_eq!(session.path.len(), 1);

        assert_eq!(manager.phase(), TrackerPhase::Stopped);
        assert_eq!(manager.current_session(), Some(&session));
        assert_eq!(provider.active_subscriptions(), 0);

        // Late samples are not recorded
        assert_eq!(provider.emit(RawSample::new(2.0, 2.0)), 0);
        assert!(manager.apply_sample(RawSample::new(2.0, 2.0), 80_000).is_none());
        assert_eq!(manager.current_session().unwrap().path.len(), 1);
    }

    #[tokio::test]
    async fn stop_before_any_sample_yields_empty_path() {
        let (_provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();

        let session = manager.stop(1_000).await.unwrap();
        assert!(session.path.is_empty());
        assert_eq!(session.distance, 0.0);
    }

    #[tokio::test]
    async fn second_stop_is_rejected_without_changing_duration() {
        let (_provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();
        let first = manager.stop(5_000).await.unwrap();

        assert!(matches!(manager.stop(9_000).await, Err(TrackerError::NotTracking)));
        assert_eq!(manager.current_session(), Some(&first));
        assert_eq!(manager.current_session().unwrap().duration, Some(5_000));
    }

    #[tokio::test]
    async fn stop_completes_even_if_unsubscribe_fails() {
        let (provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();
        *provider.fail_unsubscribe.lock().unwrap() = true;

        let session = manager.stop(1_000).await.unwrap();
        assert!(!session.is_active);
        assert_eq!(manager.phase(), TrackerPhase::Stopped);
    }

    #[tokio::test]
    async fn restart_after_stop_gets_new_id() {
        let (_provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();
        let first = manager.stop(1_000).await.unwrap();

        manager.start(2_000).await.unwrap();
        let second = manager.current_session().unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.path.is_empty());
    }

    #[tokio::test]
    async fn teardown_discards_active_session() {
        let (provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();

        let event = manager.teardown().await;
        assert!(matches!(event, Some(TrackerEvent::TrackingCancelled { .. })));
        assert_eq!(manager.phase(), TrackerPhase::Idle);
        assert!(manager.current_session().is_none());
        assert_eq!(provider.active_subscriptions(), 0);

        assert!(manager.teardown().await.is_none());
    }

    #[tokio::test]
    async fn stream_end_stops_receiving() {
        let (provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();
        assert!(manager.is_receiving());

        let handle = SubscriptionHandle::new(1);
        provider.unsubscribe(handle).await.unwrap();

        assert!(manager.next_sample().await.is_none());
        assert!(manager.is_tracking());
        assert!(!manager.is_receiving());
    }

    #[tokio::test]
    async fn reprompt_after_stop_keeps_finished_session() {
        let (provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();
        manager.apply_sample(RawSample::new(1.0, 1.0), 10);
        let finished = manager.stop(1_000).await.unwrap();

        manager.request_permission().await.unwrap();
        assert_eq!(manager.phase(), TrackerPhase::Stopped);
        assert_eq!(manager.current_session(), Some(&finished));

        provider.set_permission(PermissionStatus::Denied);
        manager.request_permission().await.unwrap();
        assert_eq!(manager.phase(), TrackerPhase::PermissionDenied);
        assert_eq!(manager.current_session(), Some(&finished));
        assert_eq!(manager.live_state().current_session, Some(finished));
    }

    #[tokio::test]
    async fn request_permission_rejected_while_tracking() {
        let (_provider, mut manager) = permitted().await;
        manager.start(0).await.unwrap();

        assert!(matches!(
            manager.request_permission().await,
            Err(TrackerError::AlreadyTracking)
        ));
        assert!(manager.is_tracking());
    }

    #[tokio::test]
    async fn live_state_is_published() {
        let (provider, mut manager) = permitted().await;
        let mut live = manager.subscribe();

        manager.start(0).await.unwrap();
        assert!(live.has_changed().unwrap());
        assert!(live.borrow_and_update().is_tracking());

        provider.emit(RawSample::new(3.0, 4.0));
        manager.process_next_sample().await.unwrap();
        {
            let state = live.borrow_and_update();
            assert_eq!(state.current_location.map(|p| p.latitude), Some(3.0));
            assert_eq!(state.current_session.as_ref().unwrap().path.len(), 1);
            assert_eq!(state.has_permission, Some(true));
        }

        manager.stop(10).await.unwrap();
        let state = live.borrow_and_update().clone();
        assert_eq!(state.phase, TrackerPhase::Stopped);
        assert!(!state.current_session.unwrap().is_active);
    }

    #[tokio::test]
    async fn incremental_mode_matches_full_mode() {
        let fixes = [
            (40.7128, -74.0060),
            (40.7138, -74.0050),
            (40.7150, -74.0031),
            (40.7162, -74.0012),
        ];

        let mut distances = Vec::new();
        for mode in [DistanceMode::FullRecompute, DistanceMode::Incremental] {
            let provider = Arc::new(MockLocationProvider::new());
            let config = TrackingConfig {
                distance_mode: mode,
                ..TrackingConfig::default()
            };
            let mut manager = TrackingManager::new(provider, config);
            manager.request_permission().await.unwrap();
            manager.start(0).await.unwrap();

            for (i, (lat, lon)) in fixes.iter().enumerate() {
                manager.apply_sample(RawSample::new(*lat, *lon), i as i64);
            }
            distances.push(manager.stop(100).await.unwrap().distance);
        }

        assert_eq!(distances[0], distances[1]);
    }
}
