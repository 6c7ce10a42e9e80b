//! Presentation facade over the tracking manager and session history

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use trailmark_api::{LiveState, LocationPoint, TrackerEvent, TrackingSession};
use trailmark_config::Config;
use trailmark_location::LocationProvider;
use trailmark_store::{KeyValueStore, SessionStore, StoreResult};
use trailmark_util::SessionId;

use crate::{TrackerResult, TrackingManager};

/// Everything a screen needs: live tracking plus stored history
///
/// Stopping a session hands it to the history only when it recorded at least
/// one point; empty sessions are dropped.
pub struct Tracker {
    manager: TrackingManager,
    store: SessionStore,
}

impl Tracker {
    pub fn new(manager: TrackingManager, store: SessionStore) -> Self {
        Self { manager, store }
    }

    /// Build a tracker from configuration and load the stored history
    pub fn open(
        provider: Arc<dyn LocationProvider>,
        kv: Arc<dyn KeyValueStore>,
        config: &Config,
    ) -> Self {
        let manager = TrackingManager::new(provider, config.tracking.clone());
        let mut store = SessionStore::new(kv, config.storage.storage_key.clone());
        store.load();

        Self::new(manager, store)
    }

    pub fn is_tracking(&self) -> bool {
        self.manager.is_tracking()
    }

    pub fn has_permission(&self) -> Option<bool> {
        self.manager.has_permission()
    }

    pub fn current_location(&self) -> Option<&LocationPoint> {
        self.manager.current_location()
    }

    pub fn current_session(&self) -> Option<&TrackingSession> {
        self.manager.current_session()
    }

    pub fn live_state(&self) -> LiveState {
        self.manager.live_state()
    }

    pub fn watch(&self) -> watch::Receiver<LiveState> {
        self.manager.subscribe()
    }

    pub async fn request_permission(&mut self) -> TrackerResult<TrackerEvent> {
        self.manager.request_permission().await
    }

    pub async fn start(&mut self) -> TrackerResult<TrackerEvent> {
        self.manager.start(trailmark_util::now_millis()).await
    }

    /// Wait for and record the next sample; `None` once the stream ends
    pub async fn process_next_sample(&mut self) -> Option<TrackerEvent> {
        self.manager.process_next_sample().await
    }

    /// Stop tracking now and keep the session if it has any points
    pub async fn stop(&mut self) -> Option<TrackingSession> {
        self.stop_at(trailmark_util::now_millis()).await
    }

    /// Stop tracking at `now` (epoch milliseconds)
    ///
    /// Returns the finalized session whether or not it was persisted, or
    /// `None` if nothing was being tracked. Save failures are logged.
    pub async fn stop_at(&mut self, now: i64) -> Option<TrackingSession> {
        let session = match self.manager.stop(now).await {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Nothing to stop");
                return None;
            }
        };

        if session.has_path() {
            if let Err(e) = self.store.save(session.clone()) {
                warn!(error = %e, session_id = %session.id, "Finished session was not saved");
            }
        } else {
            info!(session_id = %session.id, "Discarding session with no points");
        }

        Some(session)
    }

    /// Cancel tracking without saving anything
    pub async fn teardown(&mut self) -> Option<TrackerEvent> {
        self.manager.teardown().await
    }

    pub fn sessions(&self) -> &[TrackingSession] {
        self.store.sessions()
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    pub fn save_session(&mut self, session: TrackingSession) -> StoreResult<()> {
        self.store.save(session)
    }

    pub fn delete_session(&mut self, id: &SessionId) -> StoreResult<bool> {
        self.store.delete(id)
    }

    pub fn clear_all(&mut self) -> StoreResult<()> {
        self.store.delete_all()
    }

    pub fn reload(&mut self) -> &[TrackingSession] {
        self.store.load()
    }

    pub fn manager(&self) -> &TrackingManager {
        &self.manager
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
