//! Session history repository
//!
//! The whole history lives under one key as a JSON document:
//!
//! ```json
//! {"version": 1, "sessions": [ ...most recent first... ]}
//! ```
//!
//! A bare JSON array (the unversioned layout older installs wrote) is read as
//! version 0 and replaced by the versioned layout on the next write.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trailmark_api::TrackingSession;
use trailmark_util::SessionId;

use crate::{KeyValueStore, StoreError, StoreResult};

/// Current on-disk layout version
pub const STORAGE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredSessionsRef<'a> {
    version: u32,
    sessions: &'a [TrackingSession],
}

#[derive(Deserialize)]
struct StoredSessions {
    version: u32,
    sessions: Vec<TrackingSession>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFormat {
    Versioned(StoredSessions),
    Legacy(Vec<TrackingSession>),
}

/// Decode a stored history blob
pub fn decode_sessions(blob: &str) -> StoreResult<Vec<TrackingSession>> {
    match serde_json::from_str::<StoredFormat>(blob)? {
        StoredFormat::Versioned(stored) if stored.version == STORAGE_FORMAT_VERSION => {
            Ok(stored.sessions)
        }
        StoredFormat::Versioned(stored) => Err(StoreError::UnsupportedVersion(stored.version)),
        StoredFormat::Legacy(sessions) => {
            debug!(count = sessions.len(), "Read unversioned session history");
            Ok(sessions)
        }
    }
}

/// Encode a history in the current layout
pub fn encode_sessions(sessions: &[TrackingSession]) -> StoreResult<String> {
    let stored = StoredSessionsRef {
        version: STORAGE_FORMAT_VERSION,
        sessions,
    };
    Ok(serde_json::to_string(&stored)?)
}

/// Ordered history of finished sessions, most recent first
///
/// Every mutation writes the complete list back under one key, then updates
/// the in-memory copy only if the write succeeded. Mutations take `&mut self`,
/// so writes through one `SessionStore` never interleave.
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    sessions: Vec<TrackingSession>,
    is_loading: bool,
    /// The last load failed, so `sessions` does not reflect storage
    load_failed: bool,
}

impl SessionStore {
    /// Create a store over `kv`; nothing is read until [`SessionStore::load`]
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            sessions: Vec::new(),
            is_loading: true,
            load_failed: false,
        }
    }

    /// Read the persisted history without touching the in-memory copy
    pub fn read_persisted(&self) -> StoreResult<Vec<TrackingSession>> {
        match self.kv.get(&self.key)? {
            Some(blob) => decode_sessions(&blob),
            None => Ok(Vec::new()),
        }
    }

    /// Reload the history from storage
    ///
    /// Read or parse failures are logged and yield an empty history. Until a
    /// later read succeeds, `save` and `delete` refuse to write.
    pub fn load(&mut self) -> &[TrackingSession] {
        debug!(key = %self.key, "Loading sessions from storage");

        match self.read_persisted() {
            Ok(sessions) => {
                info!(count = sessions.len(), "Loaded sessions");
                self.sessions = sessions;
                self.load_failed = false;
            }
            Err(e) => {
                warn!(error = %e, key = %self.key, "Failed to load sessions");
                self.sessions = Vec::new();
                self.load_failed = true;
            }
        }
        self.is_loading = false;

        &self.sessions
    }

    /// Prepend a finished session and persist the full list
    ///
    /// Fails without writing if the stored history cannot be read.
    pub fn save(&mut self, session: TrackingSession) -> StoreResult<()> {
        if session.is_active {
            return Err(StoreError::SessionActive(session.id));
        }
        self.ensure_readable()?;
        if self.get(&session.id).is_some() {
            return Err(StoreError::DuplicateSession(session.id));
        }

        let session_id = session.id.clone();
        let mut updated = Vec::with_capacity(self.sessions.len() + 1);
        updated.push(session);
        updated.extend(self.sessions.iter().cloned());

        self.write(&updated).inspect_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to save session");
        })?;
        self.sessions = updated;

        info!(session_id = %session_id, total = self.sessions.len(), "Session saved");
        Ok(())
    }

    /// Remove one session and persist the remainder
    ///
    /// Returns whether a session with `id` was present. Fails without
    /// writing if the stored history cannot be read.
    pub fn delete(&mut self, id: &SessionId) -> StoreResult<bool> {
        self.ensure_readable()?;

        let updated: Vec<TrackingSession> = self
            .sessions
            .iter()
            .filter(|s| &s.id != id)
            .cloned()
            .collect();
        let removed = updated.len() != self.sessions.len();

        self.write(&updated).inspect_err(|e| {
            warn!(error = %e, session_id = %id, "Failed to delete session");
        })?;
        self.sessions = updated;

        info!(session_id = %id, removed, "Session deleted");
        Ok(removed)
    }

    /// Remove the whole history
    pub fn delete_all(&mut self) -> StoreResult<()> {
        self.kv.remove(&self.key).inspect_err(|e| {
            warn!(error = %e, "Failed to clear sessions");
        })?;
        self.sessions.clear();
        self.is_loading = false;
        self.load_failed = false;

        info!("All sessions cleared");
        Ok(())
    }

    /// Sessions in display order, most recent first
    pub fn sessions(&self) -> &[TrackingSession] {
        &self.sessions
    }

    pub fn get(&self, id: &SessionId) -> Option<&TrackingSession> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// `true` until the first load completes
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// `true` if the last load could not read the stored history
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_healthy(&self) -> bool {
        self.kv.is_healthy()
    }

    // Mutations rewrite the whole list, so it must match what is stored.
    fn ensure_readable(&mut self) -> StoreResult<()> {
        if self.is_loading || self.load_failed {
            let sessions = self.read_persisted().inspect_err(|e| {
                warn!(error = %e, key = %self.key, "Stored history unreadable, not writing");
            })?;
            self.sessions = sessions;
            self.is_loading = false;
            self.load_failed = false;
        }
        Ok(())
    }

    fn write(&self, sessions: &[TrackingSession]) -> StoreResult<()> {
        let blob = encode_sessions(sessions)?;
        self.kv.set(&self.key, &blob)
    }
}
