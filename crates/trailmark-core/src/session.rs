//! Active session bookkeeping

use trailmark_api::{LocationPoint, TrackingSession};
use trailmark_config::DistanceMode;
use trailmark_util::{path_distance, DistanceAccumulator, SessionId};

/// A session that is still receiving points
///
/// Owns the session record while it is mutable. Finalizing consumes the
/// value, so a session can only be finalized once.
#[derive(Debug)]
pub struct ActiveSession {
    session: TrackingSession,
    mode: DistanceMode,
    accumulator: DistanceAccumulator,
}

impl ActiveSession {
    /// Start an empty session
    pub fn new(id: SessionId, start_time: i64, mode: DistanceMode) -> Self {
        Self {
            session: TrackingSession::begin(id, start_time),
            mode,
            accumulator: DistanceAccumulator::new(),
        }
    }

    /// Append a point and bring `distance` up to date
    pub fn record(&mut self, point: LocationPoint) {
        self.session.path.push(point);

        self.session.distance = match self.mode {
            DistanceMode::FullRecompute => path_distance(&self.session.path),
            DistanceMode::Incremental => self.accumulator.push(&point),
        };
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn point_count(&self) -> usize {
        self.session.path.len()
    }

    /// Close the session at `end_time`
    ///
    /// An `end_time` earlier than the start (wall clock stepped backwards) is
    /// clamped to the start so `duration` is never negative.
    pub fn finalize(self, end_time: i64) -> TrackingSession {
        let mut session = self.session;
        let end_time = end_time.max(session.start_time);

        session.end_time = Some(end_time);
        session.duration = Some(end_time - session.start_time);
        session.is_active = false;
        session
    }
}
