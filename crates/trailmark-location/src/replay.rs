//! Replay provider: feeds a recorded track through a subscription

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    LocationError, LocationProvider, LocationResult, PermissionStatus, RawSample, SampleThrottle,
    SamplingConfig, Subscription, SubscriptionHandle,
};

/// Read a track file: a JSON array of `{latitude, longitude, timestamp?}`
pub fn load_track(path: impl AsRef<Path>) -> LocationResult<Vec<RawSample>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_track(&content)
}

/// Parse a track from a JSON string
pub fn parse_track(content: &str) -> LocationResult<Vec<RawSample>> {
    let samples: Vec<RawSample> =
        serde_json::from_str(content).map_err(|e| LocationError::InvalidTrack(e.to_string()))?;

    for (i, s) in samples.iter().enumerate() {
        if !(-90.0..=90.0).contains(&s.latitude) || !(-180.0..=180.0).contains(&s.longitude) {
            return Err(LocationError::InvalidTrack(format!(
                "sample {} out of range: ({}, {})",
                i, s.latitude, s.longitude
            )));
        }
    }

    Ok(samples)
}

/// Provider that replays a fixed list of fixes
///
/// Each subscription receives the track filtered through the requested
/// sampling policy. Without pacing the whole track is queued at once and the
/// stream closes after the last fix; with pacing a background task sends one
/// fix per interval until the track ends or the subscription is cancelled.
pub struct ReplayProvider {
    track: Vec<RawSample>,
    pace: Option<Duration>,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<u64, Option<JoinHandle<()>>>>>,
}

impl ReplayProvider {
    pub fn new(track: Vec<RawSample>) -> Self {
        Self {
            track,
            pace: None,
            next_id: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Deliver one fix per `pace` instead of all at once
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn track_len(&self) -> usize {
        self.track.len()
    }
}

#[async_trait]
impl LocationProvider for ReplayProvider {
    async fn request_permission(&self) -> LocationResult<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn subscribe(&self, config: &SamplingConfig) -> LocationResult<Subscription> {
        let mut throttle = SampleThrottle::new(*config);
        let admitted: Vec<RawSample> = self
            .track
            .iter()
            .filter(|s| throttle.admit(s))
            .copied()
            .collect();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            subscription = id,
            track_len = self.track.len(),
            admitted = admitted.len(),
            "Replay subscription opened"
        );

        let task = match self.pace {
            None => {
                for sample in admitted {
                    // Receiver is held by the caller; this cannot fail yet
                    let _ = tx.send(sample);
                }
                None
            }
            Some(pace) => Some(tokio::spawn(async move {
                for sample in admitted {
                    tokio::time::sleep(pace).await;
                    if tx.send(sample).is_err() {
                        break;
                    }
                }
            })),
        };

        self.tasks.lock().unwrap().insert(id, task);

        Ok(Subscription {
            handle: SubscriptionHandle::new(id),
            samples: rx,
        })
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> LocationResult<()> {
        let task = self
            .tasks
            .lock()
            .unwrap()
            .remove(&handle.id())
            .ok_or(LocationError::UnknownSubscription(handle))?;

        if let Some(task) = task {
            task.abort();
        }
        debug!(subscription = %handle, "Replay subscription closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn track() -> Vec<RawSample> {
        vec![
            RawSample::at(0.0, 0.0, 0),
            RawSample::at(0.0, 0.001, 1_000),
            RawSample::at(0.0, 0.001, 2_000), // no movement
            RawSample::at(0.0, 0.002, 1_500), // too soon
            RawSample::at(0.0, 0.003, 4_000),
        ]
    }

    #[tokio::test]
    async fn replay_applies_sampling_policy() {
        let provider = ReplayProvider::new(track());
        assert_eq!(provider.track_len(), 5);
        let mut sub = provider.subscribe(&SamplingConfig::default()).await.unwrap();

        let mut received = Vec::new();
        while let Some(sample) = sub.samples.recv().await {
            received.push(sample);
        }

        assert_eq!(
            received,
            vec![
                RawSample::at(0.0, 0.0, 0),
                RawSample::at(0.0, 0.001, 1_000),
                RawSample::at(0.0, 0.003, 4_000),
            ]
        );

        provider.unsubscribe(sub.handle).await.unwrap();
    }

    #[tokio::test]
    async fn paced_replay_stops_on_unsubscribe() {
        let provider = ReplayProvider::new(track()).with_pace(Duration::from_secs(3600));
        let mut sub = provider.subscribe(&SamplingConfig::default()).await.unwrap();

        provider.unsubscribe(sub.handle).await.unwrap();
        assert_eq!(sub.samples.recv().await, None);

        let again = provider.unsubscribe(sub.handle).await;
        assert!(matches!(again, Err(LocationError::UnknownSubscription(_))));
    }

    #[test]
    fn load_track_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"latitude": 37.0, "longitude": -122.0, "timestamp": 1}},
                {{"latitude": 37.001, "longitude": -122.0}}]"#
        )
        .unwrap();

        let samples = load_track(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].fix_time, Some(1));
        assert_eq!(samples[1].fix_time, None);
    }

    #[test]
    fn parse_track_rejects_bad_coordinates() {
        let result = parse_track(r#"[{"latitude": 91.0, "longitude": 0.0}]"#);
        assert!(matches!(result, Err(LocationError::InvalidTrack(_))));

        let result = parse_track("not json");
        assert!(matches!(result, Err(LocationError::InvalidTrack(_))));
    }
}
