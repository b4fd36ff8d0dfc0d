//! Scripted position and geocoding sources for demos, headless runs, and
//! tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::debug;

use location_core::services::{
    GeocodingService, PositionEvent, PositionRequestOptions, PositionService,
    PositionSubscription,
};
use shared::{
    domain::{AddressCandidate, Coordinate, PositionFix},
    error::{AddressError, PositionError, PositionErrorKind},
};

/// One step of a playback script.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Wait before emitting the next event.
    Delay(Duration),
    Batch(Vec<PositionFix>),
    Failure(PositionError),
}

/// Plays a fixed script of position events to each subscriber.
pub struct SimulatedPositionService {
    script: Vec<ScriptStep>,
    enabled: bool,
}

impl SimulatedPositionService {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            script: Vec::new(),
            enabled: false,
        }
    }

    /// A single fix at the given coordinate after a short acquisition
    /// delay, preceded by one transient not-ready failure the way a cold
    /// receiver behaves.
    pub fn fixed(coordinate: Coordinate) -> Self {
        Self::new(vec![
            ScriptStep::Delay(Duration::from_millis(150)),
            ScriptStep::Failure(PositionError::temporarily_unavailable()),
            ScriptStep::Delay(Duration::from_millis(350)),
            ScriptStep::Batch(vec![PositionFix {
                coordinate,
                horizontal_accuracy_m: Some(65.0),
                timestamp: chrono::Utc::now(),
            }]),
        ])
    }
}

struct SimulatedSubscription {
    events: broadcast::Sender<PositionEvent>,
    playback: Mutex<Option<JoinHandle<()>>>,
}

impl PositionSubscription for SimulatedSubscription {
    fn subscribe(&self) -> broadcast::Receiver<PositionEvent> {
        self.events.subscribe()
    }

    fn stop(&self) {
        let task = match self.playback.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.abort();
        }
    }
}

#[async_trait]
impl PositionService for SimulatedPositionService {
    async fn start(
        &self,
        options: PositionRequestOptions,
    ) -> Result<Arc<dyn PositionSubscription>, PositionError> {
        if !self.enabled {
            return Err(PositionError::new(
                PositionErrorKind::ServicesDisabled,
                "simulated position source is disabled",
            ));
        }
        debug!(
            desired_accuracy_m = options.desired_accuracy_m,
            steps = self.script.len(),
            "starting simulated position playback"
        );
        let (events, _) = broadcast::channel(16);
        let script = self.script.clone();
        let sender = events.clone();
        let task = tokio::spawn(async move {
            // The caller subscribes right after start returns; hold playback
            // until a listener is attached so the first event is not lost.
            while sender.receiver_count() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            for step in script {
                match step {
                    ScriptStep::Delay(delay) => tokio::time::sleep(delay).await,
                    ScriptStep::Batch(batch) => {
                        let _ = sender.send(PositionEvent::Batch(batch));
                    }
                    ScriptStep::Failure(error) => {
                        let _ = sender.send(PositionEvent::Failed(error));
                    }
                }
            }
        });
        Ok(Arc::new(SimulatedSubscription {
            events,
            playback: Mutex::new(Some(task)),
        }))
    }
}

/// Returns a fixed candidate list (or error) after an optional delay.
pub struct SimulatedGeocodingService {
    result: Result<Vec<AddressCandidate>, AddressError>,
    delay: Duration,
}

impl SimulatedGeocodingService {
    pub fn with_candidate(candidate: AddressCandidate) -> Self {
        Self {
            result: Ok(vec![candidate]),
            delay: Duration::from_millis(250),
        }
    }

    pub fn failing(error: AddressError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::from_millis(250),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl GeocodingService for SimulatedGeocodingService {
    async fn reverse_resolve(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<AddressCandidate>, AddressError> {
        debug!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "simulated reverse geocode"
        );
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plays_script_to_a_late_subscriber() {
        let coordinate = Coordinate::new(12.0, 34.0);
        let service = SimulatedPositionService::fixed(coordinate);
        let subscription = service
            .start(PositionRequestOptions::default())
            .await
            .expect("start");
        let mut events = subscription.subscribe();

        let first = events.recv().await.expect("first event");
        assert!(matches!(first, PositionEvent::Failed(ref e) if e.is_transient()));

        let second = events.recv().await.expect("second event");
        match second {
            PositionEvent::Batch(batch) => {
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].coordinate, coordinate);
            }
            other => panic!("expected a batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stop_aborts_playback() {
        let service = SimulatedPositionService::new(vec![
            ScriptStep::Delay(Duration::from_millis(200)),
            ScriptStep::Batch(vec![PositionFix::new(Coordinate::new(1.0, 2.0))]),
        ]);
        let subscription = service
            .start(PositionRequestOptions::default())
            .await
            .expect("start");
        let mut events = subscription.subscribe();

        subscription.stop();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn disabled_source_refuses_to_start() {
        let service = SimulatedPositionService::disabled();
        let error = service
            .start(PositionRequestOptions::default())
            .await
            .err()
            .expect("start should fail");
        assert_eq!(error.kind, PositionErrorKind::ServicesDisabled);
    }
}
