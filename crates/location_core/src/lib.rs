//! Request orchestration for the single-screen location finder: permission
//! gate, single-shot position acquisition, reverse-geocode follow-up, and
//! snapshot projection for the display layer.
//!
//! The orchestrator is a single actor: service results arrive as inbox
//! messages and are processed strictly in arrival order. Every message is
//! tagged with the request cycle it was issued under; messages from a
//! superseded cycle are dropped unprocessed, so a cancelled request stays
//! cancelled even for callbacks that were already queued.

use std::sync::Arc;

use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

pub mod services;
mod state;

pub use state::RequestSnapshot;

use crate::services::{
    GeocodingService, PermissionService, PositionEvent, PositionRequestOptions, PositionService,
    PositionSubscription,
};
use shared::{
    domain::{AddressCandidate, AddressLines, PermissionStatus, PositionFix},
    error::AddressError,
};
use state::RequestPhase;

/// Out-of-band signals for the display layer. Snapshot changes travel on
/// the watch channel instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorSignal {
    /// Location use is denied or restricted; present the modal alert.
    PermissionDenied,
}

enum OrchestratorMsg {
    Toggle,
    Position {
        cycle: u64,
        event: PositionEvent,
    },
    Geocoded {
        cycle: u64,
        result: Result<Vec<AddressCandidate>, AddressError>,
    },
}

/// Clonable front door to the orchestrator actor.
#[derive(Clone)]
pub struct OrchestratorHandle {
    inbox: mpsc::UnboundedSender<OrchestratorMsg>,
    snapshot_rx: watch::Receiver<RequestSnapshot>,
    signals: broadcast::Sender<OrchestratorSignal>,
}

impl OrchestratorHandle {
    /// User tap on the find-location control. Queued into the actor inbox;
    /// never blocks.
    pub fn toggle_request(&self) {
        if self.inbox.send(OrchestratorMsg::Toggle).is_err() {
            warn!("orchestrator inbox closed; toggle dropped");
        }
    }

    /// Latest immutable snapshot. Pure read, no side effects.
    pub fn snapshot(&self) -> RequestSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Change notifications for the snapshot.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<RequestSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe_signals(&self) -> broadcast::Receiver<OrchestratorSignal> {
        self.signals.subscribe()
    }
}

struct ActivePositionRequest {
    subscription: Arc<dyn PositionSubscription>,
    forward_task: JoinHandle<()>,
}

pub struct LocationOrchestrator {
    permissions: Arc<dyn PermissionService>,
    positions: Arc<dyn PositionService>,
    geocoder: Arc<dyn GeocodingService>,
    options: PositionRequestOptions,

    inbox: mpsc::UnboundedReceiver<OrchestratorMsg>,
    inbox_tx: mpsc::UnboundedSender<OrchestratorMsg>,
    snapshot_tx: watch::Sender<RequestSnapshot>,
    signals: broadcast::Sender<OrchestratorSignal>,

    phase: RequestPhase,
    active: Option<ActivePositionRequest>,
    cycle: u64,
}

impl LocationOrchestrator {
    /// Builds the actor and spawns its run loop onto the current runtime.
    pub fn spawn(
        permissions: Arc<dyn PermissionService>,
        positions: Arc<dyn PositionService>,
        geocoder: Arc<dyn GeocodingService>,
        options: PositionRequestOptions,
    ) -> OrchestratorHandle {
        let (orchestrator, handle) = Self::new(permissions, positions, geocoder, options);
        tokio::spawn(orchestrator.run());
        handle
    }

    pub fn new(
        permissions: Arc<dyn PermissionService>,
        positions: Arc<dyn PositionService>,
        geocoder: Arc<dyn GeocodingService>,
        options: PositionRequestOptions,
    ) -> (Self, OrchestratorHandle) {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(RequestSnapshot::default());
        let (signals, _) = broadcast::channel(16);
        let handle = OrchestratorHandle {
            inbox: inbox_tx.clone(),
            snapshot_rx,
            signals: signals.clone(),
        };
        let orchestrator = Self {
            permissions,
            positions,
            geocoder,
            options,
            inbox,
            inbox_tx,
            snapshot_tx,
            signals,
            phase: RequestPhase::Idle,
            active: None,
            cycle: 0,
        };
        (orchestrator, handle)
    }

    /// Processes inbox messages in arrival order. Runs for the life of the
    /// process; the actor owns a sender for its own service tasks, so the
    /// inbox never drains to closed.
    pub async fn run(mut self) {
        while let Some(msg) = self.inbox.recv().await {
            self.process(msg).await;
        }
    }

    async fn process(&mut self, msg: OrchestratorMsg) {
        match msg {
            OrchestratorMsg::Toggle => self.handle_toggle().await,
            OrchestratorMsg::Position { cycle, event } => {
                if cycle != self.cycle {
                    debug!(cycle, current = self.cycle, "dropping stale position event");
                    return;
                }
                match event {
                    PositionEvent::Batch(readings) => self.handle_position_batch(readings),
                    PositionEvent::Failed(error) => self.handle_position_failure(error),
                }
            }
            OrchestratorMsg::Geocoded { cycle, result } => {
                if cycle != self.cycle {
                    debug!(cycle, current = self.cycle, "dropping stale geocode result");
                    return;
                }
                self.handle_geocode_result(result);
            }
        }
    }

    async fn handle_toggle(&mut self) {
        match self.permissions.authorization_status() {
            PermissionStatus::NotDetermined => {
                debug!("authorization undetermined; requesting permission");
                if let Err(err) = self.permissions.request_authorization().await {
                    warn!("permission request failed: {err:#}");
                }
            }
            PermissionStatus::Denied | PermissionStatus::Restricted => {
                debug!("location use denied; signalling display layer");
                let _ = self.signals.send(OrchestratorSignal::PermissionDenied);
            }
            PermissionStatus::Granted => {
                if matches!(self.phase, RequestPhase::RequestingPosition) {
                    self.stop_active_request();
                } else {
                    self.start_request().await;
                }
            }
        }
    }

    fn stop_active_request(&mut self) {
        debug!("stopping active position request");
        self.detach_position_request();
        self.cycle += 1;
        self.set_phase(RequestPhase::Idle);
    }

    fn detach_position_request(&mut self) {
        if let Some(active) = self.active.take() {
            active.subscription.stop();
            active.forward_task.abort();
        }
    }

    async fn start_request(&mut self) {
        self.detach_position_request();
        self.cycle += 1;
        let cycle = self.cycle;
        match self.positions.start(self.options).await {
            Ok(subscription) => {
                let mut events = subscription.subscribe();
                let inbox = self.inbox_tx.clone();
                let forward_task = tokio::spawn(async move {
                    loop {
                        match events.recv().await {
                            Ok(event) => {
                                if inbox.send(OrchestratorMsg::Position { cycle, event }).is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(skipped, "position event stream lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                });
                self.active = Some(ActivePositionRequest {
                    subscription,
                    forward_task,
                });
                self.set_phase(RequestPhase::RequestingPosition);
            }
            Err(error) => {
                warn!("position request failed to start: {error}");
                self.set_phase(RequestPhase::PositionFailed { error });
            }
        }
    }

    fn handle_position_batch(&mut self, readings: Vec<PositionFix>) {
        if !matches!(self.phase, RequestPhase::RequestingPosition) {
            return;
        }
        let Some(position) = readings.into_iter().last() else {
            debug!("ignoring empty position batch");
            return;
        };
        // Single-shot: the first usable reading ends the position request.
        self.detach_position_request();
        debug!(
            latitude = position.coordinate.latitude,
            longitude = position.coordinate.longitude,
            "position acquired"
        );
        self.begin_address_resolution(position);
    }

    fn handle_position_failure(&mut self, error: shared::error::PositionError) {
        if !matches!(self.phase, RequestPhase::RequestingPosition) {
            return;
        }
        if error.is_transient() {
            debug!("transient position failure ignored: {error}");
            return;
        }
        warn!("position request failed: {error}");
        self.detach_position_request();
        self.set_phase(RequestPhase::PositionFailed { error });
    }

    fn begin_address_resolution(&mut self, position: PositionFix) {
        if matches!(self.phase, RequestPhase::ResolvingAddress { .. }) {
            return;
        }
        let cycle = self.cycle;
        let coordinate = position.coordinate;
        let geocoder = Arc::clone(&self.geocoder);
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = geocoder.reverse_resolve(coordinate).await;
            let _ = inbox.send(OrchestratorMsg::Geocoded { cycle, result });
        });
        self.set_phase(RequestPhase::ResolvingAddress { position });
    }

    fn handle_geocode_result(&mut self, result: Result<Vec<AddressCandidate>, AddressError>) {
        let RequestPhase::ResolvingAddress { position } = self.phase.clone() else {
            return;
        };
        let next = match result {
            Ok(candidates) => match candidates.into_iter().last() {
                Some(candidate) => {
                    debug!("address resolved");
                    RequestPhase::AddressResolved {
                        position,
                        address: AddressLines::from_candidate(&candidate),
                    }
                }
                None => {
                    warn!("reverse geocode returned no candidates");
                    RequestPhase::AddressFailed {
                        position,
                        error: AddressError::empty_result(),
                    }
                }
            },
            Err(error) => {
                warn!("reverse geocode failed: {error}");
                RequestPhase::AddressFailed { position, error }
            }
        };
        self.set_phase(next);
    }

    fn set_phase(&mut self, phase: RequestPhase) {
        self.phase = phase;
        self.snapshot_tx.send_replace(self.phase.snapshot());
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
