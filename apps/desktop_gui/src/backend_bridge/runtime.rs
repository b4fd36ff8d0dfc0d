//! Backend worker: owns the tokio runtime, the service wiring, and the
//! orchestrator; forwards snapshots and signals to the UI event queue.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error};
use url::Url;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::UiEvent;
use location_core::{
    services::{GeocodingService, PermissionService, PositionRequestOptions},
    LocationOrchestrator, OrchestratorSignal,
};
use platform_services::{
    consent::ConsentFilePermissionService,
    nominatim::NominatimGeocodingService,
    simulated::{SimulatedGeocodingService, SimulatedPositionService},
};
use shared::domain::{AddressCandidate, Coordinate};

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "failed to build backend runtime: {err}"
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };
        runtime.block_on(run(settings, cmd_rx, ui_tx));
    });
}

async fn run(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let consent = Arc::new(ConsentFilePermissionService::load_or_default(
        settings.resolved_consent_path(),
    ));

    let geocoder: Arc<dyn GeocodingService> = if settings.use_network_geocoder {
        let endpoint = match Url::parse(&settings.geocoder_url) {
            Ok(url) => url,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "invalid geocoder url '{}': {err}",
                    settings.geocoder_url
                )));
                return;
            }
        };
        match NominatimGeocodingService::new(endpoint, &settings.geocoder_user_agent) {
            Ok(service) => Arc::new(service),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "failed to build geocoder client: {err:#}"
                )));
                return;
            }
        }
    } else {
        Arc::new(SimulatedGeocodingService::with_candidate(AddressCandidate {
            house_number: Some("400".into()),
            street: Some("Broad Street".into()),
            locality: Some("Seattle".into()),
            region: Some("Washington".into()),
            postal_code: Some("98109".into()),
            country: Some("United States".into()),
        }))
    };

    let positions = Arc::new(SimulatedPositionService::fixed(Coordinate::new(
        settings.simulated_latitude,
        settings.simulated_longitude,
    )));

    let permissions: Arc<dyn PermissionService> = consent.clone();
    let handle = LocationOrchestrator::spawn(
        permissions,
        positions,
        geocoder,
        PositionRequestOptions::default(),
    );

    let mut snapshots = handle.subscribe_snapshots();
    let mut signals = handle.subscribe_signals();
    let mut prompts = consent.subscribe_prompts();

    // The UI queue is crossbeam; bridge it onto the async select below.
    let (cmd_bridge_tx, mut cmd_bridge_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            if cmd_bridge_tx.send(cmd).is_err() {
                break;
            }
        }
    });

    // Paint the idle labels before the first user action.
    if !forward(&ui_tx, UiEvent::SnapshotUpdated(handle.snapshot())) {
        return;
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if !forward(&ui_tx, UiEvent::SnapshotUpdated(snapshot)) {
                    break;
                }
            }
            signal = signals.recv() => match signal {
                Ok(OrchestratorSignal::PermissionDenied) => {
                    if !forward(&ui_tx, UiEvent::PermissionDenied) {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            prompt = prompts.recv() => match prompt {
                Ok(()) => {
                    if !forward(&ui_tx, UiEvent::ConsentPromptRequested) {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            cmd = cmd_bridge_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    BackendCommand::ToggleRequest => handle.toggle_request(),
                    BackendCommand::RespondToConsent { granted } => {
                        if let Err(err) = consent.record_decision(granted) {
                            let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                                "failed to store consent decision: {err:#}"
                            )));
                        }
                    }
                }
            }
        }
    }
    debug!("backend worker loop ended");
}

/// False only when the UI side is gone and the worker should wind down.
fn forward(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    match ui_tx.try_send(event) {
        Ok(()) => true,
        // Queue pressure: drop the event, a later snapshot supersedes it.
        Err(TrySendError::Full(_)) => true,
        Err(TrySendError::Disconnected(_)) => false,
    }
}
