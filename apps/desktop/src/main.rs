use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use url::Url;

use location_core::{
    services::{GeocodingService, PositionRequestOptions},
    LocationOrchestrator, OrchestratorSignal, RequestSnapshot,
};
use platform_services::{
    consent::StaticPermissionService,
    nominatim::NominatimGeocodingService,
    simulated::{SimulatedGeocodingService, SimulatedPositionService},
};
use shared::domain::{AddressCandidate, Coordinate, PermissionStatus};

const USER_AGENT: &str = "geofix/0.1 (headless harness)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PermissionArg {
    Granted,
    Denied,
    Restricted,
}

impl From<PermissionArg> for PermissionStatus {
    fn from(value: PermissionArg) -> Self {
        match value {
            PermissionArg::Granted => PermissionStatus::Granted,
            PermissionArg::Denied => PermissionStatus::Denied,
            PermissionArg::Restricted => PermissionStatus::Restricted,
        }
    }
}

#[derive(Parser, Debug)]
struct Args {
    /// Latitude reported by the simulated position source.
    #[arg(long, default_value_t = 47.6205, allow_negative_numbers = true)]
    latitude: f64,
    /// Longitude reported by the simulated position source.
    #[arg(long, default_value_t = -122.3493, allow_negative_numbers = true)]
    longitude: f64,
    /// Permission state to run the cycle under.
    #[arg(long, value_enum, default_value_t = PermissionArg::Granted)]
    permission: PermissionArg,
    /// Reverse geocode against this Nominatim-compatible endpoint instead
    /// of the built-in simulated geocoder.
    #[arg(long)]
    geocoder_url: Option<Url>,
    /// Seconds to wait for the request cycle to finish.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let permissions = Arc::new(StaticPermissionService::new(args.permission.into()));
    let positions = Arc::new(SimulatedPositionService::fixed(Coordinate::new(
        args.latitude,
        args.longitude,
    )));
    let geocoder: Arc<dyn GeocodingService> = match &args.geocoder_url {
        Some(url) => Arc::new(NominatimGeocodingService::new(url.clone(), USER_AGENT)?),
        None => Arc::new(SimulatedGeocodingService::with_candidate(
            AddressCandidate {
                house_number: Some("400".into()),
                street: Some("Broad Street".into()),
                locality: Some("Seattle".into()),
                region: Some("Washington".into()),
                postal_code: Some("98109".into()),
                country: Some("United States".into()),
            },
        )),
    };

    let handle = LocationOrchestrator::spawn(
        permissions,
        positions,
        geocoder,
        PositionRequestOptions::default(),
    );
    let mut snapshots = handle.subscribe_snapshots();
    let mut signals = handle.subscribe_signals();

    handle.toggle_request();

    let deadline = tokio::time::sleep(Duration::from_secs(args.timeout_secs));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => bail!("timed out waiting for the request cycle to finish"),
            signal = signals.recv() => {
                if matches!(signal, Ok(OrchestratorSignal::PermissionDenied)) {
                    println!("Location services are disabled for this profile.");
                    println!("Re-run with --permission granted to find a location.");
                    return Ok(());
                }
            }
            changed = snapshots.changed() => {
                changed.context("orchestrator stopped unexpectedly")?;
                let snapshot = snapshots.borrow_and_update().clone();
                if is_terminal(&snapshot) {
                    print_snapshot(&snapshot);
                    return Ok(());
                }
            }
        }
    }
}

fn is_terminal(snapshot: &RequestSnapshot) -> bool {
    snapshot.last_position_error.is_some()
        || snapshot.address.is_some()
        || snapshot.last_address_error.is_some()
}

fn print_snapshot(snapshot: &RequestSnapshot) {
    match snapshot.position {
        Some(coordinate) => {
            println!("Status:    New Location Detected!");
            println!("Latitude:  {:.8}", coordinate.latitude);
            println!("Longitude: {:.8}", coordinate.longitude);
        }
        None => {
            let status = match &snapshot.last_position_error {
                Some(error) => format!("Error getting location: {error}"),
                None => "Tap 'Find Location' to start".to_string(),
            };
            println!("Status:    {status}");
            println!("Latitude:  -");
            println!("Longitude: -");
        }
    }

    let address = if let Some(address) = &snapshot.address {
        address.to_string()
    } else if snapshot.is_resolving_address {
        "Searching for address...".to_string()
    } else if snapshot.last_address_error.is_some() {
        "Error finding a valid address".to_string()
    } else if snapshot.position.is_some() {
        "address not found".to_string()
    } else {
        "-".to_string()
    };
    println!("Address:");
    for line in address.lines() {
        println!("  {line}");
    }
}
