//! Pure mapping from a request snapshot to the four display strings.

use location_core::RequestSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLabels {
    pub status: String,
    pub latitude: String,
    pub longitude: String,
    pub address: String,
}

pub fn labels(snapshot: &RequestSnapshot) -> DisplayLabels {
    match snapshot.position {
        Some(coordinate) => DisplayLabels {
            status: "New Location Detected!".to_string(),
            latitude: format!("{:.8}", coordinate.latitude),
            longitude: format!("{:.8}", coordinate.longitude),
            address: address_text(snapshot),
        },
        None => DisplayLabels {
            status: status_without_position(snapshot),
            latitude: "-".to_string(),
            longitude: "-".to_string(),
            address: "-".to_string(),
        },
    }
}

fn status_without_position(snapshot: &RequestSnapshot) -> String {
    if let Some(error) = &snapshot.last_position_error {
        format!("Error getting location: {error}")
    } else if snapshot.is_requesting_position {
        "Searching for location...".to_string()
    } else {
        "Tap 'Find Location' to start".to_string()
    }
}

fn address_text(snapshot: &RequestSnapshot) -> String {
    if let Some(address) = &snapshot.address {
        address.to_string()
    } else if snapshot.is_resolving_address {
        "Searching for address...".to_string()
    } else if snapshot.last_address_error.is_some() {
        "Error finding a valid address".to_string()
    } else {
        "address not found".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use shared::{
        domain::{AddressCandidate, AddressLines, Coordinate},
        error::{AddressError, PositionError, PositionErrorKind},
    };

    fn snapshot_with_position() -> RequestSnapshot {
        RequestSnapshot {
            position: Some(Coordinate::new(12.0, 34.0)),
            ..RequestSnapshot::default()
        }
    }

    #[test]
    fn idle_screen_shows_placeholders() {
        let labels = labels(&RequestSnapshot::default());
        assert_eq!(labels.status, "Tap 'Find Location' to start");
        assert_eq!(labels.latitude, "-");
        assert_eq!(labels.longitude, "-");
        assert_eq!(labels.address, "-");
    }

    #[test]
    fn active_request_shows_search_status() {
        let snapshot = RequestSnapshot {
            is_requesting_position: true,
            ..RequestSnapshot::default()
        };
        assert_eq!(labels(&snapshot).status, "Searching for location...");
    }

    #[test]
    fn position_error_surfaces_in_status() {
        let snapshot = RequestSnapshot {
            last_position_error: Some(PositionError::new(
                PositionErrorKind::Network,
                "no network positioning available",
            )),
            ..RequestSnapshot::default()
        };
        let labels = labels(&snapshot);
        assert!(labels.status.starts_with("Error getting location:"));
        assert_eq!(labels.latitude, "-");
    }

    #[test]
    fn acquired_position_formats_eight_decimals() {
        let labels = labels(&snapshot_with_position());
        assert_eq!(labels.status, "New Location Detected!");
        assert_eq!(labels.latitude, "12.00000000");
        assert_eq!(labels.longitude, "34.00000000");
    }

    #[test]
    fn resolving_and_failure_address_texts() {
        let mut snapshot = snapshot_with_position();
        snapshot.is_resolving_address = true;
        assert_eq!(labels(&snapshot).address, "Searching for address...");

        snapshot.is_resolving_address = false;
        snapshot.last_address_error = Some(AddressError::empty_result());
        assert_eq!(labels(&snapshot).address, "Error finding a valid address");
    }

    #[test]
    fn resolved_address_renders_assembled_lines() {
        let mut snapshot = snapshot_with_position();
        snapshot.address = Some(AddressLines::from_candidate(&AddressCandidate {
            street: Some("1 Main".into()),
            locality: Some("Springfield".into()),
            country: Some("USA".into()),
            ..AddressCandidate::default()
        }));
        assert_eq!(labels(&snapshot).address, "1 Main \nSpringfield, \nUSA");
    }
}
