use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One position reading as delivered by a position source. The request
/// logic only consumes the coordinate; accuracy and timestamp ride along
/// for display and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub horizontal_accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            horizontal_accuracy_m: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    NotDetermined,
    Denied,
    Restricted,
    Granted,
}

impl PermissionStatus {
    pub fn allows_request(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// One structured result from a reverse-geocode lookup. Sub-fields are all
/// optional; a source fills in what it knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCandidate {
    pub house_number: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// The three display lines of a resolved postal address: street,
/// city/region/postal, country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLines {
    pub street: String,
    pub locality: String,
    pub country: String,
}

impl AddressLines {
    /// Assembles the display lines from a candidate. A present sub-field
    /// contributes its value plus separator, an absent one contributes
    /// nothing; separators stay even at line end.
    pub fn from_candidate(candidate: &AddressCandidate) -> Self {
        let mut street = String::new();
        if let Some(number) = &candidate.house_number {
            street.push_str(number);
            street.push(' ');
        }
        if let Some(name) = &candidate.street {
            street.push_str(name);
            street.push(' ');
        }

        let mut locality = String::new();
        if let Some(city) = &candidate.locality {
            locality.push_str(city);
            locality.push_str(", ");
        }
        if let Some(region) = &candidate.region {
            locality.push_str(region);
            locality.push(' ');
        }
        if let Some(postal) = &candidate.postal_code {
            locality.push_str(postal);
        }

        let country = candidate.country.clone().unwrap_or_default();

        Self {
            street,
            locality,
            country,
        }
    }
}

impl fmt::Display for AddressLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.street, self.locality, self.country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_candidate() -> AddressCandidate {
        AddressCandidate {
            house_number: Some("123".into()),
            street: Some("Test Street".into()),
            locality: Some("CityName".into()),
            region: Some("State".into()),
            postal_code: Some("98101".into()),
            country: Some("USA".into()),
        }
    }

    #[test]
    fn assembles_all_sub_fields_with_separators() {
        let lines = AddressLines::from_candidate(&full_candidate());
        assert_eq!(lines.street, "123 Test Street ");
        assert_eq!(lines.locality, "CityName, State 98101");
        assert_eq!(lines.country, "USA");
    }

    #[test]
    fn omits_absent_sub_fields_without_placeholders() {
        let candidate = AddressCandidate {
            street: Some("1 Main".into()),
            locality: Some("Springfield".into()),
            country: Some("USA".into()),
            ..Default::default()
        };
        let lines = AddressLines::from_candidate(&candidate);
        assert_eq!(lines.to_string(), "1 Main \nSpringfield, \nUSA");
    }

    #[test]
    fn empty_candidate_yields_empty_lines() {
        let lines = AddressLines::from_candidate(&AddressCandidate::default());
        assert_eq!(lines.to_string(), "\n\n");
    }

    #[test]
    fn locality_line_keeps_order_city_region_postal() {
        let candidate = AddressCandidate {
            region: Some("WA".into()),
            postal_code: Some("98101".into()),
            ..Default::default()
        };
        let lines = AddressLines::from_candidate(&candidate);
        assert_eq!(lines.locality, "WA 98101");
    }
}
