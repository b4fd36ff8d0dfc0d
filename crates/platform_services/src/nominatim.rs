//! Reverse geocoding against a Nominatim-compatible HTTP endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use location_core::services::GeocodingService;
use shared::{
    domain::{AddressCandidate, Coordinate},
    error::{AddressError, AddressErrorKind},
};

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";
const DEFAULT_USER_AGENT: &str = "geofix/0.1 (desktop location finder)";

pub struct NominatimGeocodingService {
    http: Client,
    endpoint: Url,
}

impl NominatimGeocodingService {
    pub fn new(endpoint: Url, user_agent: &str) -> anyhow::Result<Self> {
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { http, endpoint })
    }

    /// The public OpenStreetMap endpoint with the default User-Agent.
    pub fn public() -> anyhow::Result<Self> {
        Self::new(Url::parse(DEFAULT_ENDPOINT)?, DEFAULT_USER_AGENT)
    }
}

#[derive(Debug, Deserialize)]
struct ReversePayload {
    #[serde(default)]
    address: Option<ReverseAddress>,
    /// Nominatim reports "Unable to geocode" here instead of an HTTP error.
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReverseAddress {
    house_number: Option<String>,
    road: Option<String>,
    pedestrian: Option<String>,
    village: Option<String>,
    town: Option<String>,
    city: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl ReverseAddress {
    fn into_candidate(self) -> AddressCandidate {
        AddressCandidate {
            house_number: self.house_number,
            street: self.road.or(self.pedestrian),
            locality: self.city.or(self.town).or(self.village).or(self.municipality),
            region: self.state,
            postal_code: self.postcode,
            country: self.country,
        }
    }
}

#[async_trait]
impl GeocodingService for NominatimGeocodingService {
    async fn reverse_resolve(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<AddressCandidate>, AddressError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &coordinate.latitude.to_string())
            .append_pair("lon", &coordinate.longitude.to_string());

        debug!(%url, "reverse geocoding");
        let response = self.http.get(url).send().await.map_err(|err| {
            AddressError::new(
                AddressErrorKind::Network,
                format!("reverse geocode request failed: {err}"),
            )
        })?;
        let response = response.error_for_status().map_err(|err| {
            AddressError::new(
                AddressErrorKind::Network,
                format!("reverse geocode rejected: {err}"),
            )
        })?;
        let payload: ReversePayload = response.json().await.map_err(|err| {
            AddressError::new(
                AddressErrorKind::Internal,
                format!("malformed reverse geocode payload: {err}"),
            )
        })?;

        if let Some(error) = payload.error {
            return Err(AddressError::new(
                AddressErrorKind::Internal,
                format!("geocoder error: {error}"),
            ));
        }
        Ok(payload
            .address
            .map(|address| vec![address.into_candidate()])
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_a_full_payload_to_a_candidate() {
        let raw = r#"{
            "place_id": 137632303,
            "display_name": "400, Broad Street, Seattle, Washington, 98109, United States",
            "address": {
                "house_number": "400",
                "road": "Broad Street",
                "city": "Seattle",
                "state": "Washington",
                "postcode": "98109",
                "country": "United States",
                "country_code": "us"
            }
        }"#;
        let payload: ReversePayload = serde_json::from_str(raw).expect("parse");
        let candidate = payload.address.expect("address").into_candidate();
        assert_eq!(
            candidate,
            AddressCandidate {
                house_number: Some("400".into()),
                street: Some("Broad Street".into()),
                locality: Some("Seattle".into()),
                region: Some("Washington".into()),
                postal_code: Some("98109".into()),
                country: Some("United States".into()),
            }
        );
    }

    #[test]
    fn falls_back_across_locality_equivalents() {
        let raw = r#"{
            "address": {
                "road": "Dorfstrasse",
                "village": "Kleinort",
                "country": "Germany"
            }
        }"#;
        let payload: ReversePayload = serde_json::from_str(raw).expect("parse");
        let candidate = payload.address.expect("address").into_candidate();
        assert_eq!(candidate.locality, Some("Kleinort".into()));
        assert_eq!(candidate.street, Some("Dorfstrasse".into()));
        assert_eq!(candidate.house_number, None);
    }

    #[test]
    fn payload_without_address_yields_no_candidates() {
        let raw = r#"{"place_id": 1, "display_name": "Somewhere"}"#;
        let payload: ReversePayload = serde_json::from_str(raw).expect("parse");
        assert!(payload.address.is_none());
    }

    #[test]
    fn unable_to_geocode_is_reported_in_band() {
        let raw = r#"{"error": "Unable to geocode"}"#;
        let payload: ReversePayload = serde_json::from_str(raw).expect("parse");
        assert_eq!(payload.error.as_deref(), Some("Unable to geocode"));
    }
}
