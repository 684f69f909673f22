//! # Geoapify Client
//!
//! Thin adapter over the Geoapify geocoding and routing APIs.
//!
//! ## Key Design Principles:
//! - **Soft failures**: both operations return `Option`; no error ever
//!   crosses this boundary. A failed call simply means no coordinates (or no
//!   route) this time around.
//! - **Bounded timeouts**: a single shared `reqwest::Client` carries an 8
//!   second request timeout, so no call site can stall indefinitely.
//! - **No retries**: callers that poll (the tracking stream) implicitly retry
//!   on their next cycle; one-shot callers surface the miss to the client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request timeout applied to every Geoapify call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

const GEOCODE_URL: &str = "https://api.geoapify.com/v1/geocode/search";
const ROUTING_URL: &str = "https://api.geoapify.com/v1/routing";

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Distance and ETA between two coordinate pairs, as reported by the
/// routing API and normalized for client consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteDetails {
    /// Driving distance in kilometers, rounded to 2 decimals.
    pub distance_km: f64,
    /// Estimated travel time in whole minutes, never less than 1.
    pub eta_minutes: i64,
}

/// Seam for the tracking engine: anything that can resolve free-text
/// locations and routes. `GeoapifyClient` is the production implementation;
/// tests substitute counting doubles.
#[allow(async_fn_in_trait)]
pub trait GeoResolver {
    /// Resolves a free-text location to coordinates. `None` on any failure
    /// or when the provider returns no match.
    async fn geocode(&self, location: &str) -> Option<Coordinates>;

    /// Resolves driving distance and ETA between two coordinate pairs.
    async fn route(&self, origin: Coordinates, dest: Coordinates) -> Option<RouteDetails>;
}

/// # Geoapify Client
///
/// Shared HTTP client for the Geoapify APIs. Cheap to clone; the underlying
/// `reqwest::Client` is reference-counted.
#[derive(Clone)]
pub struct GeoapifyClient {
    client: reqwest::Client,
    api_key: String,
}

impl GeoapifyClient {
    /// Creates a client with the shared request timeout.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(), // Fallback to a default client if builder fails.
            api_key,
        }
    }

    async fn fetch_features(&self, url: &str, query: &[(&str, &str)]) -> Option<FeatureCollection> {
        let response = match self
            .client
            .get(url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Geoapify request to {url} failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Geoapify request to {url} returned {}", response.status());
            return None;
        }

        match response.json::<FeatureCollection>().await {
            Ok(fc) => Some(fc),
            Err(e) => {
                debug!("Geoapify response from {url} was malformed: {e}");
                None
            }
        }
    }
}

impl GeoResolver for GeoapifyClient {
    async fn geocode(&self, location: &str) -> Option<Coordinates> {
        if location.is_empty() {
            return None;
        }
        let fc = self.fetch_features(GEOCODE_URL, &[("text", location)]).await?;
        coordinates_from(&fc)
    }

    async fn route(&self, origin: Coordinates, dest: Coordinates) -> Option<RouteDetails> {
        // Geoapify expects waypoints as lat,lon pairs separated by '|'.
        let waypoints = format!("{},{}|{},{}", origin.lat, origin.lon, dest.lat, dest.lon);
        let fc = self
            .fetch_features(ROUTING_URL, &[("waypoints", waypoints.as_str()), ("mode", "drive")])
            .await?;
        route_from(&fc)
    }
}

// --- Response models -------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    properties: Option<RouteProperties>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: [lon, lat].
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    /// Route length in meters.
    distance: Option<f64>,
    /// Travel time in seconds.
    time: Option<f64>,
}

/// Extracts the first feature's coordinates from a geocoding response.
pub(crate) fn coordinates_from(fc: &FeatureCollection) -> Option<Coordinates> {
    let geometry = fc.features.first()?.geometry.as_ref()?;
    match geometry.coordinates.as_slice() {
        [lon, lat, ..] => Some(Coordinates { lat: *lat, lon: *lon }),
        _ => None,
    }
}

/// Extracts distance/ETA from a routing response and applies the
/// normalization rules: kilometers rounded to 2 decimals, minutes floored
/// but never below 1.
pub(crate) fn route_from(fc: &FeatureCollection) -> Option<RouteDetails> {
    let properties = fc.features.first()?.properties.as_ref()?;
    let meters = properties.distance?;
    let seconds = properties.time?;
    Some(RouteDetails {
        distance_km: round_km(meters),
        eta_minutes: eta_minutes(seconds),
    })
}

/// meters / 1000, rounded to 2 decimals.
pub(crate) fn round_km(meters: f64) -> f64 {
    (meters / 1000.0 * 100.0).round() / 100.0
}

/// seconds / 60, truncated, floored at 1 minute so very short routes never
/// report zero.
pub(crate) fn eta_minutes(seconds: f64) -> i64 {
    ((seconds / 60.0) as i64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FeatureCollection {
        serde_json::from_str(json).expect("fixture should parse")
    }

    #[test]
    fn geocode_response_yields_lat_lon() {
        let fc = parse(
            r#"{"features":[{"geometry":{"coordinates":[36.8219,-1.2921]},
                "properties":{}}]}"#,
        );
        let coords = coordinates_from(&fc).unwrap();
        assert_eq!(coords.lon, 36.8219);
        assert_eq!(coords.lat, -1.2921);
    }

    #[test]
    fn empty_feature_list_is_a_soft_failure() {
        let fc = parse(r#"{"features":[]}"#);
        assert!(coordinates_from(&fc).is_none());
        assert!(route_from(&fc).is_none());
    }

    #[test]
    fn missing_geometry_is_a_soft_failure() {
        let fc = parse(r#"{"features":[{"properties":{"distance":1200.0}}]}"#);
        assert!(coordinates_from(&fc).is_none());
    }

    #[test]
    fn route_distance_is_rounded_to_two_decimals() {
        let fc = parse(
            r#"{"features":[{"properties":{"distance":12341.0,"time":600.0}}]}"#,
        );
        let route = route_from(&fc).unwrap();
        assert_eq!(route.distance_km, 12.34);
        assert_eq!(route.eta_minutes, 10);
    }

    #[test]
    fn eta_never_reports_zero_minutes() {
        let fc = parse(r#"{"features":[{"properties":{"distance":50.0,"time":10.0}}]}"#);
        assert_eq!(route_from(&fc).unwrap().eta_minutes, 1);
    }

    #[test]
    fn eta_is_truncated_not_rounded() {
        assert_eq!(eta_minutes(119.0), 1);
        assert_eq!(eta_minutes(120.0), 2);
        assert_eq!(eta_minutes(179.9), 2);
    }
}
