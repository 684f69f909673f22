//! # Tracking Payload
//!
//! The ephemeral value object assembled once per poll cycle. It has no
//! identity beyond structural equality: the engine decides between a data
//! event and a keepalive by comparing the new payload to the previous one
//! with plain `==`, never by hashing.

use serde::Serialize;

use crate::geo::Coordinates;

/// Snapshot of everything the client sees about one parcel.
///
/// `status` and `present_location` are always serialized (the location may
/// be null); the enrichment fields are omitted entirely when a provider
/// call failed or no provider is configured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingPayload {
    pub status: String,
    pub present_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<i64>,
}

impl TrackingPayload {
    /// Base payload before any geo enrichment.
    pub fn new(status: String, present_location: Option<String>) -> Self {
        Self {
            status,
            present_location,
            current_coordinates: None,
            distance_km: None,
            eta_minutes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrichment_fields_are_skipped_when_absent() {
        let payload = TrackingPayload::new("In Transit".into(), Some("Nakuru".into()));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "In Transit");
        assert_eq!(json["present_location"], "Nakuru");
        assert!(json.get("current_coordinates").is_none());
        assert!(json.get("distance_km").is_none());
        assert!(json.get("eta_minutes").is_none());
    }

    #[test]
    fn present_location_serializes_as_null_when_unset() {
        let payload = TrackingPayload::new("Pending".into(), None);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["present_location"].is_null());
    }

    #[test]
    fn equality_is_structural() {
        let a = TrackingPayload::new("Pending".into(), None);
        let b = TrackingPayload::new("Pending".into(), None);
        assert_eq!(a, b);

        let mut c = b.clone();
        c.distance_km = Some(12.35);
        assert_ne!(a, c);
    }
}
