//! # Stream Session
//!
//! Mutable state owned by one open stream connection. Sessions are never
//! shared: each connection gets its own, created on connect and dropped on
//! disconnect, so the engine needs no locking.

use crate::geo::Coordinates;

use super::payload::TrackingPayload;

/// Per-connection state carried between poll cycles.
#[derive(Debug, Default)]
pub struct StreamSession {
    /// The last payload actually emitted as a data event.
    pub last_payload: Option<TrackingPayload>,
    /// Destination string seen on the previous cycle.
    pub last_destination: Option<String>,
    /// Cached coordinates for `last_destination`. Invalidated only when the
    /// destination string changes.
    pub destination_coords: Option<Coordinates>,
}
