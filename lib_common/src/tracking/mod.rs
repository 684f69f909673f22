//! # Live Parcel-Tracking Stream
//!
//! Self-scheduling engine behind the `/parcels/{id}/stream` endpoint. One
//! engine task runs per open connection, re-reading parcel state every
//! cycle, enriching it with coordinates and route details when a geo
//! provider is configured, and emitting an event only when the assembled
//! payload actually changed.
//!
//! ## Key Design Principles:
//! - **Fresh reads**: parcel state is re-fetched from storage every cycle;
//!   this is the only way concurrent admin updates become visible.
//! - **Soft enrichment**: geocoding/routing misses never abort the loop,
//!   they just leave optional fields out of this cycle's payload.
//! - **Destination caching**: the destination's coordinates are re-resolved
//!   only when the destination string itself changes; this is the single
//!   caching rule in the engine.
//! - **Deduplication**: payloads are compared structurally against the last
//!   emitted one; an unchanged cycle produces a keepalive, not a data event.
//! - **Prompt cancellation**: a `CancellationToken` is checked at every
//!   suspension point so a disconnected client stops consuming provider
//!   quota within one cycle.

/// The per-cycle value object sent to clients.
pub mod payload;

/// Per-connection mutable state (dedup + destination cache).
pub mod session;

/// The polling loop itself.
pub mod engine;

pub use engine::{ParcelSource, TrackingEngine};
pub use payload::TrackingPayload;
pub use session::StreamSession;

/// One emission of the stream, in the order the loop computed it.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    /// The payload changed since the last emission.
    Data(TrackingPayload),
    /// Nothing changed this cycle; keeps idle connections alive.
    Keepalive,
    /// The parcel no longer exists; the stream is over.
    End,
}
