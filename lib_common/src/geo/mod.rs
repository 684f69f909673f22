//! # Geo Module
//!
//! Clients for the external geocoding and routing provider (Geoapify).
//!
//! ## Purpose:
//! Every outbound call here is bounded by an explicit timeout and follows the
//! soft-failure policy: a network error, a non-2xx status, a malformed body
//! or an empty result set all collapse to `None`. Callers decide what `None`
//! means for them (the tracking stream simply omits enrichment fields; the
//! route and quote endpoints turn it into a client-facing message). No retry
//! logic lives at this boundary.
//!
//! ## Contained Modules:
//!
//! - **`geoapify`**: the `GeoapifyClient` with `geocode` and `route`
//!   operations, plus the `GeoResolver` trait that lets the tracking engine
//!   run against a test double.

/// Geoapify HTTP client and response parsing.
pub mod geoapify;

pub use geoapify::{Coordinates, GeoResolver, GeoapifyClient, RouteDetails};
