//! # lib_common
//!
//! Shared library for the parcel delivery backend. Modules are folder-based
//! and feature-gated so binaries only compile the parts they use.
//!
//! ## Modules
//!
//! - **`auth`**: password hashing (bcrypt) and JWT issuance/verification.
//! - **`connections`**: PostgreSQL pool and the typed parcel/user stores.
//! - **`geo`**: Geoapify geocoding and routing adapters (soft-failure,
//!   bounded timeouts).
//! - **`tracking`**: the live parcel-tracking stream engine.
//! - **`mailer`**: queued email dispatch with an observable consumer task.
//! - **`payments`**: Stripe PaymentIntent client.
//! - **`utils`**: miscellaneous helpers.

// Declare the modules to re-export
#[cfg(feature = "auth")]
pub mod auth;
#[cfg(feature = "connections")]
pub mod connections;
#[cfg(feature = "geo")]
pub mod geo;
#[cfg(feature = "mailer")]
pub mod mailer;
#[cfg(feature = "payments")]
pub mod payments;
#[cfg(feature = "tracking")]
pub mod tracking;
#[cfg(feature = "utils")]
pub mod utils;
