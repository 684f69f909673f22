//! Support modules for the parcel API binary.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
