//! # Connections Module
//!
//! This module handles persistent connections to external services,
//! currently the PostgreSQL database, plus the typed stores built on top
//! of the shared pool.

/// Module for PostgreSQL database connection pooling and management.
pub mod db_postgres;

/// Typed access layer for parcel rows.
pub mod parcels;

/// Typed access layer for user accounts.
pub mod users;

pub use db_postgres::{Database, DbError};
pub use parcels::{NewParcel, Parcel, ParcelStore, ParcelTracking};
pub use users::{User, UserStore};
