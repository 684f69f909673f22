//! # Parcel Store
//!
//! Typed queries for the `parcels` table. Every read used by the tracking
//! stream goes through [`ParcelStore::fetch_tracking`], which always hits the
//! database so concurrent admin updates become visible on the next poll
//! cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPool;
use sqlx::QueryBuilder;

use super::db_postgres::DbError;

/// A full parcel row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Parcel {
    pub id: i32,
    pub user_id: i32,
    pub recipient_name: String,
    pub pickup_location: String,
    pub destination: String,
    pub weight: f64,
    pub status: String,
    pub present_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub proof_of_delivery_image_url: Option<String>,
    pub sender_phone: Option<String>,
    pub recipient_phone: Option<String>,
    /// Insured value declared by the sender.
    pub estimated_cost: Option<f64>,
    /// Stored filename of the parcel photo.
    pub parcel_image_url: Option<String>,
    /// Quoted shipping cost at order time.
    pub shipping_cost: Option<f64>,
}

/// Fields required to create a parcel order.
#[derive(Debug, Clone)]
pub struct NewParcel {
    pub user_id: i32,
    pub recipient_name: String,
    pub pickup_location: String,
    pub destination: String,
    pub weight: f64,
    pub sender_phone: Option<String>,
    pub recipient_phone: Option<String>,
    pub estimated_cost: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub parcel_image_url: Option<String>,
}

/// The subset of parcel state the tracking stream observes each cycle.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ParcelTracking {
    pub status: String,
    pub present_location: Option<String>,
    pub destination: Option<String>,
}

const PARCEL_COLUMNS: &str = "id, user_id, recipient_name, pickup_location, destination, weight, \
     status, present_location, created_at, updated_at, proof_of_delivery_image_url, \
     sender_phone, recipient_phone, estimated_cost, parcel_image_url, shipping_cost";

/// # Parcel Store
///
/// Cheap to clone; wraps the shared [`PgPool`].
#[derive(Clone)]
pub struct ParcelStore {
    pool: PgPool,
}

impl ParcelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new parcel order and returns its id. Status defaults to
    /// "Pending" at the database level.
    pub async fn insert(&self, new: &NewParcel) -> Result<i32, DbError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO parcels (user_id, recipient_name, pickup_location, destination, weight, \
             sender_phone, recipient_phone, estimated_cost, shipping_cost, parcel_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(new.user_id)
        .bind(&new.recipient_name)
        .bind(&new.pickup_location)
        .bind(&new.destination)
        .bind(new.weight)
        .bind(&new.sender_phone)
        .bind(&new.recipient_phone)
        .bind(new.estimated_cost)
        .bind(new.shipping_cost)
        .bind(&new.parcel_image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Fetches one parcel, or `None` when it does not exist.
    pub async fn fetch(&self, parcel_id: i32) -> Result<Option<Parcel>, DbError> {
        let parcel = sqlx::query_as::<_, Parcel>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE id = $1"
        ))
        .bind(parcel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(parcel)
    }

    /// Fresh read of the tracking-relevant columns. Used once per stream
    /// cycle; intentionally uncached.
    pub async fn fetch_tracking(&self, parcel_id: i32) -> Result<Option<ParcelTracking>, DbError> {
        let row = sqlx::query_as::<_, ParcelTracking>(
            "SELECT status, present_location, destination FROM parcels WHERE id = $1",
        )
        .bind(parcel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// All parcels belonging to one user, newest first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Parcel>, DbError> {
        let parcels = sqlx::query_as::<_, Parcel>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(parcels)
    }

    /// Admin listing with optional status filter and recipient-name search,
    /// newest first.
    pub async fn list_all(
        &self,
        status: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Parcel>, DbError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE 1 = 1"
        ));
        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(search) = search {
            builder
                .push(" AND recipient_name ILIKE ")
                .push_bind(format!("%{search}%"));
        }
        builder.push(" ORDER BY created_at DESC");

        let parcels = builder
            .build_query_as::<Parcel>()
            .fetch_all(&self.pool)
            .await?;
        Ok(parcels)
    }

    /// Updates the destination of an undelivered parcel.
    pub async fn update_destination(&self, parcel_id: i32, destination: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE parcels SET destination = $1, updated_at = now() WHERE id = $2")
            .bind(destination)
            .bind(parcel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sets the status string (admin operation).
    pub async fn update_status(&self, parcel_id: i32, status: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE parcels SET status = $1, updated_at = now() WHERE id = $2")
            .bind(status)
            .bind(parcel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sets the present location (admin operation).
    pub async fn update_location(&self, parcel_id: i32, location: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE parcels SET present_location = $1, updated_at = now() WHERE id = $2")
            .bind(location)
            .bind(parcel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records the stored filename of the proof-of-delivery photo.
    pub async fn set_proof_image(&self, parcel_id: i32, filename: &str) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE parcels SET proof_of_delivery_image_url = $1, updated_at = now() WHERE id = $2",
        )
        .bind(filename)
        .bind(parcel_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
