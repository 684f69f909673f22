//! Admin routes: fleet-wide listing with filters, status and location
//! updates (each queueing an owner notification email), and proof-of-delivery
//! uploads. Every handler takes [`AdminUser`], so the admin check happens
//! before the body runs.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use lib_common::mailer::templates;
use lib_common::utils::stored_upload_name;

use super::parcels::ParcelResponse;
use crate::parcel_logic::error::AppError;
use crate::parcel_logic::extract::AdminUser;
use crate::parcel_logic::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parcels", get(get_all_parcels))
        .route("/parcels/{parcel_id}/status", patch(update_parcel_status))
        .route(
            "/parcels/{parcel_id}/location",
            patch(update_parcel_location),
        )
        .route("/parcels/{parcel_id}/proof", post(upload_proof_of_delivery))
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<String>,
    search: Option<String>,
}

async fn get_all_parcels(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let parcels: Vec<ParcelResponse> = state
        .parcels
        .list_all(query.status.as_deref(), query.search.as_deref())
        .await?
        .into_iter()
        .map(ParcelResponse::from)
        .collect();
    Ok(Json(json!({ "parcels": parcels })))
}

/// Queues a notification to the parcel owner. Lookup or queue failures are
/// logged and swallowed so the admin update itself still succeeds.
async fn notify_owner(
    state: &AppState,
    user_id: i32,
    build: impl FnOnce(&str, &str) -> lib_common::mailer::EmailMessage,
) {
    let Some(mailer) = &state.mailer else {
        return;
    };
    match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => mailer.queue(build(&user.email, &user.username)),
        Ok(None) => warn!("Parcel owner {user_id} no longer exists, skipping notification"),
        Err(e) => warn!("Could not load parcel owner {user_id} for notification: {e}"),
    }
}

#[derive(Deserialize)]
struct StatusRequest {
    status: Option<String>,
}

async fn update_parcel_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(parcel_id): Path<i32>,
    Json(body): Json<StatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(parcel) = state.parcels.fetch(parcel_id).await? else {
        return Err(AppError::NotFound("Parcel not found".to_string()));
    };
    let Some(status) = body.status else {
        return Err(AppError::BadRequest("Status is required".to_string()));
    };

    state.parcels.update_status(parcel_id, &status).await?;
    info!("Parcel {parcel_id} status set to {status}");

    notify_owner(&state, parcel.user_id, |email, username| {
        templates::status_update(email, username, parcel_id, &status)
    })
    .await;

    Ok(Json(json!({
        "message": format!("Parcel {parcel_id} status updated to {status}")
    })))
}

#[derive(Deserialize)]
struct LocationRequest {
    location: Option<String>,
}

async fn update_parcel_location(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(parcel_id): Path<i32>,
    Json(body): Json<LocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(parcel) = state.parcels.fetch(parcel_id).await? else {
        return Err(AppError::NotFound("Parcel not found".to_string()));
    };
    let Some(location) = body.location else {
        return Err(AppError::BadRequest("Location is required".to_string()));
    };

    state.parcels.update_location(parcel_id, &location).await?;
    info!("Parcel {parcel_id} location set to {location}");

    notify_owner(&state, parcel.user_id, |email, username| {
        templates::location_update(email, username, parcel_id, &location)
    })
    .await;

    Ok(Json(json!({
        "message": format!("Parcel {parcel_id} location updated to {location}")
    })))
}

async fn upload_proof_of_delivery(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(parcel_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    if state.parcels.fetch(parcel_id).await?.is_none() {
        return Err(AppError::NotFound("Parcel not found".to_string()));
    }

    let mut stored: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form data: {e}")))?
    {
        if field.name() != Some("proof_image") {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            return Err(AppError::BadRequest(
                "No selected file for proof image".to_string(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        let filename = stored_upload_name(&original_name);
        tokio::fs::write(state.upload_dir.join(&filename), &bytes).await?;
        stored = Some(filename);
    }

    let Some(filename) = stored else {
        return Err(AppError::BadRequest(
            "Proof image file is required".to_string(),
        ));
    };

    state.parcels.set_proof_image(parcel_id, &filename).await?;
    info!("Proof of delivery stored for parcel {parcel_id}");

    Ok(Json(json!({
        "message": "Proof of delivery uploaded successfully.",
        "proof_of_delivery_image_url": format!("/uploads/{filename}"),
    })))
}
