//! # Parcel Routes
//!
//! Order creation (multipart with photo upload), listings, detail view,
//! destination changes, cancellation, route lookup, public quote and
//! contact endpoints, and the Stripe payment-intent handshake.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use lib_common::connections::{NewParcel, Parcel};
use lib_common::geo::GeoResolver;
use lib_common::mailer::templates;
use lib_common::utils::{round2, stored_upload_name};

use crate::parcel_logic::error::AppError;
use crate::parcel_logic::extract::AuthUser;
use crate::parcel_logic::state::AppState;

const QUOTE_BASE_FEE: f64 = 5.0;
const QUOTE_PRICE_PER_KM: f64 = 0.75;
const QUOTE_PRICE_PER_KG: f64 = 1.50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parcels", post(create_parcel).get(get_user_parcels))
        .route("/parcels/{parcel_id}", get(get_parcel_details))
        .route(
            "/parcels/{parcel_id}/destination",
            patch(change_parcel_destination),
        )
        .route("/parcels/{parcel_id}/cancel", patch(cancel_parcel_order))
        .route("/parcels/{parcel_id}/route", get(get_parcel_route_details))
        .route("/quote", post(get_shipping_quote))
        .route("/contact", post(handle_contact_form))
        .route("/create-payment-intent", post(create_payment))
        .route("/stripe-webhook", post(stripe_webhook))
}

/// Parcel row shaped for API responses: image filenames expanded to
/// `/uploads/...` paths and the timestamp in RFC 3339.
#[derive(Serialize)]
pub struct ParcelResponse {
    pub id: i32,
    pub user_id: i32,
    pub recipient_name: String,
    pub pickup_location: String,
    pub destination: String,
    pub weight: f64,
    pub status: String,
    pub present_location: Option<String>,
    pub created_at: String,
    pub sender_phone: Option<String>,
    pub recipient_phone: Option<String>,
    pub estimated_cost: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub parcel_image_url: Option<String>,
    pub proof_of_delivery_image_url: Option<String>,
}

fn full_image_url(filename: Option<String>) -> Option<String> {
    filename
        .filter(|f| !f.is_empty())
        .map(|f| format!("/uploads/{f}"))
}

impl From<Parcel> for ParcelResponse {
    fn from(parcel: Parcel) -> Self {
        Self {
            id: parcel.id,
            user_id: parcel.user_id,
            recipient_name: parcel.recipient_name,
            pickup_location: parcel.pickup_location,
            destination: parcel.destination,
            weight: parcel.weight,
            status: parcel.status,
            present_location: parcel.present_location,
            created_at: parcel.created_at.to_rfc3339(),
            sender_phone: parcel.sender_phone,
            recipient_phone: parcel.recipient_phone,
            estimated_cost: parcel.estimated_cost,
            shipping_cost: parcel.shipping_cost,
            parcel_image_url: full_image_url(parcel.parcel_image_url),
            proof_of_delivery_image_url: full_image_url(parcel.proof_of_delivery_image_url),
        }
    }
}

/// Accepts a number or a numeric string, the way form values arrive.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Checks that every required order field arrived and that the numeric ones
/// parse. Returns (weight, estimated_cost, shipping_cost).
fn validate_order_fields(fields: &HashMap<String, String>) -> Result<(f64, f64, f64), AppError> {
    let required = [
        "recipient_name",
        "pickup_location",
        "destination",
        "weight",
        "sender_phone",
        "recipient_phone",
        "estimated_cost",
        "shipping_cost",
    ];
    if !required.iter().all(|f| fields.contains_key(*f)) {
        return Err(AppError::BadRequest(
            "Missing required fields in form data".to_string(),
        ));
    }

    let parse = |key: &str| fields.get(key).and_then(|v| v.parse::<f64>().ok());
    let (Some(weight), Some(estimated_cost), Some(shipping_cost)) = (
        parse("weight"),
        parse("estimated_cost"),
        parse("shipping_cost"),
    ) else {
        return Err(AppError::BadRequest(
            "Weight, insured value, and shipping cost must be valid numbers.".to_string(),
        ));
    };
    Ok((weight, estimated_cost, shipping_cost))
}

async fn create_parcel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut pending_image: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "parcel_image" {
            let original_name = field.file_name().unwrap_or_default().to_string();
            if original_name.is_empty() {
                return Err(AppError::BadRequest(
                    "No selected file for parcel image".to_string(),
                ));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
            pending_image = Some((original_name, bytes));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed form data: {e}")))?;
            fields.insert(name, value);
        }
    }

    let Some((original_name, image_bytes)) = pending_image else {
        return Err(AppError::BadRequest(
            "Parcel image file is required".to_string(),
        ));
    };
    let (weight, estimated_cost, shipping_cost) = validate_order_fields(&fields)?;

    // Nothing touches the upload dir until the whole order is valid, so a
    // rejected request leaves no orphaned file behind.
    let parcel_image_url = stored_upload_name(&original_name);
    tokio::fs::write(state.upload_dir.join(&parcel_image_url), &image_bytes).await?;

    let new_parcel = NewParcel {
        user_id: user.id,
        recipient_name: fields.remove("recipient_name").unwrap_or_default(),
        pickup_location: fields.remove("pickup_location").unwrap_or_default(),
        destination: fields.remove("destination").unwrap_or_default(),
        weight,
        sender_phone: fields.remove("sender_phone"),
        recipient_phone: fields.remove("recipient_phone"),
        estimated_cost: Some(estimated_cost),
        shipping_cost: Some(shipping_cost),
        parcel_image_url: Some(parcel_image_url),
    };
    let parcel_id = state.parcels.insert(&new_parcel).await?;
    info!("User {} created parcel {parcel_id}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Parcel order created successfully",
            "parcel_id": parcel_id,
        })),
    ))
}

async fn get_user_parcels(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let parcels: Vec<ParcelResponse> = state
        .parcels
        .list_for_user(user.id)
        .await?
        .into_iter()
        .map(ParcelResponse::from)
        .collect();
    Ok(Json(json!({ "parcels": parcels })))
}

/// Loads a parcel and enforces the owner-or-admin rule shared by the
/// detail, route, and stream endpoints.
pub async fn fetch_owned_parcel(
    state: &AppState,
    parcel_id: i32,
    user: AuthUser,
) -> Result<Parcel, AppError> {
    let Some(parcel) = state.parcels.fetch(parcel_id).await? else {
        return Err(AppError::NotFound("Parcel not found".to_string()));
    };
    if parcel.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "Access forbidden: You do not own this parcel".to_string(),
        ));
    }
    Ok(parcel)
}

async fn get_parcel_details(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(parcel_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let parcel = fetch_owned_parcel(&state, parcel_id, user).await?;
    Ok(Json(ParcelResponse::from(parcel)))
}

#[derive(Deserialize)]
struct DestinationRequest {
    destination: Option<String>,
}

async fn change_parcel_destination(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(parcel_id): Path<i32>,
    Json(body): Json<DestinationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(parcel) = state.parcels.fetch(parcel_id).await? else {
        return Err(AppError::NotFound("Parcel not found".to_string()));
    };
    // Admins do not get to redirect someone else's order.
    if parcel.user_id != user.id {
        return Err(AppError::Forbidden(
            "Access forbidden: You do not own this parcel".to_string(),
        ));
    }
    if parcel.status == "Delivered" {
        return Err(AppError::BadRequest(
            "Cannot change destination of a delivered parcel".to_string(),
        ));
    }
    let Some(destination) = body.destination else {
        return Err(AppError::BadRequest(
            "New destination is required".to_string(),
        ));
    };

    state
        .parcels
        .update_destination(parcel_id, &destination)
        .await?;
    Ok(Json(json!({
        "message": "Parcel destination updated successfully"
    })))
}

async fn cancel_parcel_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(parcel_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let Some(parcel) = state.parcels.fetch(parcel_id).await? else {
        return Err(AppError::NotFound("Parcel not found".to_string()));
    };
    if parcel.user_id != user.id {
        return Err(AppError::Forbidden(
            "Access forbidden: You do not own this parcel".to_string(),
        ));
    }
    if parcel.status == "Delivered" {
        return Err(AppError::BadRequest(
            "Cannot cancel a delivered parcel".to_string(),
        ));
    }

    state.parcels.update_status(parcel_id, "Cancelled").await?;
    Ok(Json(json!({ "message": "Parcel order has been cancelled" })))
}

async fn get_parcel_route_details(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(parcel_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let parcel = fetch_owned_parcel(&state, parcel_id, user).await?;
    let Some(geo) = &state.geo else {
        return Err(AppError::ServiceUnavailable(
            "Route provider is not configured".to_string(),
        ));
    };

    let pickup = geo.geocode(&parcel.pickup_location).await;
    let destination = geo.geocode(&parcel.destination).await;
    let (Some(pickup), Some(destination)) = (pickup, destination) else {
        return Err(AppError::BadRequest(
            "Could not find coordinates for the provided locations. Please check the addresses."
                .to_string(),
        ));
    };

    let Some(route) = geo.route(pickup, destination).await else {
        return Err(AppError::BadGateway(
            "Could not calculate the route between the locations.".to_string(),
        ));
    };

    Ok(Json(json!({
        "distance_km": route.distance_km,
        "duration_minutes": route.eta_minutes,
        "pickup_coordinates": { "lat": pickup.lat, "lon": pickup.lon },
        "destination_coordinates": { "lat": destination.lat, "lon": destination.lon },
    })))
}

#[derive(Deserialize)]
struct QuoteRequest {
    weight: Option<Value>,
    pickup_location: Option<String>,
    destination: Option<String>,
}

async fn get_shipping_quote(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(weight_raw), Some(pickup_location), Some(destination)) = (
        body.weight,
        body.pickup_location.filter(|s| !s.is_empty()),
        body.destination.filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Weight, pickup, and destination are required".to_string(),
        ));
    };
    let Some(weight) = numeric(&weight_raw) else {
        return Err(AppError::BadRequest(
            "Weight must be a valid number".to_string(),
        ));
    };

    let Some(geo) = &state.geo else {
        return Err(AppError::ServiceUnavailable(
            "Route provider is not configured".to_string(),
        ));
    };

    let pickup = geo.geocode(&pickup_location).await;
    let dest = geo.geocode(&destination).await;
    let (Some(pickup), Some(dest)) = (pickup, dest) else {
        return Err(AppError::BadRequest(
            "Could not calculate route. Please check addresses.".to_string(),
        ));
    };
    let Some(route) = geo.route(pickup, dest).await else {
        return Err(AppError::BadGateway(
            "Could not calculate distance between the locations.".to_string(),
        ));
    };

    let total_cost =
        QUOTE_BASE_FEE + route.distance_km * QUOTE_PRICE_PER_KM + weight * QUOTE_PRICE_PER_KG;

    Ok(Json(json!({
        "message": "Quote calculated successfully",
        "distance_km": route.distance_km,
        "calculated_cost": round2(total_cost),
    })))
}

#[derive(Deserialize)]
struct ContactRequest {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

async fn handle_contact_form(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(name), Some(email), Some(message)) = (
        body.name.filter(|s| !s.is_empty()),
        body.email.filter(|s| !s.is_empty()),
        body.message.filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Name, email, and message are required.".to_string(),
        ));
    };

    let (Some(mailer), Some(inbox)) = (&state.mailer, &state.contact_inbox) else {
        return Err(AppError::ServiceUnavailable(
            "Sorry, there was an error sending your message. Please try again later.".to_string(),
        ));
    };
    mailer.queue(templates::contact_message(inbox, &name, &email, &message));

    Ok(Json(json!({
        "message": "Your message has been sent successfully!"
    })))
}

#[derive(Deserialize)]
struct PaymentRequest {
    cost: Option<Value>,
}

async fn create_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(cost) = body.cost.as_ref().and_then(numeric) else {
        return Err(AppError::BadRequest("Missing payment amount".to_string()));
    };
    let Some(stripe) = &state.stripe else {
        return Err(AppError::ServiceUnavailable(
            "Payments are not configured".to_string(),
        ));
    };

    let amount_cents = (cost * 100.0) as i64;
    let intent = stripe.create_payment_intent(amount_cents, "usd").await?;
    info!(
        "Created payment intent {} for user {} ({amount_cents} cents)",
        intent.id, user.id
    );

    Ok(Json(json!({ "clientSecret": intent.client_secret })))
}

/// Acknowledges provider callbacks. Event verification and fulfilment are
/// handled out of band; this endpoint only keeps the provider from retrying.
async fn stripe_webhook(body: String) -> impl IntoResponse {
    match serde_json::from_str::<Value>(&body) {
        Ok(event) => {
            let kind = event["type"].as_str().unwrap_or("unknown");
            info!("Received Stripe webhook event: {kind}");
        }
        Err(_) => warn!("Received unparseable Stripe webhook payload"),
    }
    Json(json!({ "status": "success" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accepts_numbers_and_numeric_strings() {
        assert_eq!(numeric(&json!(12.5)), Some(12.5));
        assert_eq!(numeric(&json!("12.5")), Some(12.5));
        assert_eq!(numeric(&json!("not a number")), None);
        assert_eq!(numeric(&json!(null)), None);
    }

    #[test]
    fn image_urls_expand_to_upload_paths() {
        assert_eq!(
            full_image_url(Some("abc123_box.jpg".to_string())),
            Some("/uploads/abc123_box.jpg".to_string())
        );
        assert_eq!(full_image_url(Some(String::new())), None);
        assert_eq!(full_image_url(None), None);
    }

    #[test]
    fn quote_formula_matches_price_card() {
        let cost = QUOTE_BASE_FEE + 10.0 * QUOTE_PRICE_PER_KM + 2.0 * QUOTE_PRICE_PER_KG;
        assert_eq!(round2(cost), 15.5);
    }

    fn complete_order_fields() -> HashMap<String, String> {
        [
            ("recipient_name", "Jane"),
            ("pickup_location", "Depot A"),
            ("destination", "Harbor"),
            ("weight", "2.5"),
            ("sender_phone", "0700000001"),
            ("recipient_phone", "0700000002"),
            ("estimated_cost", "120.0"),
            ("shipping_cost", "14.75"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn complete_order_fields_parse() {
        let (weight, estimated, shipping) =
            validate_order_fields(&complete_order_fields()).unwrap();
        assert_eq!(weight, 2.5);
        assert_eq!(estimated, 120.0);
        assert_eq!(shipping, 14.75);
    }

    #[test]
    fn missing_order_field_is_rejected() {
        let mut fields = complete_order_fields();
        fields.remove("recipient_phone");
        let err = validate_order_fields(&fields).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn non_numeric_weight_is_rejected() {
        let mut fields = complete_order_fields();
        fields.insert("weight".to_string(), "heavy".to_string());
        let err = validate_order_fields(&fields).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
