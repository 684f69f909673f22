//! Registration and login. Field validation is done by hand on `Option`
//! fields so missing or empty values come back as a 400 with a message
//! rather than a framework rejection.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use lib_common::auth::{hash_password, verify_password};

use crate::parcel_logic::error::AppError;
use crate::parcel_logic::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Deserialize)]
struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(email), Some(password)) = (
        required(body.username),
        required(body.email),
        required(body.password),
    ) else {
        return Err(AppError::BadRequest(
            "Missing username, email, or password".to_string(),
        ));
    };

    if state.users.username_exists(&username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if state.users.email_exists(&email).await? {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let user_id = state.users.insert(&username, &email, &password_hash).await?;
    info!("Registered user {username} (id {user_id})");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (required(body.email), required(body.password)) else {
        return Err(AppError::BadRequest("Missing email or password".to_string()));
    };

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };
    if !verify_password(&password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = state.tokens.issue_access(user.id, user.is_admin)?;
    let refresh_token = state.tokens.issue_refresh(user.id)?;
    info!("User {} logged in", user.id);

    Ok(Json(json!({
        "message": "Login successful",
        "access_token": access_token,
        "refresh_token": refresh_token,
    })))
}
