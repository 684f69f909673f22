//! Router assembly. Prefixes mirror the public API surface: auth under
//! `/api/auth`, customer-facing parcel routes under `/api`, admin operations
//! under `/admin`, and uploaded images served statically from `/uploads`.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::parcel_logic::state::AppState;

pub mod admin;
pub mod auth;
pub mod parcels;
pub mod stream;

pub fn router(state: Arc<AppState>) -> Router {
    // The frontend is served from another origin, so CORS stays permissive.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/auth", auth::routes())
        .nest("/api", parcels::routes().merge(stream::routes()))
        .nest("/admin", admin::routes())
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(cors)
        .with_state(state)
}

/// Used by monitoring services to verify the process is responsive.
async fn health_handler() -> &'static str {
    "OK"
}
