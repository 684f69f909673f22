//! # Unified Handler Error Type
//!
//! Every handler returns `Result<_, AppError>`. Mapping to HTTP happens in
//! one place so status codes and the `{"message": ...}` body shape stay
//! consistent across the API. Infrastructure failures convert in via
//! `From`, so handlers can use `?` on store and auth calls directly.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use lib_common::auth::AuthError;
use lib_common::connections::DbError;
use lib_common::payments::PaymentError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Auth(AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            // A 400-class provider rejection means the client sent a bad
            // amount, not that the gateway is down.
            AppError::Payment(PaymentError::Api { status, .. }) if *status < 500 => {
                StatusCode::BAD_REQUEST
            }
            AppError::BadGateway(_) | AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details stay in the logs, not in the response body.
            AppError::Database(e) => {
                error!("Database failure: {e}");
                "An internal error occurred".to_string()
            }
            AppError::Io(e) => {
                error!("I/O failure: {e}");
                "An internal error occurred".to_string()
            }
            AppError::Auth(e) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("Auth failure: {e}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_rejection_surfaces_as_client_error() {
        let err = AppError::Payment(PaymentError::Api {
            status: 400,
            message: "Amount must be at least 50 cents".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_failures_stay_gateway_errors() {
        let transport = AppError::Payment(PaymentError::Http("request timed out".to_string()));
        assert_eq!(transport.into_response().status(), StatusCode::BAD_GATEWAY);

        let outage = AppError::Payment(PaymentError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        });
        assert_eq!(outage.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_errors_hide_detail_from_clients() {
        let err = AppError::Database(DbError::QueryError("relation missing".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
