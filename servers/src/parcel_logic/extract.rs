//! Bearer-token extractors. Handlers declare an [`AuthUser`] or
//! [`AdminUser`] parameter and the token check happens before the handler
//! body runs; rejections reuse [`AppError`] so the response shape matches
//! every other error.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::parcel_logic::error::AppError;
use crate::parcel_logic::state::AppState;

/// The authenticated caller, decoded from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i32,
    pub is_admin: bool,
}

/// An [`AuthUser`] that has additionally passed the admin check.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".to_string()))?;
        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(AuthUser {
            id: claims.user_id()?,
            is_admin: claims.is_admin,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("Admins only!".to_string()));
        }
        Ok(AdminUser(user))
    }
}
