//! # Auth Module
//!
//! Password hashing and JWT handling. These are deliberately thin wrappers:
//! `bcrypt` owns the hashing scheme and `jsonwebtoken` owns token signing
//! and expiry validation. Route-level enforcement (owner vs admin) lives in
//! the server's extractors, not here.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the auth primitives.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Token could not be issued: {0}")]
    Issue(String),
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Claims carried by both access and refresh tokens. `is_admin` is only set
/// on access tokens; refresh tokens fall back to the serde default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Expiry as a Unix timestamp; validated on decode.
    pub exp: i64,
}

impl Claims {
    /// Parses the subject back into a user id.
    pub fn user_id(&self) -> Result<i32, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Hashes a plaintext password with the bcrypt default cost.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Constant result for bad hashes: a stored hash that cannot be parsed is
/// treated as a failed match, never an error to the caller.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// # Token Issuer
///
/// HS256 signer/verifier around a shared secret, with separate lifetimes
/// for access and refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: String, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        }
    }

    /// Short-lived token carrying the admin claim.
    pub fn issue_access(&self, user_id: i32, is_admin: bool) -> Result<String, AuthError> {
        self.issue(user_id, is_admin, self.access_ttl)
    }

    /// Long-lived token; identity only.
    pub fn issue_refresh(&self, user_id: i32) -> Result<String, AuthError> {
        self.issue(user_id, false, self.refresh_ttl)
    }

    fn issue(&self, user_id: i32, is_admin: bool, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            is_admin,
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Decodes and validates a bearer token (signature + expiry).
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_fails_closed() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn access_token_round_trip_keeps_claims() {
        let issuer = TokenIssuer::new("test-secret".into(), 50, 30);
        let token = issuer.issue_access(42, true).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert!(claims.is_admin);
    }

    #[test]
    fn refresh_token_has_no_admin_claim() {
        let issuer = TokenIssuer::new("test-secret".into(), 50, 30);
        let token = issuer.issue_refresh(42).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert!(!claims.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenIssuer::new("test-secret".into(), 50, 30);
        let other = TokenIssuer::new("other-secret".into(), 50, 30);
        let token = issuer.issue_access(7, false).unwrap();
        assert!(other.verify(&token).is_err());
    }
}
