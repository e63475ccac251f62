//! Admin JWT authentication for the dashboard API

use axum::extract::FromRequestParts;
use http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::state::AppState;

/// JWT claims for admin sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin ID
    pub sub: String,
    pub username: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated admin, extracted from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin_id: i64,
    pub username: String,
}

/// Issue a token; returns it with its expiry in Unix milliseconds.
pub fn create_token(
    admin_id: i64,
    username: &str,
    secret: &str,
    ttl_hours: i64,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expires = now + chrono::Duration::hours(ttl_hours);
    let claims = AdminClaims {
        sub: admin_id.to_string(),
        username: username.to_string(),
        exp: expires.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, expires.timestamp_millis()))
}

/// Verify signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<AdminUser, AppError> {
    let data = jsonwebtoken::decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::token_expired(),
        _ => {
            tracing::debug!("JWT validation failed: {e}");
            AppError::invalid_token("Invalid token")
        }
    })?;

    let admin_id = data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Malformed token subject"))?;
    Ok(AdminUser {
        admin_id,
        username: data.claims.username,
    })
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AdminUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!(uri = %parts.uri, "Admin request without token");
                AppError::unauthorized()
            })?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

        let user = verify_token(token.trim(), &state.jwt_secret).inspect_err(|e| {
            tracing::warn!(uri = %parts.uri, code = %e.code, "Admin token rejected");
        })?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
