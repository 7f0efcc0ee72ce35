//! HS256 session tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use molar_types::Role;
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Claims carried by a session token.
///
/// The role is a convenience for the client; the server re-checks the user
/// row on every request, so a stale role or a deactivated account loses
/// access as soon as the row changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (`users.id`).
    pub sub: i64,
    pub username: String,
    pub role: Role,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues a signed session token valid for `ttl_minutes`.
pub fn issue_token(
    secret: &str,
    user_id: i64,
    username: &str,
    role: Role,
    ttl_minutes: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// Verifies a token's signature and expiry and returns its claims.
///
/// Expiry is reported as [`AuthError::TokenExpired`] so callers can tell a
/// stale session from a forged one.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(e.to_string()),
    })
}
