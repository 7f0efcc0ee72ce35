//! Request authentication.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use molar_clinic::users;
use molar_types::Role;
use std::sync::Arc;

use crate::error::ApiError;
use crate::{run_db, AppState};

/// The authenticated caller, stored in request extensions.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// Middleware to authenticate requests via `Authorization: Bearer`.
///
/// The token's signature and expiry are checked first, then the account row
/// itself: a deactivated account loses access immediately, even with a
/// still-valid token in hand.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let token =
        bearer_token(req.headers()).ok_or(ApiError::Unauthorized("missing bearer token"))?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(ApiError::Internal)?
        .clone();

    let claims = molar_auth::verify_token(&state.token_secret, &token)?;

    let user_id = claims.sub;
    let active = run_db(state, move |conn| {
        users::user_is_active(conn, user_id).map_err(ApiError::from)
    })
    .await?;
    if active != Some(true) {
        return Err(ApiError::Unauthorized("account is not active"));
    }

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

/// Guards an admin-only handler.
pub fn require_admin(ctx: &AuthContext) -> Result<(), ApiError> {
    if ctx.role != Role::Admin {
        return Err(ApiError::Forbidden("administrator role required"));
    }
    Ok(())
}
