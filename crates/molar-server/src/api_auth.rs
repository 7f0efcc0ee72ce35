//! Login, account registration, and the current-user endpoint.

use axum::{extract::Extension, Json};
use molar_clinic::users::{self, NewUser, User};
use molar_types::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{require_admin, AuthContext};
use crate::{run_db, AppState};

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

/// Handler for `POST /api/auth/login`.
///
/// Unknown usernames, wrong passwords, and deactivated accounts all produce
/// the same response, so the endpoint does not leak which usernames exist.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let secret = state.token_secret.clone();
    let ttl_minutes = state.token_ttl_minutes;

    // Credential lookup and the password check both stay on the blocking
    // pool; verification is deliberately slow.
    let response = run_db(state, move |conn| {
        let creds = users::find_credentials(conn, &payload.username)?
            .filter(|creds| creds.is_active)
            .ok_or(ApiError::Unauthorized("invalid username or password"))?;

        if !molar_auth::verify_password(&payload.password, &creds.password_hash)? {
            return Err(ApiError::Unauthorized("invalid username or password"));
        }

        users::touch_last_login(conn, creds.id)?;
        let user = users::get_user(conn, creds.id)?;
        let token =
            molar_auth::issue_token(&secret, creds.id, &creds.username, creds.role, ttl_minutes)?;

        tracing::info!(user_id = creds.id, username = %creds.username, "user logged in");
        Ok(LoginResponse { token, user })
    })
    .await?;

    Ok(Json(response))
}

/// Handler for `POST /api/auth/register`. Admin only.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<User>), ApiError> {
    require_admin(&ctx)?;

    if payload.username.trim().len() < 3 {
        return Err(ApiError::BadRequest(
            "username must be at least 3 characters".to_string(),
        ));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest(
            "email must be a valid address".to_string(),
        ));
    }

    let user = run_db(state, move |conn| {
        let password_hash = molar_auth::hash_password(&payload.password)?;
        let user = users::create_user(
            conn,
            &NewUser {
                username: payload.username.trim().to_string(),
                email: payload.email,
                password_hash,
                full_name: payload.full_name,
                role: payload.role,
                specialization: payload.specialization,
                phone: payload.phone,
            },
        )?;
        tracing::info!(user_id = user.id, username = %user.username, role = user.role.as_str(), "account registered");
        Ok(user)
    })
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(user)))
}

/// Handler for `GET /api/auth/me`.
pub async fn me_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<User>, ApiError> {
    let user = run_db(state, move |conn| {
        users::get_user(conn, ctx.user_id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(user))
}
