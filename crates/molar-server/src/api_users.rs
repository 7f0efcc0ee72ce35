//! Staff account endpoints.

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use molar_clinic::users::{self, UpdateUserParams, User};
use molar_types::Role;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{require_admin, AuthContext};
use crate::{run_db, AppState};

/// Query parameters for `GET /api/users`.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    /// Filter by role (`admin`, `doctor`, `staff`).
    pub role: Option<String>,
}

/// Handler for `GET /api/users`.
///
/// Any authenticated caller may list accounts; the rows never contain
/// credential material.
pub async fn list_users_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let role = match query.role.as_deref() {
        Some(value) => Some(
            Role::from_str(value)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown role: {value:?}")))?,
        ),
        None => None,
    };

    let list = run_db(state, move |conn| {
        users::list_users(conn, role).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `GET /api/users/{id}`.
pub async fn get_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = run_db(state, move |conn| {
        users::get_user(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(user))
}

/// Handler for `PATCH /api/users/{id}`. Admin only.
///
/// An admin cannot deactivate their own account; that would leave the
/// clinic with no way back in.
pub async fn update_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(updates): Json<UpdateUserParams>,
) -> Result<Json<User>, ApiError> {
    require_admin(&ctx)?;

    if id == ctx.user_id && updates.is_active == Some(false) {
        return Err(ApiError::BadRequest(
            "cannot deactivate your own account".to_string(),
        ));
    }

    let user = run_db(state, move |conn| {
        users::update_user(conn, id, &updates)?;
        users::get_user(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(user))
}
