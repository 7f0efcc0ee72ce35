//! Clinic settings endpoints.

use axum::{extract::Extension, Json};
use molar_clinic::settings::{self, Setting};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{require_admin, AuthContext};
use crate::{run_db, AppState};

/// Handler for `GET /api/settings`.
pub async fn list_settings_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Setting>>, ApiError> {
    let list = run_db(state, move |conn| {
        settings::list_settings(conn).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `PUT /api/settings`. Admin only.
///
/// Takes a flat `{key: value}` object and upserts the whole batch in one
/// transaction, then returns the full settings list.
pub async fn put_settings_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<BTreeMap<String, String>>,
) -> Result<Json<Vec<Setting>>, ApiError> {
    require_admin(&ctx)?;
    if payload.is_empty() {
        return Err(ApiError::BadRequest("no settings provided".to_string()));
    }
    if payload.keys().any(|key| key.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "setting keys must not be empty".to_string(),
        ));
    }

    let list = run_db(state, move |conn| {
        let entries: Vec<(String, String)> = payload.into_iter().collect();
        settings::put_settings(conn, &entries)?;
        settings::list_settings(conn).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}
