//! Treatment-type catalogue endpoints.

use axum::http::StatusCode;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use molar_clinic::catalog::{self, NewTreatmentType, TreatmentType, UpdateTreatmentTypeParams};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{require_admin, AuthContext};
use crate::{run_db, AppState};

/// Query parameters for `GET /api/treatment-types`.
#[derive(Debug, Deserialize)]
pub struct CatalogListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Handler for `GET /api/treatment-types`.
pub async fn list_types_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<Vec<TreatmentType>>, ApiError> {
    let list = run_db(state, move |conn| {
        catalog::list_treatment_types(conn, query.include_inactive).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `POST /api/treatment-types`. Admin only.
pub async fn create_type_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewTreatmentType>,
) -> Result<(StatusCode, Json<TreatmentType>), ApiError> {
    require_admin(&ctx)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    if payload.default_duration_minutes <= 0 {
        return Err(ApiError::BadRequest(
            "default_duration_minutes must be positive".to_string(),
        ));
    }

    let entry = run_db(state, move |conn| {
        catalog::create_treatment_type(conn, &payload).map_err(ApiError::from)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for `GET /api/treatment-types/{id}`.
pub async fn get_type_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TreatmentType>, ApiError> {
    let entry = run_db(state, move |conn| {
        catalog::get_treatment_type(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(entry))
}

/// Handler for `PUT /api/treatment-types/{id}`. Admin only.
pub async fn update_type_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(updates): Json<UpdateTreatmentTypeParams>,
) -> Result<Json<TreatmentType>, ApiError> {
    require_admin(&ctx)?;
    if updates.default_duration_minutes.is_some_and(|m| m <= 0) {
        return Err(ApiError::BadRequest(
            "default_duration_minutes must be positive".to_string(),
        ));
    }

    let entry = run_db(state, move |conn| {
        catalog::update_treatment_type(conn, id, &updates)?;
        catalog::get_treatment_type(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(entry))
}
