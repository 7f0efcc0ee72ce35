//! Treatment endpoints.

use axum::http::StatusCode;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use molar_clinic::treatments::{
    self, NewTreatment, Treatment, TreatmentFilter, UpdateTreatmentParams,
};
use molar_types::TreatmentStatus;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::{run_db, validate, AppState};

/// Query parameters for `GET /api/treatments`.
#[derive(Debug, Deserialize)]
pub struct TreatmentListQuery {
    pub patient: Option<i64>,
    pub doctor: Option<i64>,
    pub status: Option<String>,
}

fn parse_status(value: &str) -> Result<TreatmentStatus, ApiError> {
    TreatmentStatus::from_str(value)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown treatment status: {value:?}")))
}

/// Handler for `GET /api/treatments`.
pub async fn list_treatments_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TreatmentListQuery>,
) -> Result<Json<Vec<Treatment>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let filter = TreatmentFilter {
        patient_id: query.patient,
        doctor_id: query.doctor,
        status,
    };

    let list = run_db(state, move |conn| {
        treatments::list_treatments(conn, &filter).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `POST /api/treatments`.
pub async fn create_treatment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewTreatment>,
) -> Result<(StatusCode, Json<Treatment>), ApiError> {
    if payload.treatment_type.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "treatment_type is required".to_string(),
        ));
    }
    validate::opt_date("start_date", payload.start_date.as_deref())?;
    validate::opt_date("end_date", payload.end_date.as_deref())?;

    let treatment = run_db(state, move |conn| {
        treatments::create_treatment(conn, &payload).map_err(ApiError::from)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(treatment)))
}

/// Handler for `GET /api/treatments/{id}`.
pub async fn get_treatment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Treatment>, ApiError> {
    let treatment = run_db(state, move |conn| {
        treatments::get_treatment(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(treatment))
}

/// Handler for `PUT /api/treatments/{id}`.
pub async fn update_treatment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(updates): Json<UpdateTreatmentParams>,
) -> Result<Json<Treatment>, ApiError> {
    validate::opt_date("start_date", updates.start_date.as_deref())?;
    validate::opt_date("end_date", updates.end_date.as_deref())?;

    let treatment = run_db(state, move |conn| {
        treatments::update_treatment(conn, id, &updates)?;
        treatments::get_treatment(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(treatment))
}

/// Handler for `DELETE /api/treatments/{id}`.
pub async fn delete_treatment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    run_db(state, move |conn| {
        treatments::delete_treatment(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
