//! Patient record endpoints.

use axum::http::StatusCode;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use molar_clinic::patients::{self, NewPatient, Patient, UpdatePatientParams};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::{run_db, validate, AppState};

/// Query parameters for `GET /api/patients`.
#[derive(Debug, Deserialize)]
pub struct PatientListQuery {
    /// Matches against first name, last name, and record number.
    pub search: Option<String>,
}

/// Handler for `GET /api/patients`.
pub async fn list_patients_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let list = run_db(state, move |conn| {
        patients::list_patients(conn, query.search.as_deref()).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `POST /api/patients`.
pub async fn create_patient_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "first_name and last_name are required".to_string(),
        ));
    }
    validate::date("date_of_birth", &payload.date_of_birth)?;

    let patient = run_db(state, move |conn| {
        patients::create_patient(conn, &payload).map_err(ApiError::from)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// Handler for `GET /api/patients/{id}`.
pub async fn get_patient_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>, ApiError> {
    let patient = run_db(state, move |conn| {
        patients::get_patient(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(patient))
}

/// Handler for `PUT /api/patients/{id}`.
pub async fn update_patient_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(updates): Json<UpdatePatientParams>,
) -> Result<Json<Patient>, ApiError> {
    validate::opt_date("date_of_birth", updates.date_of_birth.as_deref())?;

    let patient = run_db(state, move |conn| {
        patients::update_patient(conn, id, &updates)?;
        patients::get_patient(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(patient))
}

/// Handler for `DELETE /api/patients/{id}`.
///
/// Deleting a patient cascades to their appointments and treatments;
/// financial records survive with the patient link cleared.
pub async fn delete_patient_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    run_db(state, move |conn| {
        patients::delete_patient(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
