//! Appointment endpoints.

use axum::http::StatusCode;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use molar_clinic::appointments::{
    self, Appointment, AppointmentFilter, NewAppointment, UpdateAppointmentParams,
};
use molar_types::AppointmentStatus;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::{run_db, validate, AppState};

/// Query parameters for `GET /api/appointments`.
#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    /// Exact calendar date (`YYYY-MM-DD`).
    pub date: Option<String>,
    pub patient: Option<i64>,
    pub doctor: Option<i64>,
    pub status: Option<String>,
}

fn parse_status(value: &str) -> Result<AppointmentStatus, ApiError> {
    AppointmentStatus::from_str(value)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown appointment status: {value:?}")))
}

/// Handler for `GET /api/appointments`.
pub async fn list_appointments_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let filter = AppointmentFilter {
        date: query.date,
        patient_id: query.patient,
        doctor_id: query.doctor,
        status,
    };

    let list = run_db(state, move |conn| {
        appointments::list_appointments(conn, &filter).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `POST /api/appointments`.
///
/// The returned row carries the resolved patient and doctor display names.
pub async fn create_appointment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    validate::date("appointment_date", &payload.appointment_date)?;
    validate::time("start_time", &payload.start_time)?;
    validate::opt_time("end_time", payload.end_time.as_deref())?;

    let appointment = run_db(state, move |conn| {
        appointments::create_appointment(conn, &payload).map_err(ApiError::from)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Handler for `GET /api/appointments/{id}`.
pub async fn get_appointment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = run_db(state, move |conn| {
        appointments::get_appointment(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(appointment))
}

/// Handler for `PUT /api/appointments/{id}`.
///
/// Status moves are unrestricted: the front desk can put a cancelled visit
/// back on the books or mark a completed one as no-show after the fact.
pub async fn update_appointment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(updates): Json<UpdateAppointmentParams>,
) -> Result<Json<Appointment>, ApiError> {
    validate::opt_date("appointment_date", updates.appointment_date.as_deref())?;
    validate::opt_time("start_time", updates.start_time.as_deref())?;
    validate::opt_time("end_time", updates.end_time.as_deref())?;

    let appointment = run_db(state, move |conn| {
        appointments::update_appointment(conn, id, &updates)?;
        appointments::get_appointment(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(appointment))
}

/// Handler for `DELETE /api/appointments/{id}`.
pub async fn delete_appointment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    run_db(state, move |conn| {
        appointments::delete_appointment(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
