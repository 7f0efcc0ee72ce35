//! Financial record endpoints.

use axum::http::StatusCode;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use molar_clinic::finance::{
    self, FinanceFilter, FinancialRecord, NewFinancialRecord, UpdateFinancialRecordParams,
};
use molar_types::{PaymentStatus, RecordType};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::{run_db, validate, AppState};

/// Query parameters for `GET /api/finance`.
#[derive(Debug, Deserialize)]
pub struct FinanceListQuery {
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    /// `pending`, `paid`, `partial`, or `cancelled`.
    pub status: Option<String>,
    pub patient: Option<i64>,
}

/// Handler for `GET /api/finance`.
pub async fn list_records_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<FinanceListQuery>,
) -> Result<Json<Vec<FinancialRecord>>, ApiError> {
    let record_type = match query.record_type.as_deref() {
        Some(value) => Some(
            RecordType::from_str(value)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown record type: {value:?}")))?,
        ),
        None => None,
    };
    let payment_status = match query.status.as_deref() {
        Some(value) => {
            Some(PaymentStatus::from_str(value).ok_or_else(|| {
                ApiError::BadRequest(format!("unknown payment status: {value:?}"))
            })?)
        }
        None => None,
    };
    let filter = FinanceFilter {
        record_type,
        payment_status,
        patient_id: query.patient,
    };

    let list = run_db(state, move |conn| {
        finance::list_records(conn, &filter).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(list))
}

/// Handler for `POST /api/finance`.
pub async fn create_record_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewFinancialRecord>,
) -> Result<(StatusCode, Json<FinancialRecord>), ApiError> {
    validate::date("transaction_date", &payload.transaction_date)?;
    validate::opt_date("due_date", payload.due_date.as_deref())?;

    let record = run_db(state, move |conn| {
        finance::create_record(conn, &payload).map_err(ApiError::from)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Handler for `GET /api/finance/{id}`.
pub async fn get_record_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<FinancialRecord>, ApiError> {
    let record = run_db(state, move |conn| {
        finance::get_record(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(record))
}

/// Handler for `PUT /api/finance/{id}`.
pub async fn update_record_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(updates): Json<UpdateFinancialRecordParams>,
) -> Result<Json<FinancialRecord>, ApiError> {
    validate::opt_date("transaction_date", updates.transaction_date.as_deref())?;
    validate::opt_date("due_date", updates.due_date.as_deref())?;

    let record = run_db(state, move |conn| {
        finance::update_record(conn, id, &updates)?;
        finance::get_record(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(record))
}

/// Handler for `DELETE /api/finance/{id}`.
pub async fn delete_record_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    run_db(state, move |conn| {
        finance::delete_record(conn, id).map_err(ApiError::from)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
