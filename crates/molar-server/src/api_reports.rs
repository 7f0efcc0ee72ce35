//! The dashboard summary endpoint.

use axum::{extract::Extension, Json};
use molar_clinic::finance::{self, FinanceSummary};
use molar_clinic::{appointments, patients, treatments};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::{run_db, AppState};

/// Response body for `GET /api/reports/summary`.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub patients: i64,
    pub appointments_today: i64,
    pub treatments: i64,
    pub finance: FinanceSummary,
}

/// Handler for `GET /api/reports/summary`.
///
/// "Today" is the server's local calendar date, matching what the front
/// desk sees on the wall clock.
pub async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let summary = run_db(state, move |conn| {
        Ok(SummaryResponse {
            patients: patients::count_patients(conn)?,
            appointments_today: appointments::count_appointments(conn, Some(&today))?,
            treatments: treatments::count_treatments(conn)?,
            finance: finance::financial_summary(conn)?,
        })
    })
    .await?;
    Ok(Json(summary))
}
