//! Appointment scheduling.
//!
//! Every read resolves the patient and doctor display names in the same
//! query, so callers never join by hand. Status transitions are
//! deliberately unrestricted; see [`molar_types::AppointmentStatus`].

use molar_types::{new_record_id, AppointmentStatus, UnknownEnumValue};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

const SELECT_APPOINTMENT: &str = "
    SELECT a.id, a.appointment_id, a.patient_id, a.doctor_id,
           p.first_name || ' ' || p.last_name AS patient_name,
           u.full_name AS doctor_name,
           a.appointment_date, a.start_time, a.end_time, a.duration_minutes,
           a.appointment_type, a.status, a.notes, a.created_at, a.updated_at
    FROM appointments a
    JOIN patients p ON p.id = a.patient_id
    JOIN users u ON u.id = a.doctor_id";

/// An appointment with its participant names resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Internal database ID.
    pub id: i64,
    /// Public record number (e.g. `AP-7b2e91c04a55`).
    pub appointment_id: String,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub patient_name: String,
    pub doctor_name: String,
    /// ISO 8601 date (`YYYY-MM-DD`).
    pub appointment_date: String,
    /// 24h clock time (`HH:MM`).
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Free-form visit label ("Checkup", "Follow-up", ...).
    pub appointment_type: Option<String>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for booking an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub appointment_type: Option<String>,
    /// Defaults to `scheduled` when omitted.
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Parameters for updating an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppointmentParams {
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub appointment_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Optional filters for listing appointments.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    /// Exact calendar date (`YYYY-MM-DD`).
    pub date: Option<String>,
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
}

/// Books an appointment, assigning a fresh `AP-` record number.
///
/// A reference to a missing patient or doctor surfaces as a foreign key
/// violation; see [`ClinicError::is_foreign_key_violation`].
pub fn create_appointment(
    conn: &Connection,
    params: &NewAppointment,
) -> Result<Appointment, ClinicError> {
    let appointment_id = new_record_id("AP");
    let status = params.status.unwrap_or(AppointmentStatus::Scheduled);
    conn.execute(
        "INSERT INTO appointments (
            appointment_id, patient_id, doctor_id, appointment_date, start_time,
            end_time, duration_minutes, appointment_type, status, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appointment_id,
            params.patient_id,
            params.doctor_id,
            params.appointment_date,
            params.start_time,
            params.end_time,
            params.duration_minutes,
            params.appointment_type,
            status.as_str(),
            params.notes,
        ],
    )?;
    get_appointment(conn, conn.last_insert_rowid())
}

/// Retrieves an appointment by internal id.
pub fn get_appointment(conn: &Connection, id: i64) -> Result<Appointment, ClinicError> {
    conn.query_row(
        &format!("{SELECT_APPOINTMENT} WHERE a.id = ?1"),
        [id],
        map_row_to_appointment,
    )
    .optional()?
    .ok_or_else(|| ClinicError::not_found("appointment", id))
}

/// Lists appointments matching the filter, most recent first.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, ClinicError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(date) = &filter.date {
        clauses.push(format!("a.appointment_date = ?{idx}"));
        values.push(Box::new(date.clone()));
        idx += 1;
    }
    if let Some(patient_id) = filter.patient_id {
        clauses.push(format!("a.patient_id = ?{idx}"));
        values.push(Box::new(patient_id));
        idx += 1;
    }
    if let Some(doctor_id) = filter.doctor_id {
        clauses.push(format!("a.doctor_id = ?{idx}"));
        values.push(Box::new(doctor_id));
        idx += 1;
    }
    if let Some(status) = filter.status {
        clauses.push(format!("a.status = ?{idx}"));
        values.push(Box::new(status.as_str()));
    }

    let mut sql = String::from(SELECT_APPOINTMENT);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY a.appointment_date DESC, a.start_time DESC, a.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(params.as_slice(), map_row_to_appointment)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(row?);
    }
    Ok(appointments)
}

/// Updates an appointment using a single atomic UPDATE statement.
///
/// Only fields that are `Some` in `updates` are modified. The status can
/// move from any state to any other state.
pub fn update_appointment(
    conn: &Connection,
    id: i64,
    updates: &UpdateAppointmentParams,
) -> Result<(), ClinicError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(date) = &updates.appointment_date {
        set_parts.push(format!("appointment_date = ?{}", idx));
        values.push(Box::new(date.clone()));
        idx += 1;
    }
    if let Some(start) = &updates.start_time {
        set_parts.push(format!("start_time = ?{}", idx));
        values.push(Box::new(start.clone()));
        idx += 1;
    }
    if let Some(end) = &updates.end_time {
        set_parts.push(format!("end_time = ?{}", idx));
        values.push(Box::new(end.clone()));
        idx += 1;
    }
    if let Some(minutes) = &updates.duration_minutes {
        set_parts.push(format!("duration_minutes = ?{}", idx));
        values.push(Box::new(*minutes));
        idx += 1;
    }
    if let Some(kind) = &updates.appointment_type {
        set_parts.push(format!("appointment_type = ?{}", idx));
        values.push(Box::new(kind.clone()));
        idx += 1;
    }
    if let Some(status) = &updates.status {
        set_parts.push(format!("status = ?{}", idx));
        values.push(Box::new(status.as_str()));
        idx += 1;
    }
    if let Some(notes) = &updates.notes {
        set_parts.push(format!("notes = ?{}", idx));
        values.push(Box::new(notes.clone()));
        idx += 1;
    }

    if set_parts.is_empty() {
        let _ = get_appointment(conn, id)?;
        return Ok(());
    }
    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE appointments SET {} WHERE id = ?{}",
        set_parts.join(", "),
        idx
    );
    values.push(Box::new(id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(ClinicError::not_found("appointment", id));
    }
    Ok(())
}

/// Cancels the row entirely; prefer setting status `cancelled` for history.
pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    let count = conn.execute("DELETE FROM appointments WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(ClinicError::not_found("appointment", id));
    }
    Ok(())
}

/// Counts appointments, optionally restricted to one calendar date.
pub fn count_appointments(conn: &Connection, date: Option<&str>) -> Result<i64, ClinicError> {
    let count = match date {
        Some(date) => conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE appointment_date = ?1",
            [date],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?,
    };
    Ok(count)
}

fn map_row_to_appointment(row: &Row) -> rusqlite::Result<Appointment> {
    let status_str: String = row.get(11)?;
    let status = AppointmentStatus::from_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            Box::new(UnknownEnumValue(status_str.clone())),
        )
    })?;

    Ok(Appointment {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        patient_name: row.get(4)?,
        doctor_name: row.get(5)?,
        appointment_date: row.get(6)?,
        start_time: row.get(7)?,
        end_time: row.get(8)?,
        duration_minutes: row.get(9)?,
        appointment_type: row.get(10)?,
        status,
        notes: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
