//! Treatment records.
//!
//! A treatment may reference the appointment it was performed in; deleting
//! that appointment detaches the treatment rather than deleting it, since
//! the clinical record outlives the calendar entry.

use molar_types::{new_record_id, Money, TreatmentStatus, UnknownEnumValue};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

const SELECT_TREATMENT: &str = "
    SELECT t.id, t.treatment_id, t.patient_id, t.doctor_id, t.appointment_id,
           p.first_name || ' ' || p.last_name AS patient_name,
           u.full_name AS doctor_name,
           t.treatment_type, t.description, t.tooth_number, t.cost_cents,
           t.status, t.start_date, t.end_date, t.notes, t.created_at, t.updated_at
    FROM treatments t
    JOIN patients p ON p.id = t.patient_id
    JOIN users u ON u.id = t.doctor_id";

/// A treatment with its participant names resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    /// Internal database ID.
    pub id: i64,
    /// Public record number (e.g. `TR-55aa0c13e9d2`).
    pub treatment_id: String,
    pub patient_id: i64,
    pub doctor_id: i64,
    /// Appointment this treatment was performed in, if still present.
    pub appointment_id: Option<i64>,
    pub patient_name: String,
    pub doctor_name: String,
    /// Catalogue name or free-form label ("Filling", "Crown", ...).
    pub treatment_type: String,
    pub description: Option<String>,
    /// FDI tooth notation ("36"), when the treatment is tooth-specific.
    pub tooth_number: Option<String>,
    pub cost: Money,
    pub status: TreatmentStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for logging a new treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTreatment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub treatment_type: String,
    pub description: Option<String>,
    pub tooth_number: Option<String>,
    pub cost: Money,
    /// Defaults to `planned` when omitted.
    pub status: Option<TreatmentStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

/// Parameters for updating a treatment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTreatmentParams {
    pub treatment_type: Option<String>,
    pub description: Option<String>,
    pub tooth_number: Option<String>,
    pub cost: Option<Money>,
    pub status: Option<TreatmentStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

/// Optional filters for listing treatments.
#[derive(Debug, Clone, Default)]
pub struct TreatmentFilter {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub status: Option<TreatmentStatus>,
}

/// Logs a treatment, assigning a fresh `TR-` record number.
pub fn create_treatment(
    conn: &Connection,
    params: &NewTreatment,
) -> Result<Treatment, ClinicError> {
    let treatment_id = new_record_id("TR");
    let status = params.status.unwrap_or(TreatmentStatus::Planned);
    conn.execute(
        "INSERT INTO treatments (
            treatment_id, patient_id, doctor_id, appointment_id, treatment_type,
            description, tooth_number, cost_cents, status, start_date, end_date, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            treatment_id,
            params.patient_id,
            params.doctor_id,
            params.appointment_id,
            params.treatment_type,
            params.description,
            params.tooth_number,
            params.cost.cents(),
            status.as_str(),
            params.start_date,
            params.end_date,
            params.notes,
        ],
    )?;
    get_treatment(conn, conn.last_insert_rowid())
}

/// Retrieves a treatment by internal id.
pub fn get_treatment(conn: &Connection, id: i64) -> Result<Treatment, ClinicError> {
    conn.query_row(
        &format!("{SELECT_TREATMENT} WHERE t.id = ?1"),
        [id],
        map_row_to_treatment,
    )
    .optional()?
    .ok_or_else(|| ClinicError::not_found("treatment", id))
}

/// Lists treatments matching the filter, most recently created first.
pub fn list_treatments(
    conn: &Connection,
    filter: &TreatmentFilter,
) -> Result<Vec<Treatment>, ClinicError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(patient_id) = filter.patient_id {
        clauses.push(format!("t.patient_id = ?{idx}"));
        values.push(Box::new(patient_id));
        idx += 1;
    }
    if let Some(doctor_id) = filter.doctor_id {
        clauses.push(format!("t.doctor_id = ?{idx}"));
        values.push(Box::new(doctor_id));
        idx += 1;
    }
    if let Some(status) = filter.status {
        clauses.push(format!("t.status = ?{idx}"));
        values.push(Box::new(status.as_str()));
    }

    let mut sql = String::from(SELECT_TREATMENT);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(params.as_slice(), map_row_to_treatment)?;

    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(row?);
    }
    Ok(treatments)
}

/// Updates a treatment using a single atomic UPDATE statement.
pub fn update_treatment(
    conn: &Connection,
    id: i64,
    updates: &UpdateTreatmentParams,
) -> Result<(), ClinicError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(kind) = &updates.treatment_type {
        set_parts.push(format!("treatment_type = ?{}", idx));
        values.push(Box::new(kind.clone()));
        idx += 1;
    }
    if let Some(description) = &updates.description {
        set_parts.push(format!("description = ?{}", idx));
        values.push(Box::new(description.clone()));
        idx += 1;
    }
    if let Some(tooth) = &updates.tooth_number {
        set_parts.push(format!("tooth_number = ?{}", idx));
        values.push(Box::new(tooth.clone()));
        idx += 1;
    }
    if let Some(cost) = &updates.cost {
        set_parts.push(format!("cost_cents = ?{}", idx));
        values.push(Box::new(cost.cents()));
        idx += 1;
    }
    if let Some(status) = &updates.status {
        set_parts.push(format!("status = ?{}", idx));
        values.push(Box::new(status.as_str()));
        idx += 1;
    }
    if let Some(start) = &updates.start_date {
        set_parts.push(format!("start_date = ?{}", idx));
        values.push(Box::new(start.clone()));
        idx += 1;
    }
    if let Some(end) = &updates.end_date {
        set_parts.push(format!("end_date = ?{}", idx));
        values.push(Box::new(end.clone()));
        idx += 1;
    }
    if let Some(notes) = &updates.notes {
        set_parts.push(format!("notes = ?{}", idx));
        values.push(Box::new(notes.clone()));
        idx += 1;
    }

    if set_parts.is_empty() {
        let _ = get_treatment(conn, id)?;
        return Ok(());
    }
    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE treatments SET {} WHERE id = ?{}",
        set_parts.join(", "),
        idx
    );
    values.push(Box::new(id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(ClinicError::not_found("treatment", id));
    }
    Ok(())
}

/// Deletes a treatment.
pub fn delete_treatment(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    let count = conn.execute("DELETE FROM treatments WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(ClinicError::not_found("treatment", id));
    }
    Ok(())
}

pub fn count_treatments(conn: &Connection) -> Result<i64, ClinicError> {
    let count = conn.query_row("SELECT COUNT(*) FROM treatments", [], |row| row.get(0))?;
    Ok(count)
}

fn map_row_to_treatment(row: &Row) -> rusqlite::Result<Treatment> {
    let status_str: String = row.get(11)?;
    let status = TreatmentStatus::from_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            Box::new(UnknownEnumValue(status_str.clone())),
        )
    })?;

    Ok(Treatment {
        id: row.get(0)?,
        treatment_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        appointment_id: row.get(4)?,
        patient_name: row.get(5)?,
        doctor_name: row.get(6)?,
        treatment_type: row.get(7)?,
        description: row.get(8)?,
        tooth_number: row.get(9)?,
        cost: Money::from_cents(row.get(10)?),
        status,
        start_date: row.get(12)?,
        end_date: row.get(13)?,
        notes: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}
