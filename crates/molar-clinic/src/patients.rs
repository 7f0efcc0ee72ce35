//! Patient records.

use molar_types::{new_record_id, Gender, UnknownEnumValue};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Internal database ID.
    pub id: i64,
    /// Public record number (e.g. `PT-1c9f2a40b3d1`).
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO 8601 date (`YYYY-MM-DD`).
    pub date_of_birth: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub notes: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last modification timestamp (ISO 8601).
    pub updated_at: String,
}

/// Parameters for registering a new patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub notes: Option<String>,
}

/// Parameters for updating an existing patient.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePatientParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub notes: Option<String>,
}

/// Registers a patient, assigning a fresh `PT-` record number.
pub fn create_patient(conn: &Connection, params: &NewPatient) -> Result<Patient, ClinicError> {
    let patient_id = new_record_id("PT");
    let patient = conn.query_row(
        "INSERT INTO patients (
            patient_id, first_name, last_name, date_of_birth, gender, phone,
            email, address, medical_history, allergies, insurance_provider,
            insurance_number, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        RETURNING id, patient_id, first_name, last_name, date_of_birth, gender,
                  phone, email, address, medical_history, allergies,
                  insurance_provider, insurance_number, notes, created_at, updated_at",
        params![
            patient_id,
            params.first_name,
            params.last_name,
            params.date_of_birth,
            params.gender.as_str(),
            params.phone,
            params.email,
            params.address,
            params.medical_history,
            params.allergies,
            params.insurance_provider,
            params.insurance_number,
            params.notes,
        ],
        map_row_to_patient,
    )?;
    Ok(patient)
}

/// Retrieves a patient by internal id.
pub fn get_patient(conn: &Connection, id: i64) -> Result<Patient, ClinicError> {
    conn.query_row(
        "SELECT id, patient_id, first_name, last_name, date_of_birth, gender,
                phone, email, address, medical_history, allergies,
                insurance_provider, insurance_number, notes, created_at, updated_at
         FROM patients WHERE id = ?1",
        [id],
        map_row_to_patient,
    )
    .optional()?
    .ok_or_else(|| ClinicError::not_found("patient", id))
}

/// Lists patients, newest registration first.
///
/// `search` matches against first name, last name, and the public record
/// number, case-insensitively for ASCII.
pub fn list_patients(conn: &Connection, search: Option<&str>) -> Result<Vec<Patient>, ClinicError> {
    let mut stmt;
    let rows = match search {
        Some(needle) => {
            stmt = conn.prepare(
                "SELECT id, patient_id, first_name, last_name, date_of_birth, gender,
                        phone, email, address, medical_history, allergies,
                        insurance_provider, insurance_number, notes, created_at, updated_at
                 FROM patients
                 WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR patient_id LIKE ?1
                 ORDER BY created_at DESC, id DESC",
            )?;
            stmt.query_map([format!("%{needle}%")], map_row_to_patient)?
        }
        None => {
            stmt = conn.prepare(
                "SELECT id, patient_id, first_name, last_name, date_of_birth, gender,
                        phone, email, address, medical_history, allergies,
                        insurance_provider, insurance_number, notes, created_at, updated_at
                 FROM patients ORDER BY created_at DESC, id DESC",
            )?;
            stmt.query_map([], map_row_to_patient)?
        }
    };

    let mut patients = Vec::new();
    for row in rows {
        patients.push(row?);
    }
    Ok(patients)
}

/// Updates a patient using a single atomic UPDATE statement.
///
/// Only fields that are `Some` in `updates` are modified; `None` fields are
/// left untouched.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    updates: &UpdatePatientParams,
) -> Result<(), ClinicError> {
    fn push_text(
        column: &str,
        value: &Option<String>,
        set_parts: &mut Vec<String>,
        values: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
        idx: &mut usize,
    ) {
        if let Some(value) = value {
            set_parts.push(format!("{column} = ?{idx}"));
            values.push(Box::new(value.clone()));
            *idx += 1;
        }
    }

    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    push_text("first_name", &updates.first_name, &mut set_parts, &mut values, &mut idx);
    push_text("last_name", &updates.last_name, &mut set_parts, &mut values, &mut idx);
    push_text("date_of_birth", &updates.date_of_birth, &mut set_parts, &mut values, &mut idx);
    if let Some(gender) = &updates.gender {
        set_parts.push(format!("gender = ?{}", idx));
        values.push(Box::new(gender.as_str()));
        idx += 1;
    }
    push_text("phone", &updates.phone, &mut set_parts, &mut values, &mut idx);
    push_text("email", &updates.email, &mut set_parts, &mut values, &mut idx);
    push_text("address", &updates.address, &mut set_parts, &mut values, &mut idx);
    push_text("medical_history", &updates.medical_history, &mut set_parts, &mut values, &mut idx);
    push_text("allergies", &updates.allergies, &mut set_parts, &mut values, &mut idx);
    push_text("insurance_provider", &updates.insurance_provider, &mut set_parts, &mut values, &mut idx);
    push_text("insurance_number", &updates.insurance_number, &mut set_parts, &mut values, &mut idx);
    push_text("notes", &updates.notes, &mut set_parts, &mut values, &mut idx);

    if set_parts.is_empty() {
        let _ = get_patient(conn, id)?;
        return Ok(());
    }
    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE patients SET {} WHERE id = ?{}",
        set_parts.join(", "),
        idx
    );
    values.push(Box::new(id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(ClinicError::not_found("patient", id));
    }
    Ok(())
}

/// Deletes a patient.
///
/// Appointments and treatments cascade away with the record; financial
/// records survive with their patient link cleared.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    let count = conn.execute("DELETE FROM patients WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(ClinicError::not_found("patient", id));
    }
    Ok(())
}

pub fn count_patients(conn: &Connection) -> Result<i64, ClinicError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

fn map_row_to_patient(row: &Row) -> rusqlite::Result<Patient> {
    let gender_str: String = row.get(5)?;
    let gender = Gender::from_str(&gender_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(UnknownEnumValue(gender_str.clone())),
        )
    })?;

    Ok(Patient {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender,
        phone: row.get(6)?,
        email: row.get(7)?,
        address: row.get(8)?,
        medical_history: row.get(9)?,
        allergies: row.get(10)?,
        insurance_provider: row.get(11)?,
        insurance_number: row.get(12)?,
        notes: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_conn;

    fn new_patient(first: &str, last: &str) -> NewPatient {
        NewPatient {
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: "1988-04-12".to_string(),
            gender: Gender::Female,
            phone: Some("+1-555-0100".to_string()),
            email: None,
            address: None,
            medical_history: None,
            allergies: Some("penicillin".to_string()),
            insurance_provider: None,
            insurance_number: None,
            notes: None,
        }
    }

    #[test]
    fn create_assigns_record_number() {
        let conn = test_conn();
        let created = create_patient(&conn, &new_patient("Maria", "Novak")).expect("create failed");

        assert!(created.patient_id.starts_with("PT-"));
        assert_eq!(created.first_name, "Maria");
        assert_eq!(created.gender, Gender::Female);

        let fetched = get_patient(&conn, created.id).expect("get failed");
        assert_eq!(fetched, created);
    }

    #[test]
    fn list_searches_names_and_record_number() {
        let conn = test_conn();
        let maria = create_patient(&conn, &new_patient("Maria", "Novak")).expect("create failed");
        create_patient(&conn, &new_patient("Jonas", "Berg")).expect("create failed");

        let all = list_patients(&conn, None).expect("list failed");
        assert_eq!(all.len(), 2);

        let by_name = list_patients(&conn, Some("nov")).expect("list failed");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].last_name, "Novak");

        let by_record = list_patients(&conn, Some(&maria.patient_id)).expect("list failed");
        assert_eq!(by_record.len(), 1);
        assert_eq!(by_record[0].id, maria.id);

        assert!(list_patients(&conn, Some("zzz")).expect("list failed").is_empty());
    }

    #[test]
    fn update_touches_only_given_fields() {
        let conn = test_conn();
        let created = create_patient(&conn, &new_patient("Maria", "Novak")).expect("create failed");

        update_patient(
            &conn,
            created.id,
            &UpdatePatientParams {
                phone: Some("+1-555-0199".to_string()),
                notes: Some("prefers morning slots".to_string()),
                ..Default::default()
            },
        )
        .expect("update failed");

        let updated = get_patient(&conn, created.id).expect("get failed");
        assert_eq!(updated.phone.as_deref(), Some("+1-555-0199"));
        assert_eq!(updated.notes.as_deref(), Some("prefers morning slots"));
        assert_eq!(updated.first_name, "Maria");
        assert_eq!(updated.allergies.as_deref(), Some("penicillin"));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let conn = test_conn();
        let created = create_patient(&conn, &new_patient("Maria", "Novak")).expect("create failed");

        delete_patient(&conn, created.id).expect("delete failed");
        let err = get_patient(&conn, created.id).expect_err("should be gone");
        assert!(matches!(err, ClinicError::NotFound { .. }));

        let err = delete_patient(&conn, created.id).expect_err("second delete should fail");
        assert!(matches!(err, ClinicError::NotFound { .. }));
    }

    #[test]
    fn count_tracks_registrations() {
        let conn = test_conn();
        assert_eq!(count_patients(&conn).expect("count failed"), 0);
        create_patient(&conn, &new_patient("Maria", "Novak")).expect("create failed");
        assert_eq!(count_patients(&conn).expect("count failed"), 1);
    }
}
