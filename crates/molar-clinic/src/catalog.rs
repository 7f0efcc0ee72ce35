//! The treatment-type catalogue: the price list offered to patients.
//!
//! Types are soft-deactivated rather than deleted so historical treatments
//! keep a valid reference point for reporting.

use molar_types::Money;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

/// A catalogue entry for a kind of treatment the clinic offers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_cost: Money,
    pub default_duration_minutes: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for adding a catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTreatmentType {
    pub name: String,
    pub description: Option<String>,
    pub base_cost: Money,
    pub default_duration_minutes: i64,
}

/// Parameters for updating a catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTreatmentTypeParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_cost: Option<Money>,
    pub default_duration_minutes: Option<i64>,
    pub is_active: Option<bool>,
}

/// Adds a catalogue entry. Names are unique across the catalogue.
pub fn create_treatment_type(
    conn: &Connection,
    params: &NewTreatmentType,
) -> Result<TreatmentType, ClinicError> {
    conn.query_row(
        "INSERT INTO treatment_types (name, description, base_cost_cents, default_duration_minutes)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, name, description, base_cost_cents, default_duration_minutes,
                   is_active, created_at, updated_at",
        params![
            params.name,
            params.description,
            params.base_cost.cents(),
            params.default_duration_minutes,
        ],
        map_row_to_treatment_type,
    )
    .map_err(ClinicError::from)
}

/// Retrieves a catalogue entry by id.
pub fn get_treatment_type(conn: &Connection, id: i64) -> Result<TreatmentType, ClinicError> {
    conn.query_row(
        "SELECT id, name, description, base_cost_cents, default_duration_minutes,
                is_active, created_at, updated_at
         FROM treatment_types WHERE id = ?1",
        [id],
        map_row_to_treatment_type,
    )
    .optional()?
    .ok_or_else(|| ClinicError::not_found("treatment type", id))
}

/// Lists catalogue entries alphabetically, active ones only unless asked.
pub fn list_treatment_types(
    conn: &Connection,
    include_inactive: bool,
) -> Result<Vec<TreatmentType>, ClinicError> {
    let sql = if include_inactive {
        "SELECT id, name, description, base_cost_cents, default_duration_minutes,
                is_active, created_at, updated_at
         FROM treatment_types ORDER BY name ASC"
    } else {
        "SELECT id, name, description, base_cost_cents, default_duration_minutes,
                is_active, created_at, updated_at
         FROM treatment_types WHERE is_active = 1 ORDER BY name ASC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map_row_to_treatment_type)?;

    let mut types = Vec::new();
    for row in rows {
        types.push(row?);
    }
    Ok(types)
}

/// Updates a catalogue entry using a single atomic UPDATE statement.
pub fn update_treatment_type(
    conn: &Connection,
    id: i64,
    updates: &UpdateTreatmentTypeParams,
) -> Result<(), ClinicError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(name) = &updates.name {
        set_parts.push(format!("name = ?{}", idx));
        values.push(Box::new(name.clone()));
        idx += 1;
    }
    if let Some(description) = &updates.description {
        set_parts.push(format!("description = ?{}", idx));
        values.push(Box::new(description.clone()));
        idx += 1;
    }
    if let Some(cost) = &updates.base_cost {
        set_parts.push(format!("base_cost_cents = ?{}", idx));
        values.push(Box::new(cost.cents()));
        idx += 1;
    }
    if let Some(minutes) = &updates.default_duration_minutes {
        set_parts.push(format!("default_duration_minutes = ?{}", idx));
        values.push(Box::new(*minutes));
        idx += 1;
    }
    if let Some(active) = &updates.is_active {
        set_parts.push(format!("is_active = ?{}", idx));
        values.push(Box::new(*active));
        idx += 1;
    }

    if set_parts.is_empty() {
        let _ = get_treatment_type(conn, id)?;
        return Ok(());
    }
    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE treatment_types SET {} WHERE id = ?{}",
        set_parts.join(", "),
        idx
    );
    values.push(Box::new(id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(ClinicError::not_found("treatment type", id));
    }
    Ok(())
}

fn map_row_to_treatment_type(row: &Row) -> rusqlite::Result<TreatmentType> {
    Ok(TreatmentType {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        base_cost: Money::from_cents(row.get(3)?),
        default_duration_minutes: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_conn;

    #[test]
    fn catalogue_is_seeded_and_sorted() {
        let conn = test_conn();
        let types = list_treatment_types(&conn, false).expect("list failed");

        assert!(types.len() >= 8, "expected the seeded catalogue");
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted, "catalogue should be alphabetical");

        let checkup = types
            .iter()
            .find(|t| t.name == "Checkup")
            .expect("seeded Checkup missing");
        assert_eq!(checkup.base_cost.cents(), 5_000);
        assert_eq!(checkup.default_duration_minutes, 30);
    }

    #[test]
    fn duplicate_name_is_a_unique_violation() {
        let conn = test_conn();
        let err = create_treatment_type(
            &conn,
            &NewTreatmentType {
                name: "Checkup".to_string(),
                description: None,
                base_cost: "10.00".parse().expect("valid money"),
                default_duration_minutes: 20,
            },
        )
        .expect_err("duplicate name should fail");
        assert!(err.is_unique_violation(), "unexpected error: {err:?}");
    }

    #[test]
    fn deactivated_type_leaves_default_listing() {
        let conn = test_conn();
        let custom = create_treatment_type(
            &conn,
            &NewTreatmentType {
                name: "Veneer".to_string(),
                description: Some("Porcelain veneer, per tooth".to_string()),
                base_cost: "350.00".parse().expect("valid money"),
                default_duration_minutes: 90,
            },
        )
        .expect("create failed");
        assert!(custom.is_active);

        update_treatment_type(
            &conn,
            custom.id,
            &UpdateTreatmentTypeParams {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .expect("update failed");

        let active = list_treatment_types(&conn, false).expect("list failed");
        assert!(active.iter().all(|t| t.name != "Veneer"));

        let all = list_treatment_types(&conn, true).expect("list failed");
        let veneer = all
            .iter()
            .find(|t| t.name == "Veneer")
            .expect("deactivated type should still exist");
        assert!(!veneer.is_active);
    }

    #[test]
    fn update_reprices_an_entry() {
        let conn = test_conn();
        let types = list_treatment_types(&conn, false).expect("list failed");
        let filling = types
            .iter()
            .find(|t| t.name == "Filling")
            .expect("seeded Filling missing");

        update_treatment_type(
            &conn,
            filling.id,
            &UpdateTreatmentTypeParams {
                base_cost: Some("95.50".parse().expect("valid money")),
                ..Default::default()
            },
        )
        .expect("update failed");

        let repriced = get_treatment_type(&conn, filling.id).expect("get failed");
        assert_eq!(repriced.base_cost.cents(), 9_550);

        let err = update_treatment_type(&conn, 9_999, &UpdateTreatmentTypeParams::default())
            .expect_err("missing id should fail");
        assert!(matches!(err, ClinicError::NotFound { .. }));
    }
}
