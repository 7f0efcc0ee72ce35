//! Per-table SELECTs and the in-memory sheet model.
//!
//! Each builder resolves foreign keys to display names at the SQL level so
//! the spreadsheet is readable without the database next to it. Credential
//! columns are never selected.

use rusqlite::{Connection, Row};

use crate::{ExportError, ExportTable};

/// One worksheet's worth of data, ready for rendering.
pub(crate) struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

/// A single spreadsheet cell value.
pub(crate) enum Cell {
    Text(String),
    Int(i64),
    Number(f64),
    /// NULL in the database; the cell is left blank.
    Empty,
}

pub(crate) fn build_sheet(conn: &Connection, table: ExportTable) -> Result<Sheet, ExportError> {
    let (headers, rows): (&'static [&'static str], _) = match table {
        ExportTable::Patients => (PATIENT_HEADERS, patient_rows(conn)?),
        ExportTable::Appointments => (APPOINTMENT_HEADERS, appointment_rows(conn)?),
        ExportTable::Treatments => (TREATMENT_HEADERS, treatment_rows(conn)?),
        ExportTable::FinancialRecords => (FINANCE_HEADERS, finance_rows(conn)?),
        ExportTable::Users => (USER_HEADERS, user_rows(conn)?),
        ExportTable::TreatmentTypes => (TREATMENT_TYPE_HEADERS, treatment_type_rows(conn)?),
    };
    Ok(Sheet {
        name: table.sheet_name(),
        headers,
        rows,
    })
}

const PATIENT_HEADERS: &[&str] = &[
    "Record",
    "First Name",
    "Last Name",
    "Date of Birth",
    "Gender",
    "Phone",
    "Email",
    "Address",
    "Insurance Provider",
    "Insurance Number",
    "Allergies",
    "Registered",
];

fn patient_rows(conn: &Connection) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id, first_name, last_name, date_of_birth, gender, phone,
                email, address, insurance_provider, insurance_number, allergies,
                created_at
         FROM patients
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([], |row| text_cells(row, 12))?;
    drain(rows)
}

const APPOINTMENT_HEADERS: &[&str] = &[
    "Record", "Date", "Start", "End", "Patient", "Doctor", "Type", "Status", "Notes",
];

fn appointment_rows(conn: &Connection) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut stmt = conn.prepare(
        "SELECT a.appointment_id, a.appointment_date, a.start_time, a.end_time,
                p.first_name || ' ' || p.last_name, u.full_name,
                a.appointment_type, a.status, a.notes
         FROM appointments a
         JOIN patients p ON p.id = a.patient_id
         JOIN users u ON u.id = a.doctor_id
         ORDER BY a.appointment_date DESC, a.start_time DESC, a.id DESC",
    )?;
    let rows = stmt.query_map([], |row| text_cells(row, 9))?;
    drain(rows)
}

const TREATMENT_HEADERS: &[&str] = &[
    "Record", "Patient", "Doctor", "Treatment", "Tooth", "Cost", "Status", "Started", "Finished",
];

fn treatment_rows(conn: &Connection) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut stmt = conn.prepare(
        "SELECT t.treatment_id, p.first_name || ' ' || p.last_name, u.full_name,
                t.treatment_type, t.tooth_number, t.cost_cents, t.status,
                t.start_date, t.end_date
         FROM treatments t
         JOIN patients p ON p.id = t.patient_id
         JOIN users u ON u.id = t.doctor_id
         ORDER BY t.created_at DESC, t.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(vec![
            text(row, 0)?,
            text(row, 1)?,
            text(row, 2)?,
            text(row, 3)?,
            text(row, 4)?,
            money(row, 5)?,
            text(row, 6)?,
            text(row, 7)?,
            text(row, 8)?,
        ])
    })?;
    drain(rows)
}

const FINANCE_HEADERS: &[&str] = &[
    "Record",
    "Type",
    "Category",
    "Patient",
    "Amount",
    "Method",
    "Status",
    "Date",
    "Due",
    "Description",
];

fn finance_rows(conn: &Connection) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut stmt = conn.prepare(
        "SELECT f.record_id, f.record_type, f.category,
                p.first_name || ' ' || p.last_name,
                f.amount_cents, f.payment_method, f.payment_status,
                f.transaction_date, f.due_date, f.description
         FROM financial_records f
         LEFT JOIN patients p ON p.id = f.patient_id
         ORDER BY f.transaction_date DESC, f.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(vec![
            text(row, 0)?,
            text(row, 1)?,
            text(row, 2)?,
            text(row, 3)?,
            money(row, 4)?,
            text(row, 5)?,
            text(row, 6)?,
            text(row, 7)?,
            text(row, 8)?,
            text(row, 9)?,
        ])
    })?;
    drain(rows)
}

const USER_HEADERS: &[&str] = &[
    "Username",
    "Full Name",
    "Email",
    "Role",
    "Specialization",
    "Phone",
    "Status",
    "Last Login",
];

fn user_rows(conn: &Connection) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut stmt = conn.prepare(
        "SELECT username, full_name, email, role, specialization, phone,
                CASE WHEN is_active = 1 THEN 'active' ELSE 'inactive' END,
                last_login_at
         FROM users
         ORDER BY username ASC",
    )?;
    let rows = stmt.query_map([], |row| text_cells(row, 8))?;
    drain(rows)
}

const TREATMENT_TYPE_HEADERS: &[&str] =
    &["Name", "Description", "Base Cost", "Duration (min)", "Status"];

fn treatment_type_rows(conn: &Connection) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut stmt = conn.prepare(
        "SELECT name, description, base_cost_cents, default_duration_minutes,
                CASE WHEN is_active = 1 THEN 'active' ELSE 'inactive' END
         FROM treatment_types
         ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(vec![
            text(row, 0)?,
            text(row, 1)?,
            money(row, 2)?,
            int(row, 3)?,
            text(row, 4)?,
        ])
    })?;
    drain(rows)
}

fn text(row: &Row, idx: usize) -> rusqlite::Result<Cell> {
    let value: Option<String> = row.get(idx)?;
    Ok(match value {
        Some(v) => Cell::Text(v),
        None => Cell::Empty,
    })
}

/// Money columns are stored as integer cents; the sheet shows major units.
fn money(row: &Row, idx: usize) -> rusqlite::Result<Cell> {
    let cents: i64 = row.get(idx)?;
    Ok(Cell::Number(cents as f64 / 100.0))
}

fn int(row: &Row, idx: usize) -> rusqlite::Result<Cell> {
    Ok(Cell::Int(row.get(idx)?))
}

fn text_cells(row: &Row, count: usize) -> rusqlite::Result<Vec<Cell>> {
    let mut cells = Vec::with_capacity(count);
    for idx in 0..count {
        cells.push(text(row, idx)?);
    }
    Ok(cells)
}

fn drain(
    rows: impl Iterator<Item = rusqlite::Result<Vec<Cell>>>,
) -> Result<Vec<Vec<Cell>>, ExportError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{seed_clinic, test_conn};

    fn cell_text(cell: &Cell) -> Option<&str> {
        match cell {
            Cell::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    #[test]
    fn appointment_sheet_resolves_names() {
        let conn = test_conn();
        seed_clinic(&conn);

        let sheet = build_sheet(&conn, ExportTable::Appointments).expect("build failed");
        assert_eq!(sheet.name, "Appointments");
        assert_eq!(sheet.rows.len(), 1);

        let row = &sheet.rows[0];
        assert_eq!(row.len(), APPOINTMENT_HEADERS.len());
        assert_eq!(cell_text(&row[4]), Some("Maria Novak"));
        assert_eq!(cell_text(&row[5]), Some("Dr. Rita Adams"));
    }

    #[test]
    fn finance_sheet_reports_major_units() {
        let conn = test_conn();
        seed_clinic(&conn);

        let sheet = build_sheet(&conn, ExportTable::FinancialRecords).expect("build failed");
        assert_eq!(sheet.rows.len(), 1);
        match sheet.rows[0][4] {
            Cell::Number(amount) => assert!((amount - 120.0).abs() < f64::EPSILON),
            _ => panic!("amount should be numeric"),
        }
    }

    #[test]
    fn user_sheet_never_includes_credentials() {
        assert!(USER_HEADERS
            .iter()
            .all(|h| !h.to_ascii_lowercase().contains("password")));

        let conn = test_conn();
        let sheet = build_sheet(&conn, ExportTable::Users).expect("build failed");
        // the schema seeds one admin account
        assert_eq!(sheet.rows.len(), 1);
        for cell in &sheet.rows[0] {
            if let Cell::Text(value) = cell {
                assert!(!value.contains("$argon2"), "hash leaked into sheet");
            }
        }
    }
}
