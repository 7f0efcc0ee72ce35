//! Financial records: income, expenses, and the reporting summary.
//!
//! Records may point at a patient, treatment, or appointment, but none of
//! those links is required: rent is an expense with no patient. Deleting a
//! linked row clears the reference and keeps the money trail intact.

use molar_types::{new_record_id, Money, PaymentStatus, RecordType, UnknownEnumValue};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

const SELECT_RECORD: &str = "
    SELECT f.id, f.record_id, f.patient_id, f.treatment_id, f.appointment_id,
           p.first_name || ' ' || p.last_name AS patient_name,
           f.record_type, f.category, f.amount_cents, f.description,
           f.payment_method, f.payment_status, f.transaction_date, f.due_date,
           f.notes, f.created_at, f.updated_at
    FROM financial_records f
    LEFT JOIN patients p ON p.id = f.patient_id";

/// A financial record with its patient name resolved, when linked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialRecord {
    /// Internal database ID.
    pub id: i64,
    /// Public record number (e.g. `FR-0ac2d4917b3e`).
    pub record_id: String,
    pub patient_id: Option<i64>,
    pub treatment_id: Option<i64>,
    pub appointment_id: Option<i64>,
    pub patient_name: Option<String>,
    pub record_type: RecordType,
    /// Bookkeeping category ("treatment", "lab-fees", "rent", ...).
    pub category: Option<String>,
    pub amount: Money,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    /// ISO 8601 date the money moved (or is expected to).
    pub transaction_date: String,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for creating a financial record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFinancialRecord {
    pub patient_id: Option<i64>,
    pub treatment_id: Option<i64>,
    pub appointment_id: Option<i64>,
    pub record_type: RecordType,
    pub category: Option<String>,
    pub amount: Money,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    /// Defaults to `pending` when omitted.
    pub payment_status: Option<PaymentStatus>,
    pub transaction_date: String,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

/// Parameters for updating a financial record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFinancialRecordParams {
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub transaction_date: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

/// Optional filters for listing financial records.
#[derive(Debug, Clone, Default)]
pub struct FinanceFilter {
    pub record_type: Option<RecordType>,
    pub payment_status: Option<PaymentStatus>,
    pub patient_id: Option<i64>,
}

/// Totals for the reporting endpoint, in settled and outstanding money.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinanceSummary {
    /// Paid income.
    pub total_income: Money,
    /// Paid expenses.
    pub total_expense: Money,
    /// Income still pending or only partially settled.
    pub outstanding: Money,
}

/// Creates a financial record, assigning a fresh `FR-` record number.
pub fn create_record(
    conn: &Connection,
    params: &NewFinancialRecord,
) -> Result<FinancialRecord, ClinicError> {
    let record_id = new_record_id("FR");
    let payment_status = params.payment_status.unwrap_or(PaymentStatus::Pending);
    conn.execute(
        "INSERT INTO financial_records (
            record_id, patient_id, treatment_id, appointment_id, record_type,
            category, amount_cents, description, payment_method, payment_status,
            transaction_date, due_date, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record_id,
            params.patient_id,
            params.treatment_id,
            params.appointment_id,
            params.record_type.as_str(),
            params.category,
            params.amount.cents(),
            params.description,
            params.payment_method,
            payment_status.as_str(),
            params.transaction_date,
            params.due_date,
            params.notes,
        ],
    )?;
    get_record(conn, conn.last_insert_rowid())
}

/// Retrieves a financial record by internal id.
pub fn get_record(conn: &Connection, id: i64) -> Result<FinancialRecord, ClinicError> {
    conn.query_row(
        &format!("{SELECT_RECORD} WHERE f.id = ?1"),
        [id],
        map_row_to_record,
    )
    .optional()?
    .ok_or_else(|| ClinicError::not_found("financial record", id))
}

/// Lists financial records matching the filter, most recent first.
pub fn list_records(
    conn: &Connection,
    filter: &FinanceFilter,
) -> Result<Vec<FinancialRecord>, ClinicError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(record_type) = filter.record_type {
        clauses.push(format!("f.record_type = ?{idx}"));
        values.push(Box::new(record_type.as_str()));
        idx += 1;
    }
    if let Some(status) = filter.payment_status {
        clauses.push(format!("f.payment_status = ?{idx}"));
        values.push(Box::new(status.as_str()));
        idx += 1;
    }
    if let Some(patient_id) = filter.patient_id {
        clauses.push(format!("f.patient_id = ?{idx}"));
        values.push(Box::new(patient_id));
    }

    let mut sql = String::from(SELECT_RECORD);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY f.transaction_date DESC, f.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(params.as_slice(), map_row_to_record)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

/// Updates a financial record using a single atomic UPDATE statement.
pub fn update_record(
    conn: &Connection,
    id: i64,
    updates: &UpdateFinancialRecordParams,
) -> Result<(), ClinicError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(category) = &updates.category {
        set_parts.push(format!("category = ?{}", idx));
        values.push(Box::new(category.clone()));
        idx += 1;
    }
    if let Some(amount) = &updates.amount {
        set_parts.push(format!("amount_cents = ?{}", idx));
        values.push(Box::new(amount.cents()));
        idx += 1;
    }
    if let Some(description) = &updates.description {
        set_parts.push(format!("description = ?{}", idx));
        values.push(Box::new(description.clone()));
        idx += 1;
    }
    if let Some(method) = &updates.payment_method {
        set_parts.push(format!("payment_method = ?{}", idx));
        values.push(Box::new(method.clone()));
        idx += 1;
    }
    if let Some(status) = &updates.payment_status {
        set_parts.push(format!("payment_status = ?{}", idx));
        values.push(Box::new(status.as_str()));
        idx += 1;
    }
    if let Some(date) = &updates.transaction_date {
        set_parts.push(format!("transaction_date = ?{}", idx));
        values.push(Box::new(date.clone()));
        idx += 1;
    }
    if let Some(due) = &updates.due_date {
        set_parts.push(format!("due_date = ?{}", idx));
        values.push(Box::new(due.clone()));
        idx += 1;
    }
    if let Some(notes) = &updates.notes {
        set_parts.push(format!("notes = ?{}", idx));
        values.push(Box::new(notes.clone()));
        idx += 1;
    }

    if set_parts.is_empty() {
        let _ = get_record(conn, id)?;
        return Ok(());
    }
    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE financial_records SET {} WHERE id = ?{}",
        set_parts.join(", "),
        idx
    );
    values.push(Box::new(id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(ClinicError::not_found("financial record", id));
    }
    Ok(())
}

/// Deletes a financial record.
pub fn delete_record(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    let count = conn.execute("DELETE FROM financial_records WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(ClinicError::not_found("financial record", id));
    }
    Ok(())
}

/// Computes the clinic-wide money totals in a single scan.
pub fn financial_summary(conn: &Connection) -> Result<FinanceSummary, ClinicError> {
    let (income, expense, outstanding): (i64, i64, i64) = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN record_type = 'income'
                              AND payment_status = 'paid'
                              THEN amount_cents END), 0),
            COALESCE(SUM(CASE WHEN record_type = 'expense'
                              AND payment_status = 'paid'
                              THEN amount_cents END), 0),
            COALESCE(SUM(CASE WHEN record_type = 'income'
                              AND payment_status IN ('pending', 'partial')
                              THEN amount_cents END), 0)
         FROM financial_records",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(FinanceSummary {
        total_income: Money::from_cents(income),
        total_expense: Money::from_cents(expense),
        outstanding: Money::from_cents(outstanding),
    })
}

fn map_row_to_record(row: &Row) -> rusqlite::Result<FinancialRecord> {
    let type_str: String = row.get(6)?;
    let record_type = RecordType::from_str(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            Box::new(UnknownEnumValue(type_str.clone())),
        )
    })?;

    let status_str: String = row.get(11)?;
    let payment_status = PaymentStatus::from_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            Box::new(UnknownEnumValue(status_str.clone())),
        )
    })?;

    Ok(FinancialRecord {
        id: row.get(0)?,
        record_id: row.get(1)?,
        patient_id: row.get(2)?,
        treatment_id: row.get(3)?,
        appointment_id: row.get(4)?,
        patient_name: row.get(5)?,
        record_type,
        category: row.get(7)?,
        amount: Money::from_cents(row.get(8)?),
        description: row.get(9)?,
        payment_method: row.get(10)?,
        payment_status,
        transaction_date: row.get(12)?,
        due_date: row.get(13)?,
        notes: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}
