//! Spreadsheet exports of clinic data.
//!
//! Exports either a single table or the whole clinic into an `.xlsx`
//! workbook. The set of exportable tables is a closed list checked before
//! any database work happens, so a bad table name can never reach SQL.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

mod sheets;
mod workbook;

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested name is not in the exportable table list.
    #[error("not an exportable table: {0:?}")]
    InvalidTable(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The tables that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    Patients,
    Appointments,
    Treatments,
    FinancialRecords,
    Users,
    TreatmentTypes,
}

impl ExportTable {
    /// Every exportable table, in workbook sheet order.
    pub const ALL: [ExportTable; 6] = [
        ExportTable::Patients,
        ExportTable::Appointments,
        ExportTable::Treatments,
        ExportTable::FinancialRecords,
        ExportTable::Users,
        ExportTable::TreatmentTypes,
    ];

    /// Parses a table name as used in the export API.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "patients" => Some(Self::Patients),
            "appointments" => Some(Self::Appointments),
            "treatments" => Some(Self::Treatments),
            "financial_records" => Some(Self::FinancialRecords),
            "users" => Some(Self::Users),
            "treatment_types" => Some(Self::TreatmentTypes),
            _ => None,
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Appointments => "appointments",
            Self::Treatments => "treatments",
            Self::FinancialRecords => "financial_records",
            Self::Users => "users",
            Self::TreatmentTypes => "treatment_types",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Patients => "Patients",
            Self::Appointments => "Appointments",
            Self::Treatments => "Treatments",
            Self::FinancialRecords => "Financial Records",
            Self::Users => "Users",
            Self::TreatmentTypes => "Treatment Types",
        }
    }
}

/// Exports one table to a timestamped workbook under `export_dir`.
///
/// The table name is validated before the connection is touched; an unknown
/// name returns [`ExportError::InvalidTable`] and writes nothing.
pub fn export_table(
    conn: &Connection,
    table_name: &str,
    export_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let table = ExportTable::parse(table_name)
        .ok_or_else(|| ExportError::InvalidTable(table_name.to_string()))?;
    let sheet = sheets::build_sheet(conn, table)?;
    workbook::write_workbook(&[sheet], export_dir, table.table_name())
}

/// Exports every table into one workbook, one sheet per table.
pub fn export_all(conn: &Connection, export_dir: &Path) -> Result<PathBuf, ExportError> {
    let mut built = Vec::with_capacity(ExportTable::ALL.len());
    for table in ExportTable::ALL {
        built.push(sheets::build_sheet(conn, table)?);
    }
    workbook::write_workbook(&built, export_dir, "clinic-export")
}
