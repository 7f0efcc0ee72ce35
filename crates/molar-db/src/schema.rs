//! Idempotent schema creation and seed data.
//!
//! The clinic runs a single declarative schema rather than versioned
//! migrations: every table and index is written with `IF NOT EXISTS` and
//! every seed row with `INSERT OR IGNORE`, so `create_schema` can run on
//! every startup. The whole pass executes inside one transaction; a failure
//! at any step leaves a fresh database completely empty.

use rusqlite::{params, Connection};
use thiserror::Error;

/// A single table definition, embedded at compile time.
struct TableDef {
    name: &'static str,
    sql: &'static str,
}

/// All tables in dependency order. Referencing tables come after the
/// tables they reference.
const TABLES: &[TableDef] = &[
    TableDef {
        name: "users",
        sql: include_str!("schema/users.sql"),
    },
    TableDef {
        name: "patients",
        sql: include_str!("schema/patients.sql"),
    },
    TableDef {
        name: "appointments",
        sql: include_str!("schema/appointments.sql"),
    },
    TableDef {
        name: "treatments",
        sql: include_str!("schema/treatments.sql"),
    },
    TableDef {
        name: "financial_records",
        sql: include_str!("schema/financial_records.sql"),
    },
    TableDef {
        name: "treatment_types",
        sql: include_str!("schema/treatment_types.sql"),
    },
    TableDef {
        name: "clinic_settings",
        sql: include_str!("schema/clinic_settings.sql"),
    },
];

/// Secondary indexes, applied after all tables exist.
const INDEXES: &[(&str, &str)] = &[
    (
        "idx_patients_name",
        "CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(last_name, first_name);",
    ),
    (
        "idx_appointments_date",
        "CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(appointment_date);",
    ),
    (
        "idx_appointments_patient",
        "CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);",
    ),
    (
        "idx_appointments_doctor",
        "CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id);",
    ),
    (
        "idx_treatments_patient",
        "CREATE INDEX IF NOT EXISTS idx_treatments_patient ON treatments(patient_id);",
    ),
    (
        "idx_financial_records_patient",
        "CREATE INDEX IF NOT EXISTS idx_financial_records_patient ON financial_records(patient_id);",
    ),
    (
        "idx_financial_records_date",
        "CREATE INDEX IF NOT EXISTS idx_financial_records_date ON financial_records(transaction_date);",
    ),
];

/// Treatment catalogue seeded into a fresh database:
/// (name, description, base cost in cents, default duration in minutes).
const TREATMENT_TYPE_SEEDS: &[(&str, &str, i64, i64)] = &[
    ("Checkup", "Routine dental examination", 5_000, 30),
    ("Cleaning", "Professional scale and polish", 8_000, 45),
    ("Filling", "Composite cavity filling", 12_000, 60),
    ("Extraction", "Simple tooth extraction", 15_000, 45),
    ("Root Canal", "Root canal therapy, single canal", 45_000, 90),
    ("Crown", "Porcelain crown placement", 60_000, 90),
    ("Whitening", "In-office whitening session", 25_000, 60),
    ("X-Ray", "Panoramic radiograph", 7_000, 15),
];

/// Clinic metadata keys seeded with their initial values.
const CLINIC_SETTING_SEEDS: &[(&str, &str)] = &[
    ("clinic_name", "Molar Dental Clinic"),
    ("clinic_address", ""),
    ("clinic_phone", ""),
    ("clinic_email", ""),
    ("working_hours", "Mon-Fri 09:00-17:00"),
    ("default_appointment_minutes", "30"),
];

/// Seed values for the bootstrap administrator account.
///
/// The password hash is computed by the caller so this crate stays free of
/// any password-hashing dependency. Seeding uses `INSERT OR IGNORE`: once an
/// admin row exists, later runs never touch it, even with different values.
#[derive(Debug, Clone)]
pub struct SchemaDefaults {
    pub admin_username: String,
    pub admin_email: String,
    pub admin_full_name: String,
    pub admin_password_hash: String,
}

/// Errors that can occur during schema creation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A DDL statement or seed insert failed; the transaction was rolled
    /// back and the database is unchanged.
    #[error("schema step '{stage}' failed: {source}")]
    StepFailed {
        /// The table, index, or seed step that failed.
        stage: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },
}

fn step_failed(stage: &str) -> impl FnOnce(rusqlite::Error) -> SchemaError + '_ {
    move |source| SchemaError::StepFailed {
        stage: stage.to_string(),
        source,
    }
}

/// Creates every table and index and applies seed rows, all inside a single
/// transaction.
///
/// Safe to run on every startup: existing tables, indexes, and seed rows
/// are left untouched.
///
/// # Errors
///
/// Returns `SchemaError::StepFailed` naming the step that failed. Nothing
/// is committed in that case.
pub fn create_schema(conn: &Connection, defaults: &SchemaDefaults) -> Result<(), SchemaError> {
    create_schema_from(conn, TABLES, INDEXES, defaults)
}

fn create_schema_from(
    conn: &Connection,
    tables: &[TableDef],
    indexes: &[(&str, &str)],
    defaults: &SchemaDefaults,
) -> Result<(), SchemaError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(step_failed("begin"))?;

    for table in tables {
        tx.execute_batch(table.sql).map_err(step_failed(table.name))?;
        tracing::debug!(table = table.name, "table ensured");
    }

    for (name, sql) in indexes {
        tx.execute_batch(sql).map_err(step_failed(name))?;
    }

    tx.execute(
        "INSERT OR IGNORE INTO users (username, email, password_hash, full_name, role)
         VALUES (?1, ?2, ?3, ?4, 'admin')",
        params![
            defaults.admin_username,
            defaults.admin_email,
            defaults.admin_password_hash,
            defaults.admin_full_name,
        ],
    )
    .map_err(step_failed("seed_admin_user"))?;

    for (name, description, base_cost_cents, duration) in TREATMENT_TYPE_SEEDS {
        tx.execute(
            "INSERT OR IGNORE INTO treatment_types
                 (name, description, base_cost_cents, default_duration_minutes)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, description, base_cost_cents, duration],
        )
        .map_err(step_failed("seed_treatment_types"))?;
    }

    for (key, value) in CLINIC_SETTING_SEEDS {
        tx.execute(
            "INSERT OR IGNORE INTO clinic_settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(step_failed("seed_clinic_settings"))?;
    }

    tx.commit().map_err(step_failed("commit"))?;
    tracing::debug!("schema ensured");
    Ok(())
}
