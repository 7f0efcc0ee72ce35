//! Clinic record keeping: patients, staff, appointments, treatments,
//! the treatment-type catalogue, financial records, and clinic settings.
//!
//! Every operation is a free function taking a [`rusqlite::Connection`], so
//! callers decide pooling, locking, and transaction boundaries. Reads that
//! cross entities (an appointment with its patient and doctor names) join at
//! the SQL level rather than stitching rows together in Rust.

pub mod appointments;
pub mod catalog;
pub mod error;
pub mod finance;
pub mod patients;
pub mod settings;
pub mod treatments;
pub mod users;

pub use error::ClinicError;

#[cfg(test)]
fn test_conn() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().expect("open in-memory db");
    conn.pragma_update(None, "foreign_keys", "ON")
        .expect("enable foreign keys");
    molar_db::create_schema(
        &conn,
        &molar_db::SchemaDefaults {
            admin_username: "admin".to_string(),
            admin_email: "admin@clinic.local".to_string(),
            admin_full_name: "Clinic Administrator".to_string(),
            admin_password_hash: "$argon2id$test".to_string(),
        },
    )
    .expect("create schema");
    conn
}

#[cfg(test)]
fn seed_doctor(conn: &rusqlite::Connection, username: &str, full_name: &str) -> i64 {
    users::create_user(
        conn,
        &users::NewUser {
            username: username.to_string(),
            email: format!("{username}@clinic.local"),
            password_hash: "$argon2id$test".to_string(),
            full_name: full_name.to_string(),
            role: molar_types::Role::Doctor,
            specialization: Some("General dentistry".to_string()),
            phone: None,
        },
    )
    .expect("seed doctor")
    .id
}

#[cfg(test)]
fn seed_patient(conn: &rusqlite::Connection, first_name: &str, last_name: &str) -> i64 {
    patients::create_patient(
        conn,
        &patients::NewPatient {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth: "1990-04-12".to_string(),
            gender: molar_types::Gender::Female,
            phone: Some("+420 601 234 567".to_string()),
            email: None,
            address: None,
            medical_history: None,
            allergies: None,
            insurance_provider: None,
            insurance_number: None,
            notes: None,
        },
    )
    .expect("seed patient")
    .id
}
