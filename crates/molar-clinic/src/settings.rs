//! Clinic-wide settings, stored as a key/value table.
//!
//! Settings are seeded with defaults at schema creation and updated as a
//! batch so a partially applied save never leaves mixed old and new values.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::ClinicError;

/// A single clinic setting.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

/// Lists every setting, ordered by key.
pub fn list_settings(conn: &Connection) -> Result<Vec<Setting>, ClinicError> {
    let mut stmt =
        conn.prepare("SELECT key, value, updated_at FROM clinic_settings ORDER BY key ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Setting {
            key: row.get(0)?,
            value: row.get(1)?,
            updated_at: row.get(2)?,
        })
    })?;

    let mut settings = Vec::new();
    for row in rows {
        settings.push(row?);
    }
    Ok(settings)
}

/// Looks up a single setting value.
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, ClinicError> {
    conn.query_row(
        "SELECT value FROM clinic_settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
    .map_err(ClinicError::from)
}

/// Upserts a batch of settings inside one transaction.
pub fn put_settings(conn: &Connection, entries: &[(String, String)]) -> Result<(), ClinicError> {
    let tx = conn.unchecked_transaction()?;
    for (key, value) in entries {
        tx.execute(
            "INSERT INTO clinic_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = datetime('now')",
            params![key, value],
        )?;
    }
    tx.commit()?;
    Ok(())
}
