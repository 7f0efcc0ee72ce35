//! Error type shared by all clinic record modules.

use thiserror::Error;

/// Errors that can occur during clinic record operations.
#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl ClinicError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the underlying failure is a UNIQUE or PRIMARY KEY
    /// constraint violation (duplicate username, catalogue name, ...).
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            ClinicError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }

    /// True when the underlying failure is a FOREIGN KEY violation, i.e. a
    /// reference to a patient, doctor, or appointment that does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            ClinicError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        )
    }

    /// True when the underlying failure is a CHECK constraint violation,
    /// i.e. a value outside the column's allowed set.
    pub fn is_check_violation(&self) -> bool {
        matches!(
            self,
            ClinicError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK
        )
    }
}
