//! The API error type and its mappings from the domain crates.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use molar_auth::AuthError;
use molar_clinic::ClinicError;
use molar_db::{BackupError, DbError};
use molar_export::ExportError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Everything a handler can fail with funnels through here; internal detail
/// goes to the log, not the response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unavailable(&'static str),
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        if err.is_unique_violation() {
            return ApiError::Conflict("a record with that value already exists".to_string());
        }
        if err.is_foreign_key_violation() {
            return ApiError::BadRequest("referenced record does not exist".to_string());
        }
        if err.is_check_violation() {
            return ApiError::BadRequest("value outside the allowed set".to_string());
        }
        match err {
            ClinicError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ClinicError::Database(e) => {
                tracing::error!("database error: {e}");
                ApiError::Internal
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotInitialized => ApiError::Unavailable("database is not open"),
            other => {
                tracing::error!("database layer error: {other}");
                ApiError::Internal
            }
        }
    }
}

impl From<BackupError> for ApiError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::SnapshotNotFound(_) | BackupError::NotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            BackupError::InvalidFilename(_) => ApiError::BadRequest(err.to_string()),
            BackupError::RestoreInconsistent { stage, source } => {
                tracing::error!(stage, "restore left the database unavailable: {source}");
                ApiError::Unavailable("restore failed; the database needs attention")
            }
            BackupError::Db(e) => ApiError::from(e),
            BackupError::Io(e) => {
                tracing::error!("backup io error: {e}");
                ApiError::Internal
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidTable(_) => ApiError::BadRequest(err.to_string()),
            other => {
                tracing::error!("export failed: {other}");
                ApiError::Internal
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::Unauthorized("token expired"),
            AuthError::InvalidToken(_) => ApiError::Unauthorized("invalid token"),
            AuthError::Hash(e) => {
                tracing::error!("password hashing failed: {e}");
                ApiError::Internal
            }
        }
    }
}
