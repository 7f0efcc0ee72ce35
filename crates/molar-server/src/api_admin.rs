//! Backup, restore, and export endpoints. All admin only.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    extract::{Extension, Path},
    Json,
};
use molar_db::BackupEntry;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{require_admin, AuthContext};
use crate::{run_blocking, run_db, AppState};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Request body for `POST /api/admin/restore`.
#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    /// A snapshot filename from `GET /api/admin/backups`.
    pub filename: String,
}

fn check_backup_filename(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ApiError::BadRequest(format!(
            "invalid backup filename: {name:?}"
        )));
    }
    Ok(())
}

/// Handler for `POST /api/admin/backups`.
pub async fn create_backup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_admin(&ctx)?;

    let (filename, size_bytes) = run_blocking(move || {
        let path = state.db.backup()?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Ok((filename, size_bytes))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "filename": filename, "size_bytes": size_bytes })),
    ))
}

/// Handler for `GET /api/admin/backups`. Newest snapshot first.
pub async fn list_backups_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<BackupEntry>>, ApiError> {
    require_admin(&ctx)?;

    let entries = run_blocking(move || state.db.list_backups().map_err(ApiError::from)).await?;
    Ok(Json(entries))
}

/// Handler for `DELETE /api/admin/backups/{filename}`.
pub async fn delete_backup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(filename): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin(&ctx)?;
    check_backup_filename(&filename)?;

    run_blocking(move || state.db.delete_backup(&filename).map_err(ApiError::from)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/admin/restore`.
///
/// Only filenames inside the backup directory are accepted here; restoring
/// from an arbitrary path is a library-level operation, not an HTTP one.
/// While the restore runs, other requests wait at the connection gate.
pub async fn restore_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<RestoreRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&ctx)?;
    check_backup_filename(&payload.filename)?;

    let filename = payload.filename;
    let restored = run_blocking(move || {
        let snapshot = state.db.backup_dir().join(&filename);
        state.db.restore(&snapshot)?;
        Ok(filename)
    })
    .await?;

    tracing::info!(filename = %restored, "database restored from snapshot");
    Ok(Json(json!({ "status": "restored", "filename": restored })))
}

/// Handler for `GET /api/admin/export`. One workbook, every table.
pub async fn export_all_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Response, ApiError> {
    require_admin(&ctx)?;
    let export_dir = state.export_dir.clone();
    let cleanup_delay = state.export_cleanup_delay;

    let (path, bytes) = run_db(state, move |conn| {
        let path = molar_export::export_all(conn, &export_dir)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            tracing::error!("reading export file failed: {e}");
            ApiError::Internal
        })?;
        Ok((path, bytes))
    })
    .await?;

    Ok(workbook_response(path, bytes, cleanup_delay))
}

/// Handler for `GET /api/admin/export/{table}`.
pub async fn export_table_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(table): Path<String>,
) -> Result<Response, ApiError> {
    require_admin(&ctx)?;
    let export_dir = state.export_dir.clone();
    let cleanup_delay = state.export_cleanup_delay;

    let (path, bytes) = run_db(state, move |conn| {
        let path = molar_export::export_table(conn, &table, &export_dir)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            tracing::error!("reading export file failed: {e}");
            ApiError::Internal
        })?;
        Ok((path, bytes))
    })
    .await?;

    Ok(workbook_response(path, bytes, cleanup_delay))
}

/// Builds the download response and schedules removal of the file on disk
/// once the grace period passes.
fn workbook_response(path: PathBuf, bytes: Vec<u8>, cleanup_delay: std::time::Duration) -> Response {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export.xlsx")
        .to_string();

    tokio::spawn(async move {
        tokio::time::sleep(cleanup_delay).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), "export cleanup failed: {e}");
        }
    });

    (
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
