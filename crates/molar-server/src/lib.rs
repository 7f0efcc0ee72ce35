//! Molar server library logic.

pub mod api_admin;
pub mod api_appointments;
pub mod api_auth;
pub mod api_catalog;
pub mod api_finance;
pub mod api_patients;
pub mod api_reports;
pub mod api_settings;
pub mod api_treatments;
pub mod api_users;
pub mod config;
pub mod error;
pub mod middleware;
mod validate;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use molar_db::Database;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use error::ApiError;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The clinic database resource.
    pub db: Arc<Database>,
    /// HMAC secret for session tokens.
    pub token_secret: Arc<str>,
    /// Session token lifetime in minutes.
    pub token_ttl_minutes: i64,
    /// Directory where export workbooks are written.
    pub export_dir: PathBuf,
    /// How long a served export file stays on disk.
    pub export_cleanup_delay: Duration,
}

/// Maximum request body size (1 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Runs a blocking closure on the blocking thread pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("blocking task join failed: {e}");
        ApiError::Internal
    })?
}

/// Runs a database closure on the blocking thread pool.
///
/// The closure executes under the database's connection gate, so it can
/// never observe a half-restored file; see [`Database::with_conn`].
pub(crate) async fn run_db<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T, ApiError> + Send + 'static,
{
    run_blocking(move || state.db.with_conn(f)).await
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/register", post(api_auth::register_handler))
        .route("/api/auth/me", get(api_auth::me_handler))
        .route("/api/users", get(api_users::list_users_handler))
        .route(
            "/api/users/{id}",
            get(api_users::get_user_handler).patch(api_users::update_user_handler),
        )
        .route(
            "/api/patients",
            post(api_patients::create_patient_handler).get(api_patients::list_patients_handler),
        )
        .route(
            "/api/patients/{id}",
            get(api_patients::get_patient_handler)
                .put(api_patients::update_patient_handler)
                .delete(api_patients::delete_patient_handler),
        )
        .route(
            "/api/appointments",
            post(api_appointments::create_appointment_handler)
                .get(api_appointments::list_appointments_handler),
        )
        .route(
            "/api/appointments/{id}",
            get(api_appointments::get_appointment_handler)
                .put(api_appointments::update_appointment_handler)
                .delete(api_appointments::delete_appointment_handler),
        )
        .route(
            "/api/treatments",
            post(api_treatments::create_treatment_handler)
                .get(api_treatments::list_treatments_handler),
        )
        .route(
            "/api/treatments/{id}",
            get(api_treatments::get_treatment_handler)
                .put(api_treatments::update_treatment_handler)
                .delete(api_treatments::delete_treatment_handler),
        )
        .route(
            "/api/finance",
            post(api_finance::create_record_handler).get(api_finance::list_records_handler),
        )
        .route(
            "/api/finance/{id}",
            get(api_finance::get_record_handler)
                .put(api_finance::update_record_handler)
                .delete(api_finance::delete_record_handler),
        )
        .route(
            "/api/treatment-types",
            post(api_catalog::create_type_handler).get(api_catalog::list_types_handler),
        )
        .route(
            "/api/treatment-types/{id}",
            get(api_catalog::get_type_handler).put(api_catalog::update_type_handler),
        )
        .route(
            "/api/settings",
            get(api_settings::list_settings_handler).put(api_settings::put_settings_handler),
        )
        .route("/api/reports/summary", get(api_reports::summary_handler))
        .route(
            "/api/admin/backups",
            post(api_admin::create_backup_handler).get(api_admin::list_backups_handler),
        )
        .route(
            "/api/admin/backups/{filename}",
            delete(api_admin::delete_backup_handler),
        )
        .route("/api/admin/restore", post(api_admin::restore_handler))
        .route("/api/admin/export", get(api_admin::export_all_handler))
        .route(
            "/api/admin/export/{table}",
            get(api_admin::export_table_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(api_auth::login_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
