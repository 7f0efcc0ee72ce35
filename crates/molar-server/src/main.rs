//! Molar server binary, the main entry point for the clinic backend.
//!
//! Starts an axum HTTP server with structured logging, database
//! initialization, and graceful shutdown on SIGTERM/SIGINT.

use molar_server::config;
use molar_server::{app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("MOLAR_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Secrets have no defaults; refuse to start without them.
    let secrets = config
        .validate()
        .expect("incomplete configuration: set auth.token_secret and auth.bootstrap_admin_password");

    let admin_password_hash = molar_auth::hash_password(&secrets.bootstrap_admin_password)
        .expect("failed to hash bootstrap admin password");

    // Initialize database
    let db = molar_db::Database::new(
        &config.database.path,
        config.database.backup_path(),
        molar_db::DbRuntimeSettings {
            busy_timeout_ms: u64::from(config.database.busy_timeout_ms),
            pool_max_size: config.database.pool_max_size,
        },
    );
    db.open()
        .expect("failed to open database; check database.path in config");

    {
        let pool = db.get().expect("database pool missing after open");
        let conn = pool
            .get()
            .expect("failed to get database connection for schema setup");
        molar_db::create_schema(
            &conn,
            &molar_db::SchemaDefaults {
                admin_username: config.auth.admin_username.clone(),
                admin_email: config.auth.admin_email.clone(),
                admin_full_name: config.auth.admin_full_name.clone(),
                admin_password_hash,
            },
        )
        .expect("failed to create database schema");
        tracing::info!(
            admin_username = %config.auth.admin_username,
            "schema ensured, bootstrap admin account in place"
        );
    }

    // Build application
    let state = AppState {
        db: Arc::new(db),
        token_secret: secrets.token_secret.into(),
        token_ttl_minutes: config.auth.token_ttl_minutes,
        export_dir: config.export.dir.clone().into(),
        export_cleanup_delay: Duration::from_secs(config.export.cleanup_delay_secs),
    };
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting molar server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("molar server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
