//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Spreadsheet export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Directory for backup snapshots. Defaults to a `backups` directory
    /// next to the database file.
    #[serde(default)]
    pub backup_dir: Option<String>,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Maximum connections in the pool.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

impl DatabaseConfig {
    /// Resolves the backup directory, deriving one from the database path
    /// when none is configured.
    pub fn backup_path(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => PathBuf::from(dir),
            None => match Path::new(&self.path).parent() {
                Some(parent) => parent.join("backups"),
                None => PathBuf::from("backups"),
            },
        }
    }
}

/// Authentication configuration.
///
/// The token secret and the bootstrap admin password have no defaults.
/// [`Config::validate`] refuses to produce [`Secrets`] without them, so a
/// server can never start with a well-known credential baked in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Required, at least 32 bytes.
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Session token lifetime in minutes.
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// Password for the seeded admin account. Required on first start,
    /// at least 8 characters.
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,

    /// Username for the seeded admin account.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Email for the seeded admin account.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Display name for the seeded admin account.
    #[serde(default = "default_admin_full_name")]
    pub admin_full_name: String,
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory where export workbooks are written.
    #[serde(default = "default_export_dir")]
    pub dir: String,

    /// Seconds an export file stays on disk after being served.
    #[serde(default = "default_cleanup_delay_secs")]
    pub cleanup_delay_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "molar_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Secrets extracted by [`Config::validate`].
///
/// Kept out of [`Config`] so the rest of the startup path can log and pass
/// the config around without credential material in it.
#[derive(Debug)]
pub struct Secrets {
    pub token_secret: String,
    pub bootstrap_admin_password: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "clinic.db".to_string()
}

fn default_busy_timeout_ms() -> u32 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_token_ttl_minutes() -> i64 {
    480
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@clinic.local".to_string()
}

fn default_admin_full_name() -> String {
    "Clinic Administrator".to_string()
}

fn default_export_dir() -> String {
    "exports".to_string()
}

fn default_cleanup_delay_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            backup_dir: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_minutes: default_token_ttl_minutes(),
            bootstrap_admin_password: None,
            admin_username: default_admin_username(),
            admin_email: default_admin_email(),
            admin_full_name: default_admin_full_name(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            cleanup_delay_secs: default_cleanup_delay_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required secret is absent from both config file and environment.
    #[error("missing required secret: {0}")]
    MissingSecret(&'static str),

    /// A secret is present but too short to be safe.
    #[error("secret too weak: {0}")]
    WeakSecret(&'static str),
}

impl Config {
    /// Checks the secrets and hands them out.
    ///
    /// The token secret must be at least 32 bytes and the bootstrap admin
    /// password at least 8 characters. There are no fallback values.
    pub fn validate(&self) -> Result<Secrets, ConfigError> {
        let token_secret = self
            .auth
            .token_secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret(
                "auth.token_secret (or MOLAR_TOKEN_SECRET)",
            ))?;
        if token_secret.len() < 32 {
            return Err(ConfigError::WeakSecret(
                "auth.token_secret must be at least 32 bytes",
            ));
        }

        let bootstrap_admin_password = self
            .auth
            .bootstrap_admin_password
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret(
                "auth.bootstrap_admin_password (or MOLAR_ADMIN_PASSWORD)",
            ))?;
        if bootstrap_admin_password.len() < 8 {
            return Err(ConfigError::WeakSecret(
                "auth.bootstrap_admin_password must be at least 8 characters",
            ));
        }

        Ok(Secrets {
            token_secret,
            bootstrap_admin_password,
        })
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MOLAR_HOST` overrides `server.host`
/// - `MOLAR_PORT` overrides `server.port`
/// - `MOLAR_DB_PATH` overrides `database.path`
/// - `MOLAR_BACKUP_DIR` overrides `database.backup_dir`
/// - `MOLAR_EXPORT_DIR` overrides `export.dir`
/// - `MOLAR_TOKEN_SECRET` overrides `auth.token_secret`
/// - `MOLAR_ADMIN_PASSWORD` overrides `auth.bootstrap_admin_password`
/// - `MOLAR_LOG_LEVEL` overrides `logging.level`
/// - `MOLAR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("MOLAR_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("MOLAR_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("MOLAR_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(backup_dir) = std::env::var("MOLAR_BACKUP_DIR") {
        config.database.backup_dir = Some(backup_dir);
    }
    if let Ok(export_dir) = std::env::var("MOLAR_EXPORT_DIR") {
        config.export.dir = export_dir;
    }
    if let Ok(secret) = std::env::var("MOLAR_TOKEN_SECRET") {
        config.auth.token_secret = Some(secret);
    }
    if let Ok(password) = std::env::var("MOLAR_ADMIN_PASSWORD") {
        config.auth.bootstrap_admin_password = Some(password);
    }
    if let Ok(level) = std::env::var("MOLAR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("MOLAR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
