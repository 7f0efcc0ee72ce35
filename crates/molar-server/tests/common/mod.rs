//! Shared harness for the API integration tests.
//!
//! Each test gets its own temporary directory holding the database file,
//! backups, and exports, plus a router wired exactly like production apart
//! from the paths.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use molar_db::{Database, DbRuntimeSettings, SchemaDefaults};
use molar_server::{app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TOKEN_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestClinic {
    pub app: Router,
    pub db: Arc<Database>,
    _root: TempDir,
}

pub async fn setup() -> TestClinic {
    let root = tempfile::tempdir().expect("tempdir");
    let db = Arc::new(Database::new(
        root.path().join("clinic.db"),
        root.path().join("backups"),
        DbRuntimeSettings {
            busy_timeout_ms: 5_000,
            pool_max_size: 2,
        },
    ));
    db.open().expect("open database");
    {
        let pool = db.get().expect("pool after open");
        let conn = pool.get().expect("connection");
        let admin_password_hash =
            molar_auth::hash_password(ADMIN_PASSWORD).expect("hash admin password");
        molar_db::create_schema(
            &conn,
            &SchemaDefaults {
                admin_username: "admin".to_string(),
                admin_email: "admin@clinic.local".to_string(),
                admin_full_name: "Clinic Administrator".to_string(),
                admin_password_hash,
            },
        )
        .expect("create schema");
    }

    let state = AppState {
        db: db.clone(),
        token_secret: TOKEN_SECRET.into(),
        token_ttl_minutes: 60,
        export_dir: root.path().join("exports"),
        export_cleanup_delay: Duration::from_secs(300),
    };

    TestClinic {
        app: app(state),
        db,
        _root: root,
    }
}

/// Sends a request and returns the raw response.
pub async fn raw_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    app.clone().oneshot(request).await.expect("response")
}

/// Sends a request and returns `(status, parsed JSON body)`.
///
/// Empty bodies come back as `Value::Null`.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = raw_request(app, method, uri, token, body).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

pub async fn admin_token(app: &Router) -> String {
    login(app, "admin", ADMIN_PASSWORD).await
}

/// Registers a doctor account and returns `(user_id, token)`.
pub async fn seed_doctor(app: &Router, admin: &str) -> (i64, String) {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/register",
        Some(admin),
        Some(json!({
            "username": "rita",
            "email": "rita@clinic.local",
            "password": "orthodontics-2025",
            "full_name": "Dr. Rita Adams",
            "role": "doctor",
            "specialization": "Orthodontics"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let id = body["id"].as_i64().expect("doctor id");
    let token = login(app, "rita", "orthodontics-2025").await;
    (id, token)
}

/// Creates a patient and returns their internal id.
pub async fn seed_patient(app: &Router, token: &str, first: &str, last: &str) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/api/patients",
        Some(token),
        Some(json!({
            "first_name": first,
            "last_name": last,
            "date_of_birth": "1990-04-12",
            "gender": "female",
            "phone": "+420 601 234 567"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create patient failed: {body}");
    body["id"].as_i64().expect("patient id")
}
