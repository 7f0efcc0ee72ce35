mod common;

use axum::http::StatusCode;
use common::{admin_token, request, seed_patient, setup};
use serde_json::json;

#[tokio::test]
async fn create_assigns_a_record_number() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/patients",
        Some(&admin),
        Some(json!({
            "first_name": "Maria",
            "last_name": "Novak",
            "date_of_birth": "1990-04-12",
            "gender": "female",
            "email": "maria@example.org"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    let record = body["patient_id"].as_str().expect("record number");
    assert!(record.starts_with("PT-"), "got {record}");
    assert_eq!(body["first_name"], "Maria");
    assert_eq!(body["phone"], serde_json::Value::Null);
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/patients",
        Some(&admin),
        Some(json!({
            "first_name": "  ",
            "last_name": "Novak",
            "date_of_birth": "1990-04-12",
            "gender": "female"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "accepted: {body}");

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/patients",
        Some(&admin),
        Some(json!({
            "first_name": "Maria",
            "last_name": "Novak",
            "date_of_birth": "12.04.1990",
            "gender": "female"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "accepted: {body}");
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn search_matches_name_and_record_number() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    seed_patient(&clinic.app, &admin, "Maria", "Novak").await;
    seed_patient(&clinic.app, &admin, "Jan", "Svoboda").await;

    let (status, all) = request(&clinic.app, "GET", "/api/patients", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (_, by_name) = request(
        &clinic.app,
        "GET",
        "/api/patients?search=nov",
        Some(&admin),
        None,
    )
    .await;
    let matches = by_name.as_array().expect("array");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["last_name"], "Novak");

    let record = matches[0]["patient_id"].as_str().expect("record number");
    let (_, by_record) = request(
        &clinic.app,
        "GET",
        &format!("/api/patients?search={record}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(by_record.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn update_changes_only_what_was_sent() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (status, body) = request(
        &clinic.app,
        "PUT",
        &format!("/api/patients/{id}"),
        Some(&admin),
        Some(json!({ "allergies": "penicillin", "insurance_provider": "VZP" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "update failed: {body}");
    assert_eq!(body["allergies"], "penicillin");
    assert_eq!(body["insurance_provider"], "VZP");
    assert_eq!(body["first_name"], "Maria");
    assert_eq!(body["phone"], "+420 601 234 567");
}

#[tokio::test]
async fn missing_patient_is_not_found() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;

    let (status, body) = request(&clinic.app, "GET", "/api/patients/999", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = request(
        &clinic.app,
        "PUT",
        "/api/patients/999",
        Some(&admin),
        Some(json!({ "notes": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &clinic.app,
        "DELETE",
        "/api/patients/999",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (status, _) = request(
        &clinic.app,
        "DELETE",
        &format!("/api/patients/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &clinic.app,
        "GET",
        &format!("/api/patients/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
