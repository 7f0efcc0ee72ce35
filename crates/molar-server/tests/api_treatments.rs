mod common;

use axum::http::StatusCode;
use common::{admin_token, request, seed_doctor, seed_patient, setup};
use serde_json::json;

#[tokio::test]
async fn treatment_costs_are_exact_decimal_strings() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/treatments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "treatment_type": "Filling",
            "tooth_number": "36",
            "cost": "85.50"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["cost"], "85.50");
    assert_eq!(body["status"], "planned");
    assert_eq!(body["patient_name"], "Maria Novak");
    assert!(body["treatment_id"]
        .as_str()
        .expect("record number")
        .starts_with("TR-"));

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/treatments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "treatment_type": "Filling",
            "cost": "-10.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "accepted: {body}");
}

#[tokio::test]
async fn doctor_filter_narrows_the_list() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (_, me) = request(&clinic.app, "GET", "/api/auth/me", Some(&admin), None).await;
    let admin_id = me["id"].as_i64().expect("admin id");

    for (doc, label) in [(doctor_id, "Filling"), (admin_id, "Checkup")] {
        let (code, body) = request(
            &clinic.app,
            "POST",
            "/api/treatments",
            Some(&admin),
            Some(json!({
                "patient_id": patient_id,
                "doctor_id": doc,
                "treatment_type": label,
                "cost": "50.00"
            })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED, "create failed: {body}");
    }

    let (_, by_doctor) = request(
        &clinic.app,
        "GET",
        &format!("/api/treatments?doctor={doctor_id}"),
        Some(&admin),
        None,
    )
    .await;
    let rows = by_doctor.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["treatment_type"], "Filling");
    assert_eq!(rows[0]["doctor_name"], "Dr. Rita Adams");
}

#[tokio::test]
async fn deleting_the_appointment_detaches_the_treatment() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (_, booked) = request(
        &clinic.app,
        "POST",
        "/api/appointments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": "2025-03-10",
            "start_time": "09:30"
        })),
    )
    .await;
    let appointment_id = booked["id"].as_i64().expect("appointment id");

    let (_, treatment) = request(
        &clinic.app,
        "POST",
        "/api/treatments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_id": appointment_id,
            "treatment_type": "Extraction",
            "cost": "120.00"
        })),
    )
    .await;
    let treatment_id = treatment["id"].as_i64().expect("treatment id");
    assert_eq!(treatment["appointment_id"], appointment_id);

    let (status, _) = request(
        &clinic.app,
        "DELETE",
        &format!("/api/appointments/{appointment_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, kept) = request(
        &clinic.app,
        "GET",
        &format!("/api/treatments/{treatment_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["appointment_id"], serde_json::Value::Null);
    assert_eq!(kept["cost"], "120.00");
}

#[tokio::test]
async fn update_moves_status_and_cost() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (_, created) = request(
        &clinic.app,
        "POST",
        "/api/treatments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "treatment_type": "Root Canal",
            "cost": "300.00"
        })),
    )
    .await;
    let id = created["id"].as_i64().expect("id");

    let (status, body) = request(
        &clinic.app,
        "PUT",
        &format!("/api/treatments/{id}"),
        Some(&admin),
        Some(json!({
            "status": "completed",
            "cost": "325.75",
            "end_date": "2025-03-12"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "update failed: {body}");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["cost"], "325.75");
    assert_eq!(body["end_date"], "2025-03-12");
}
