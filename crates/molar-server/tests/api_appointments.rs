mod common;

use axum::http::StatusCode;
use common::{admin_token, request, seed_doctor, seed_patient, setup};
use serde_json::json;

#[tokio::test]
async fn booked_appointment_carries_resolved_names() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/appointments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": "2025-03-10",
            "start_time": "09:30",
            "end_time": "10:00",
            "appointment_type": "Checkup"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");
    assert_eq!(body["patient_name"], "Maria Novak");
    assert_eq!(body["doctor_name"], "Dr. Rita Adams");
    assert_eq!(body["status"], "scheduled");
    assert!(body["appointment_id"]
        .as_str()
        .expect("record number")
        .starts_with("AP-"));
}

#[tokio::test]
async fn booking_for_a_missing_patient_is_rejected() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;

    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/appointments",
        Some(&admin),
        Some(json!({
            "patient_id": 424242,
            "doctor_id": doctor_id,
            "appointment_date": "2025-03-10",
            "start_time": "09:30"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "referenced record does not exist");
}

#[tokio::test]
async fn listing_filters_by_date_and_status() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    for (date, time, status) in [
        ("2025-03-10", "09:30", "scheduled"),
        ("2025-03-10", "11:00", "cancelled"),
        ("2025-03-11", "09:30", "scheduled"),
    ] {
        let (code, body) = request(
            &clinic.app,
            "POST",
            "/api/appointments",
            Some(&admin),
            Some(json!({
                "patient_id": patient_id,
                "doctor_id": doctor_id,
                "appointment_date": date,
                "start_time": time,
                "status": status
            })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED, "booking failed: {body}");
    }

    let (_, by_date) = request(
        &clinic.app,
        "GET",
        "/api/appointments?date=2025-03-10",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(by_date.as_array().map(Vec::len), Some(2));

    let (_, by_both) = request(
        &clinic.app,
        "GET",
        "/api/appointments?date=2025-03-10&status=cancelled",
        Some(&admin),
        None,
    )
    .await;
    let rows = by_both.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["start_time"], "11:00");

    let (status, body) = request(
        &clinic.app,
        "GET",
        "/api/appointments?status=unheard-of",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "accepted: {body}");
}

#[tokio::test]
async fn status_can_move_between_any_two_values() {
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
    let id = booked["id"].as_i64().expect("id");

    // completed back to scheduled, then to no-show: the desk corrects
    // paperwork in whatever order reality happened
    for status in ["completed", "scheduled", "no-show", "in-progress"] {
        let (code, body) = request(
            &clinic.app,
            "PUT",
            &format!("/api/appointments/{id}"),
            Some(&admin),
            Some(json!({ "status": status })),
        )
        .await;
        assert_eq!(code, StatusCode::OK, "move to {status} failed: {body}");
        assert_eq!(body["status"], status);
    }
}

#[tokio::test]
async fn deleting_a_patient_takes_their_appointments_along() {
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
    let appointment_id = booked["id"].as_i64().expect("id");

    let (status, _) = request(
        &clinic.app,
        "DELETE",
        &format!("/api/patients/{patient_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &clinic.app,
        "GET",
        &format!("/api/appointments/{appointment_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
