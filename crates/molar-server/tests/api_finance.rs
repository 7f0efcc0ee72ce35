mod common;

use axum::http::StatusCode;
use common::{admin_token, request, seed_doctor, seed_patient, setup};
use serde_json::json;

async fn post_record(
    app: &axum::Router,
    token: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let (status, record) = request(app, "POST", "/api/finance", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {record}");
    record
}

#[tokio::test]
async fn ledger_entries_resolve_patient_names() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let record = post_record(
        &clinic.app,
        &admin,
        json!({
            "patient_id": patient_id,
            "record_type": "income",
            "category": "treatment",
            "amount": "120.00",
            "payment_status": "paid",
            "transaction_date": "2025-03-10"
        }),
    )
    .await;

    assert!(record["record_id"]
        .as_str()
        .expect("record number")
        .starts_with("FR-"));
    assert_eq!(record["amount"], "120.00");
    assert_eq!(record["patient_name"], "Maria Novak");
    assert_eq!(record["payment_status"], "paid");
}

#[tokio::test]
async fn list_filters_by_type_status_and_patient() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    post_record(
        &clinic.app,
        &admin,
        json!({
            "patient_id": patient_id,
            "record_type": "income",
            "amount": "200.00",
            "payment_status": "pending",
            "transaction_date": "2025-03-10"
        }),
    )
    .await;
    post_record(
        &clinic.app,
        &admin,
        json!({
            "record_type": "expense",
            "category": "supplies",
            "amount": "45.00",
            "payment_status": "paid",
            "transaction_date": "2025-03-11"
        }),
    )
    .await;

    let (_, incomes) = request(
        &clinic.app,
        "GET",
        "/api/finance?type=income",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(incomes.as_array().expect("array").len(), 1);
    assert_eq!(incomes[0]["record_type"], "income");

    let (_, pending) = request(
        &clinic.app,
        "GET",
        "/api/finance?status=pending",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(pending.as_array().expect("array").len(), 1);
    assert_eq!(pending[0]["amount"], "200.00");

    let (_, for_patient) = request(
        &clinic.app,
        "GET",
        &format!("/api/finance?patient={patient_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(for_patient.as_array().expect("array").len(), 1);

    let (status, _) = request(
        &clinic.app,
        "GET",
        "/api/finance?type=refund",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settling_a_record_moves_it_out_of_outstanding() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;

    let record = post_record(
        &clinic.app,
        &admin,
        json!({
            "record_type": "income",
            "amount": "140.00",
            "transaction_date": "2025-03-10"
        }),
    )
    .await;
    // Omitted payment_status lands as pending.
    assert_eq!(record["payment_status"], "pending");
    let id = record["id"].as_i64().expect("id");

    let (status, updated) = request(
        &clinic.app,
        "PUT",
        &format!("/api/finance/{id}"),
        Some(&admin),
        Some(json!({ "payment_status": "paid", "payment_method": "card" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update failed: {updated}");
    assert_eq!(updated["payment_status"], "paid");
    assert_eq!(updated["payment_method"], "card");

    let (_, outstanding) = request(
        &clinic.app,
        "GET",
        "/api/finance?status=pending",
        Some(&admin),
        None,
    )
    .await;
    assert!(outstanding.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn deleted_records_leave_the_ledger() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;

    let record = post_record(
        &clinic.app,
        &admin,
        json!({
            "record_type": "expense",
            "amount": "30.00",
            "payment_status": "paid",
            "transaction_date": "2025-03-09"
        }),
    )
    .await;
    let id = record["id"].as_i64().expect("id");

    let (status, _) = request(
        &clinic.app,
        "DELETE",
        &format!("/api/finance/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &clinic.app,
        "GET",
        &format!("/api/finance/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_summary_tallies_the_clinic() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;
    let patient_id = seed_patient(&clinic.app, &admin, "Maria", "Novak").await;

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let (status, body) = request(
        &clinic.app,
        "POST",
        "/api/appointments",
        Some(&admin),
        Some(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": today,
            "start_time": "10:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");

    post_record(
        &clinic.app,
        &admin,
        json!({
            "record_type": "income",
            "amount": "120.00",
            "payment_status": "paid",
            "transaction_date": "2025-03-10"
        }),
    )
    .await;
    post_record(
        &clinic.app,
        &admin,
        json!({
            "record_type": "expense",
            "amount": "45.00",
            "payment_status": "paid",
            "transaction_date": "2025-03-10"
        }),
    )
    .await;
    post_record(
        &clinic.app,
        &admin,
        json!({
            "record_type": "income",
            "amount": "140.00",
            "payment_status": "pending",
            "transaction_date": "2025-03-11"
        }),
    )
    .await;

    let (status, summary) = request(
        &clinic.app,
        "GET",
        "/api/reports/summary",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "summary failed: {summary}");
    assert_eq!(summary["patients"], 1);
    assert_eq!(summary["appointments_today"], 1);
    assert_eq!(summary["finance"]["total_income"], "120.00");
    assert_eq!(summary["finance"]["total_expense"], "45.00");
    assert_eq!(summary["finance"]["outstanding"], "140.00");
}
