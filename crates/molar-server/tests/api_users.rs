mod common;

use axum::http::StatusCode;
use common::{admin_token, request, seed_doctor, setup};
use serde_json::json;

#[tokio::test]
async fn listing_filters_by_role() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    seed_doctor(&clinic.app, &admin).await;

    let (status, all) = request(&clinic.app, "GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().expect("array").len(), 2);

    let (_, doctors) = request(
        &clinic.app,
        "GET",
        "/api/users?role=doctor",
        Some(&admin),
        None,
    )
    .await;
    let rows = doctors.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], "rita");
    assert!(
        rows[0].get("password_hash").is_none(),
        "credentials must never be serialized"
    );

    let (status, _) = request(
        &clinic.app,
        "GET",
        "/api/users?role=janitor",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn staff_can_browse_the_roster_but_not_edit_it() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, doctor) = seed_doctor(&clinic.app, &admin).await;

    let (status, roster) = request(&clinic.app, "GET", "/api/users", Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().expect("array").len(), 2);

    let (status, _) = request(
        &clinic.app,
        "PATCH",
        &format!("/api/users/{doctor_id}"),
        Some(&doctor),
        Some(json!({ "phone": "+420 777 000 111" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_edits_profile_and_role() {
    let clinic = setup().await;
    let admin = admin_token(&clinic.app).await;
    let (doctor_id, _) = seed_doctor(&clinic.app, &admin).await;

    let (status, updated) = request(
        &clinic.app,
        "PATCH",
        &format!("/api/users/{doctor_id}"),
        Some(&admin),
        Some(json!({
            "specialization": "Endodontics",
            "phone": "+420 777 000 111"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update failed: {updated}");
    assert_eq!(updated["specialization"], "Endodontics");
    assert_eq!(updated["phone"], "+420 777 000 111");
    assert_eq!(updated["full_name"], "Dr. Rita Adams");

    let (status, _) = request(
        &clinic.app,
        "PATCH",
        "/api/users/4242",
        Some(&admin),
        Some(json!({ "phone": "+420 777 000 111" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
