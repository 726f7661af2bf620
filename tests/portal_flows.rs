//! End-to-end flows through the full router against the in-memory backend.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use hospital_portal::backend::{MemoryBackend, Table};
use hospital_portal::config::AppConfig;
use hospital_portal::routes::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn portal() -> (Router, Arc<MemoryBackend>) {
    let backend = Arc::new(
        MemoryBackend::new("integration-secret")
            .with_hash_cost(4)
            .with_demo_data(),
    );
    let app = hospital_portal::create_app(AppState::new(backend.clone()), &AppConfig::default());
    (app, backend)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn patient_signs_up_books_and_edits_profile() {
    let (app, backend) = portal();

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Jane Doe", "email": "jane@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "jane@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, options) = call(&app, "GET", "/api/appointments/options", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let doctor = options["doctors"][0].clone();
    let date = (Utc::now().date_naive() + Duration::days(3))
        .format("%Y-%m-%d")
        .to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/api/appointments",
        Some(&token),
        Some(json!({
            "doctor_id": doctor["id"],
            "appointment_date": date,
            "appointment_time": options["time_slots"][0],
            "reason": "Annual checkup"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["status"], "pending");

    let (status, profile) = call(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["patient"]["email"], "jane@example.com");
    assert_eq!(profile["appointments"].as_array().unwrap().len(), 1);
    assert_eq!(profile["appointments"][0]["doctor"]["name"], doctor["name"]);

    let mut form = profile["form"].clone();
    form["phone"] = json!("+1 555 0100");
    form["blood_group"] = json!("A-");
    let (status, body) = call(&app, "PUT", "/api/profile", Some(&token), Some(form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient"]["phone"], "+1 555 0100");
    assert_eq!(body["patient"]["blood_group"], "A-");
    assert_eq!(backend.rows(Table::Patients).await.len(), 1);

    let (status, _) = call(&app, "POST", "/api/auth/signout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "login");
}

#[tokio::test]
async fn visitor_browses_and_sends_a_message() {
    let (app, backend) = portal();

    let (status, home) = call(&app, "GET", "/api/home", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(home["departments"].as_array().unwrap().len(), 6);

    let (_, all) = call(&app, "GET", "/api/doctors", None, None).await;
    let (_, cardio) = call(&app, "GET", "/api/doctors?specialization=Cardiologist", None, None).await;
    assert!(cardio["doctors"].as_array().unwrap().len() < all["doctors"].as_array().unwrap().len());
    assert!(cardio["doctors"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["specialization"] == "Cardiologist"));

    let (status, body) = call(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({
            "name": "Sam",
            "email": "sam@example.com",
            "subject": "Parking",
            "message": "Is there parking on site?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["form"]["name"], "");
    assert_eq!(backend.rows(Table::ContactMessages).await.len(), 1);

    let (status, body) = call(
        &app,
        "POST",
        "/api/appointments",
        None,
        Some(json!({ "doctor_id": all["doctors"][0]["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "login");
    assert!(backend.rows(Table::Appointments).await.is_empty());
}
