// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use leadhub_api::bootstrap_admin;
use leadhub_persistence::SqlitePersistence;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::{AppState, build_router};

pub const ADMIN_LOGIN: &str = "root-admin";
pub const PASSWORD: &str = "Harbor-Light-42";

/// A router over a fresh in-memory database with one admin.
pub fn test_app() -> (Router, AppState) {
    let mut persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
    bootstrap_admin(
        &mut persistence,
        ADMIN_LOGIN,
        PASSWORD,
        OffsetDateTime::now_utc(),
    )
    .expect("Failed to bootstrap admin");

    let app_state: AppState = AppState::new(persistence, Duration::hours(1));
    (build_router(app_state.clone()), app_state)
}

/// Sends one request and returns the status with the decoded JSON body
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request: Request<Body> = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status: StatusCode = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn login(app: &Router, login_name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/session/login",
        None,
        Some(json!({ "login_name": login_name, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["session_token"].as_str().unwrap().to_string()
}

/// Creates a vendor serving `category` and returns its id and a session token.
pub async fn create_vendor(
    app: &Router,
    admin_token: &str,
    login_name: &str,
    category: &str,
) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/vendors",
        Some(admin_token),
        Some(json!({
            "business_name": format!("{login_name} Services"),
            "contact_email": format!("{login_name}@vendors.example.com"),
            "phone": "(512) 555-0100",
            "categories": [category],
            "service_areas": "Austin",
            "login_name": login_name,
            "display_name": "Front Desk",
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create vendor failed: {body}");
    let vendor_id: i64 = body["vendor"]["vendor_id"].as_i64().unwrap();
    (vendor_id, login(app, login_name).await)
}

/// Creates a plan and grants it to the vendor.
pub async fn subscribe(app: &Router, admin_token: &str, vendor_id: i64, quota: i64) {
    let (status, plan) = send(
        app,
        "POST",
        "/api/admin/plans",
        Some(admin_token),
        Some(json!({
            "name": format!("Bundle {quota}"),
            "description": "Monthly lead bundle",
            "lead_quota": quota,
            "duration_days": 30,
            "price_cents": 4900,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create plan failed: {plan}");

    let (status, body) = send(
        app,
        "POST",
        &format!("/api/admin/vendors/{vendor_id}/subscriptions"),
        Some(admin_token),
        Some(json!({ "plan_id": plan["plan_id"], "payment_reference": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "grant failed: {body}");
}

pub async fn submit_lead(app: &Router, category: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/public/leads",
        None,
        Some(json!({
            "customer_name": "Dana Whitfield",
            "customer_email": "dana@example.com",
            "customer_phone": "512-555-0199",
            "category": category,
            "location": "Austin, TX",
            "description": "Kitchen sink leaks under the cabinet",
            "budget_cents": 25000,
            "preferred_date": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit failed: {body}");
    body["lead_id"].as_i64().unwrap()
}

/// Submits and publishes a lead, returning its id.
pub async fn published_lead(app: &Router, admin_token: &str, category: &str) -> i64 {
    let lead_id: i64 = submit_lead(app, category).await;
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/admin/leads/{lead_id}/publish"),
        Some(admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "publish failed: {body}");
    lead_id
}
