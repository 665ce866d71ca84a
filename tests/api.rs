//! End-to-end tests driving the HTTP router in memory.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use credit_ledger::api::build_router;
use credit_ledger::app_state::{AccessKeys, AppState};
use credit_ledger::config::LedgerPolicy;
use credit_ledger::domain::{Collections, EventBus};

const WEBHOOK_TOKEN: &str = "whsec_test";
const ADMIN_KEY: &str = "admin_test";

fn app() -> Router {
    let state = AppState::new(
        Arc::new(Collections::new()),
        EventBus::new(100),
        LedgerPolicy::default(),
        AccessKeys {
            webhook_token: WEBHOOK_TOKEN.to_string(),
            webhook_token_header: "asaas-access-token".to_string(),
            admin_api_key: ADMIN_KEY.to_string(),
        },
    );
    build_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router failed");
    };
    let status = response.status();
    let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn request(method: Method, uri: &str, body: Option<Value>, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let Ok(req) = builder.body(body) else {
        panic!("bad request");
    };
    req
}

async fn create_user(app: &Router, name: &str, referral_code: Option<&str>) -> Value {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "name": name,
                "email": format!("{name}@example.com"),
                "referral_code": referral_code,
            })),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn pay(app: &Router, event: &str, payment_id: &str, value: f64, user_id: &Value) -> (StatusCode, Value) {
    send(
        app,
        request(
            Method::POST,
            "/webhooks/payments",
            Some(json!({
                "event": event,
                "payment": {
                    "id": payment_id,
                    "value": value,
                    "externalReference": user_id,
                    "description": "credit package",
                }
            })),
            &[("asaas-access-token", WEBHOOK_TOKEN)],
        ),
    )
    .await
}

async fn get_user(app: &Router, id: &Value) -> Value {
    let uri = format!("/api/v1/users/{}", id.as_str().unwrap_or_default());
    let (status, body) = send(app, request(Method::GET, &uri, None, &[])).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn health_and_packages_are_public() {
    let app = app();
    let (status, body) = send(&app, request(Method::GET, "/health", None, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, request(Method::GET, "/config/credit-packages", None, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(4));
    assert_eq!(body[0]["price_cents"], 4_990);
}

#[tokio::test]
async fn webhook_without_token_is_rejected() {
    let app = app();
    let req = request(
        Method::POST,
        "/webhooks/payments",
        Some(json!({"not": "a payment"})),
        &[("asaas-access-token", "wrong")],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn unconfirmed_event_is_ignored() {
    let app = app();
    let user = create_user(&app, "ana", None).await;
    let (status, body) = pay(&app, "PAYMENT_CREATED", "pay_0", 49.9, &user["id"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(get_user(&app, &user["id"]).await["credits"], 0);
}

#[tokio::test]
async fn payment_credits_user_and_pays_referrer_once() {
    let app = app();
    let referrer = create_user(&app, "ana", None).await;
    let code = referrer["referral_code"].as_str().unwrap_or_default().to_string();
    let buyer = create_user(&app, "bruno", Some(&code)).await;
    assert_eq!(buyer["referred_by"], referrer["id"]);

    let (status, body) = pay(&app, "PAYMENT_CONFIRMED", "pay_1", 199.9, &buyer["id"]).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "processed");
    assert_eq!(body["credits_granted"], 60);
    assert_eq!(body["commission"]["commission_cents"], 1_999);
    assert_eq!(body["commission"]["status"], "paid");

    let (status, body) = pay(&app, "PAYMENT_RECEIVED", "pay_1", 199.9, &buyer["id"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "duplicate");

    assert_eq!(get_user(&app, &buyer["id"]).await["credits"], 60);
    assert_eq!(
        get_user(&app, &referrer["id"]).await["multi_level_balance_cents"],
        1_999
    );

    let uri = format!(
        "/api/v1/users/{}/commissions",
        referrer["id"].as_str().unwrap_or_default()
    );
    let (status, body) = send(&app, request(Method::GET, &uri, None, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn payment_for_unknown_user_can_be_retried() {
    let app = app();
    let ghost = json!(uuid::Uuid::new_v4().to_string());
    let (status, _) = pay(&app, "PAYMENT_CONFIRMED", "pay_2", 49.9, &ghost).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = pay(&app, "PAYMENT_CONFIRMED", "pay_2", 49.9, &ghost).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_require_key() {
    let app = app();
    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/admin/commissions", None, &[]),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/admin/commissions",
            None,
            &[("x-admin-key", ADMIN_KEY)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn failed_withdrawal_refunds_the_hold() {
    let app = app();
    let user = create_user(&app, "carla", None).await;
    let id = user["id"].as_str().unwrap_or_default().to_string();
    let admin = [("x-admin-key", ADMIN_KEY)];

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/admin/users/{id}/balance"),
            Some(json!({"delta_cents": 5_000, "reason": "sale bonus"})),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["personal_balance_cents"], 5_000);

    let (status, withdrawal) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/users/{id}/withdrawals"),
            Some(json!({
                "amount_cents": 3_000,
                "destination_key": "carla@pix",
                "source": "personal",
            })),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{withdrawal}");
    assert_eq!(withdrawal["status"], "pending");
    assert_eq!(get_user(&app, &user["id"]).await["personal_balance_cents"], 2_000);

    let (status, queue) = send(
        &app,
        request(Method::GET, "/api/v1/admin/withdrawals?status=pending", None, &admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue["pagination"]["total"], 1);

    let status_uri = format!(
        "/api/v1/admin/withdrawals/{}/status",
        withdrawal["id"].as_str().unwrap_or_default()
    );
    let (status, _) = send(
        &app,
        request(Method::PUT, &status_uri, Some(json!({"status": "done"})), &admin),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &status_uri,
            Some(json!({"status": "failed", "reason": "invalid key"})),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failure_reason"], "invalid key");
    assert_eq!(get_user(&app, &user["id"]).await["personal_balance_cents"], 5_000);
}

#[tokio::test]
async fn lead_unlock_spends_purchased_credits() {
    let app = app();
    let user = create_user(&app, "diego", None).await;
    let id = user["id"].as_str().unwrap_or_default().to_string();

    let (status, lead) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/admin/leads",
            Some(json!({
                "name": "Eva",
                "company": "Mercado Sol",
                "segment": "retail",
                "email": "eva@mercadosol.com",
            })),
            &[("x-admin-key", ADMIN_KEY)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lead}");
    let unlock_uri = format!(
        "/api/v1/users/{id}/leads/{}/unlock",
        lead["id"].as_str().unwrap_or_default()
    );

    let (status, body) = send(&app, request(Method::POST, &unlock_uri, None, &[])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4001);

    let (status, listing) = send(
        &app,
        request(Method::GET, &format!("/api/v1/users/{id}/leads"), None, &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing[0]["email"], "***");

    let (status, _) = pay(&app, "PAYMENT_CONFIRMED", "pay_3", 49.9, &user["id"]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = send(&app, request(Method::POST, &unlock_uri, None, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["unlocked"], true);
    assert_eq!(view["email"], "eva@mercadosol.com");
    assert_eq!(get_user(&app, &user["id"]).await["credits"], 9);

    let (status, proposal) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/users/{id}/proposals"),
            Some(json!({
                "lead_id": lead["id"],
                "title": "Loyalty program",
                "amount_cents": 250_000,
            })),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{proposal}");
    assert_eq!(proposal["status"], "open");
}

#[tokio::test]
async fn revoked_lead_access_returns_forbidden_and_keeps_credits() {
    let app = app();
    let user = create_user(&app, "elisa", None).await;
    let id = user["id"].as_str().unwrap_or_default().to_string();
    let admin = [("x-admin-key", ADMIN_KEY)];

    let (status, lead) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/admin/leads",
            Some(json!({
                "name": "Fabio",
                "company": "Oficina Norte",
                "segment": "auto",
                "phone": "+55 11 98888-0000",
            })),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lead}");

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/v1/admin/users/{id}/permissions"),
            Some(json!({"can_withdraw": true, "can_access_leads": false})),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = pay(&app, "PAYMENT_CONFIRMED", "pay_4", 49.9, &user["id"]).await;
    assert_eq!(status, StatusCode::OK);

    let unlock_uri = format!(
        "/api/v1/users/{id}/leads/{}/unlock",
        lead["id"].as_str().unwrap_or_default()
    );
    let (status, body) = send(&app, request(Method::POST, &unlock_uri, None, &[])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], 1003);
    assert_eq!(get_user(&app, &user["id"]).await["credits"], 10);
}
