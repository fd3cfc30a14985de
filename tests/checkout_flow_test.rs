//! End-to-end checkout tests against an in-process mock gateway
//!
//! The mock speaks the PlaceToPay session protocol, including credential
//! verification: it recomputes the tranKey digest from the decoded nonce,
//! the seed and the shared secret and rejects calls that do not match.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use barraca_backend::api::{self, AppState};
use barraca_backend::config::{
    CheckoutConfig, Config, GatewayConfig, RatesConfig, ServerConfig,
};
use barraca_backend::error::AppError;
use barraca_backend::payments::types::Currency;
use barraca_backend::payments::{
    is_approved, payment_reference, ApprovalPolicy, NewSession, RetryPolicy, WebCheckoutClient,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

const SECRET: &str = "s3cr3t";
const LOGIN: &str = "login123";

#[derive(Clone, Default)]
struct MockGateway {
    sessions: Arc<Mutex<HashMap<i64, String>>>,
    create_attempts: Arc<Mutex<HashMap<String, u32>>>,
    next_id: Arc<AtomicI64>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            create_attempts: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1000)),
        }
    }
}

fn auth_is_valid(auth: &Value) -> bool {
    let (Some(login), Some(tran_key), Some(nonce_b64), Some(seed)) = (
        auth.get("login").and_then(Value::as_str),
        auth.get("tranKey").and_then(Value::as_str),
        auth.get("nonce").and_then(Value::as_str),
        auth.get("seed").and_then(Value::as_str),
    ) else {
        return false;
    };

    if login != LOGIN {
        return false;
    }

    let Ok(raw_nonce) = BASE64.decode(nonce_b64) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&raw_nonce);
    hasher.update(seed.as_bytes());
    hasher.update(SECRET.as_bytes());
    BASE64.encode(hasher.finalize()) == tran_key
}

async fn mock_create_session(
    State(gateway): State<MockGateway>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let auth = body.get("auth").ok_or(StatusCode::UNAUTHORIZED)?;
    if !auth_is_valid(auth) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let reference = body
        .pointer("/payment/reference")
        .and_then(Value::as_str)
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();

    if reference == "order_http_error" {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    // fails the first attempt, succeeds afterwards
    if reference == "order_flaky" {
        let mut attempts = gateway.create_attempts.lock().unwrap();
        let seen = attempts.entry(reference.clone()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    if reference == "order_reject" {
        return Ok(Json(json!({
            "requestId": 0,
            "processUrl": "",
            "status": {"status": "FAILED", "message": "Rejected by gateway"}
        })));
    }

    let request_id = gateway.next_id.fetch_add(1, Ordering::SeqCst);
    gateway
        .sessions
        .lock()
        .unwrap()
        .insert(request_id, reference);

    Ok(Json(json!({
        "requestId": request_id,
        "processUrl": format!("https://checkout.example/session/{request_id}"),
        "status": {"status": "OK"}
    })))
}

async fn mock_session_info(
    State(gateway): State<MockGateway>,
    Path(request_id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let auth = body.get("auth").ok_or(StatusCode::UNAUTHORIZED)?;
    if !auth_is_valid(auth) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let reference = gateway
        .sessions
        .lock()
        .unwrap()
        .get(&request_id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;

    let info = match reference.as_str() {
        "order_pending" => json!({
            "requestId": request_id,
            "status": {"status": "PENDING", "message": "Awaiting payment"}
        }),
        "order_declined" => json!({
            "requestId": request_id,
            "status": {"status": "REJECTED", "message": "Declined"},
            "payment": [
                {"status": {"status": "REJECTED"}}
            ]
        }),
        _ => json!({
            "requestId": request_id,
            "status": {"status": "APPROVED"},
            "payment": [
                {"status": {"status": "APPROVED"}, "authorization": "AUTH123"}
            ],
            "request": {"payment": {"reference": reference}}
        }),
    };

    Ok(Json(info))
}

async fn mock_rates() -> Json<Value> {
    Json(json!({"base": "USD", "rates": {"UYU": 40.0}}))
}

async fn spawn_mock_gateway() -> SocketAddr {
    let gateway = MockGateway::new();
    let app = Router::new()
        .route("/api/session", post(mock_create_session))
        .route("/api/session/:request_id", post(mock_session_info))
        .route("/rates", get(mock_rates))
        .with_state(gateway);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn gateway_config(mock: SocketAddr) -> GatewayConfig {
    GatewayConfig {
        login: LOGIN.to_string(),
        secret_key: SECRET.to_string(),
        base_url: format!("http://{mock}"),
        timeout_secs: 5,
        max_attempts: 1,
    }
}

fn app_config(mock: SocketAddr) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "development".to_string(),
        },
        gateway: gateway_config(mock),
        checkout: CheckoutConfig {
            public_base_url: "https://barraca.example".to_string(),
            redirect_delay_ms: 50,
            approved_path: "/checkout/approved".to_string(),
            rejected_path: "/checkout/rejected".to_string(),
            pending_path: "/checkout/pending".to_string(),
        },
        rates: RatesConfig {
            api_url: format!("http://{mock}/rates"),
            ttl_secs: 3600,
        },
    }
}

async fn spawn_app(mock: SocketAddr) -> SocketAddr {
    let state = AppState::new(app_config(mock)).unwrap();
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

fn new_session(reference: &str) -> NewSession {
    NewSession {
        reference: reference.to_string(),
        description: "Test".to_string(),
        amount: 1500.0,
        currency: Currency::Uyu,
        buyer: None,
        ip_address: "127.0.0.1".to_string(),
        user_agent: "test".to_string(),
        return_url: "https://barraca.example/checkout/return".to_string(),
    }
}

#[tokio::test]
async fn request_id_round_trips_from_creation_to_status() {
    let mock = spawn_mock_gateway().await;
    let client = WebCheckoutClient::new(gateway_config(mock)).unwrap();

    let created = client.create_session(new_session("order_1")).await.unwrap();
    assert!(created.request_id >= 1000);
    assert!(created.process_url.contains(&created.request_id.to_string()));
    assert_eq!(created.status.status, "OK");

    let info = client.session_info(created.request_id).await.unwrap();
    assert_eq!(info.request_id, created.request_id);
    assert!(is_approved(&info, ApprovalPolicy::FirstAttempt));
    assert_eq!(
        payment_reference(&info, ApprovalPolicy::FirstAttempt),
        Some("AUTH123")
    );
}

#[tokio::test]
async fn gateway_business_rejection_surfaces_its_message() {
    let mock = spawn_mock_gateway().await;
    let client = WebCheckoutClient::new(gateway_config(mock)).unwrap();

    let err = client
        .create_session(new_session("order_reject"))
        .await
        .unwrap_err();
    match err {
        AppError::GatewayRejected { message } => assert_eq!(message, "Rejected by gateway"),
        other => panic!("expected GatewayRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn gateway_http_failure_surfaces_the_status_code() {
    let mock = spawn_mock_gateway().await;
    let client = WebCheckoutClient::new(gateway_config(mock)).unwrap();

    let err = client
        .create_session(new_session("order_http_error"))
        .await
        .unwrap_err();
    match err {
        AppError::GatewayHttp { status, .. } => assert_eq!(status, 503),
        other => panic!("expected GatewayHttp, got {other:?}"),
    }
}

#[tokio::test]
async fn single_attempt_policy_does_not_mask_transient_failures() {
    let mock = spawn_mock_gateway().await;
    let client = WebCheckoutClient::new(gateway_config(mock)).unwrap();

    let err = client
        .create_session(new_session("order_flaky"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GatewayHttp { status: 503, .. }));
}

#[tokio::test]
async fn hardened_policy_retries_transient_server_errors() {
    let mock = spawn_mock_gateway().await;
    let client = WebCheckoutClient::with_retry(
        gateway_config(mock),
        RetryPolicy {
            max_attempts: 2,
            backoff: std::time::Duration::from_millis(10),
        },
    )
    .unwrap();

    let created = client
        .create_session(new_session("order_flaky"))
        .await
        .unwrap();
    assert!(created.request_id >= 1000);
}

#[tokio::test]
async fn unknown_request_id_is_a_gateway_http_error() {
    let mock = spawn_mock_gateway().await;
    let client = WebCheckoutClient::new(gateway_config(mock)).unwrap();

    let err = client.session_info(999_999).await.unwrap_err();
    assert!(matches!(err, AppError::GatewayHttp { status: 404, .. }));
}

#[tokio::test]
async fn create_endpoint_returns_request_id_and_process_url() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{app}/payment-sessions"))
        .json(&json!({
            "reference": "order_1",
            "description": "Test",
            "amount": 1500,
            "currency": "UYU"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["requestId"].is_i64());
    assert!(body["processUrl"].as_str().unwrap().starts_with("https://"));
    assert_eq!(body["status"]["status"], "OK");
}

#[tokio::test]
async fn create_endpoint_rejects_non_positive_amounts() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    for amount in [json!(0), json!(-5)] {
        let response = http
            .post(format!("http://{app}/payment-sessions"))
            .json(&json!({
                "reference": "order_1",
                "description": "Test",
                "amount": amount
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION");
    }
}

#[tokio::test]
async fn create_endpoint_rejects_missing_fields() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{app}/payment-sessions"))
        .json(&json!({"amount": 1500}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn status_endpoint_reports_approval_and_reference() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    let created: Value = http
        .post(format!("http://{app}/payment-sessions"))
        .json(&json!({
            "reference": "order_1",
            "description": "Test",
            "amount": 1500,
            "currency": "UYU"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let request_id = created["requestId"].as_i64().unwrap();

    let body: Value = http
        .get(format!("http://{app}/payment-sessions/{request_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["requestId"].as_i64().unwrap(), request_id);
    assert_eq!(body["approved"], true);
    assert_eq!(body["paymentReference"], "AUTH123");
    assert_eq!(body["status"]["status"], "APPROVED");
}

#[tokio::test]
async fn status_endpoint_reports_declined_sessions_as_not_approved() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    let created: Value = http
        .post(format!("http://{app}/payment-sessions"))
        .json(&json!({
            "reference": "order_declined",
            "description": "Test",
            "amount": 1500
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let request_id = created["requestId"].as_i64().unwrap();

    let body: Value = http
        .get(format!("http://{app}/payment-sessions/{request_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["approved"], false);
    assert!(body.get("paymentReference").is_none());
    assert_eq!(body["status"]["status"], "REJECTED");
}

#[tokio::test]
async fn status_endpoint_rejects_non_numeric_ids() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;

    let response = reqwest::get(format!("http://{app}/payment-sessions/order-abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn return_routing_approves_with_reference_in_destination() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    let created: Value = http
        .post(format!("http://{app}/payment-sessions"))
        .json(&json!({
            "reference": "order_1",
            "description": "Test",
            "amount": 1500
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let request_id = created["requestId"].as_i64().unwrap();

    let body: Value = http
        .get(format!(
            "http://{app}/checkout/return?requestId={request_id}"
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["outcome"], "approved");
    assert_eq!(body["reference"], "AUTH123");
    assert_eq!(
        body["destination"],
        "/checkout/approved?reference=AUTH123"
    );
    assert_eq!(body["delayMs"].as_u64().unwrap(), 50);
}

#[tokio::test]
async fn return_routing_sends_pending_sessions_to_the_pending_page() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;
    let http = reqwest::Client::new();

    let created: Value = http
        .post(format!("http://{app}/payment-sessions"))
        .json(&json!({
            "reference": "order_pending",
            "description": "Test",
            "amount": 1500
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let request_id = created["requestId"].as_i64().unwrap();

    let body: Value = http
        .get(format!("http://{app}/checkout/return?stash={request_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["outcome"], "pending");
    assert_eq!(body["destination"], "/checkout/pending");
}

#[tokio::test]
async fn return_routing_without_any_request_id_rejects() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;

    let body: Value = reqwest::get(format!("http://{app}/checkout/return"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["destination"], "/checkout/rejected");
}

#[tokio::test]
async fn health_and_rates_endpoints_respond() {
    let mock = spawn_mock_gateway().await;
    let app = spawn_app(mock).await;

    let health: Value = reqwest::get(format!("http://{app}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["gateway_configured"], true);

    let rate: Value = reqwest::get(format!("http://{app}/rates"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rate["from"], "USD");
    assert_eq!(rate["to"], "UYU");
    assert_eq!(rate["rate"].as_f64().unwrap(), 40.0);
}
