//! Checkout session endpoints
//!
//! `POST /payment-sessions` creates a gateway session and hands the
//! storefront the `requestId` + `processUrl` pair; `GET
//! /payment-sessions/{requestId}` is the thin status wrapper the return
//! page polls.

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::payments::types::{Buyer, Currency, PaymentAttempt, SessionStatus};
use crate::payments::{is_approved, payment_reference, ApprovalPolicy, NewSession};
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub buyer: Option<Buyer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionView {
    pub request_id: i64,
    pub process_url: String,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub request_id: i64,
    pub status: SessionStatus,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Vec<PaymentAttempt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<serde_json::Value>,
}

pub async fn create_payment_session(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionBody>,
) -> AppResult<Json<CreateSessionView>> {
    let reference = body
        .reference
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::validation("reference", "reference is required"))?;
    let description = body
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::validation("description", "description is required"))?;
    let amount = body
        .amount
        .ok_or_else(|| AppError::validation("amount", "amount is required"))?;

    let currency = match body.currency.as_deref() {
        Some(code) => code.parse::<Currency>()?,
        None => Currency::default(),
    };

    let return_url = format!(
        "{}/checkout/return",
        state.config.checkout.public_base_url.trim_end_matches('/')
    );

    let session = NewSession {
        reference,
        description,
        amount,
        currency,
        buyer: body.buyer,
        ip_address: client_ip(&headers, addr),
        user_agent: client_user_agent(&headers),
        return_url,
    };

    let response = state.gateway.create_session(session).await?;

    Ok(Json(CreateSessionView {
        request_id: response.request_id,
        process_url: response.process_url,
        status: response.status,
    }))
}

pub async fn get_payment_session(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<Json<SessionStatusView>> {
    let request_id: i64 = request_id
        .parse()
        .map_err(|_| AppError::validation("requestId", "requestId must be numeric"))?;

    let info = state.gateway.session_info(request_id).await?;
    let policy = ApprovalPolicy::default();
    let approved = is_approved(&info, policy);
    let reference = payment_reference(&info, policy).map(str::to_string);

    info!(request_id, approved, "session status served");

    Ok(Json(SessionStatusView {
        request_id: info.request_id,
        status: info.status,
        approved,
        payment_reference: reference,
        payment: info.payment,
        request: info.request,
    }))
}

fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn client_user_agent(headers: &HeaderMap) -> String {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}
