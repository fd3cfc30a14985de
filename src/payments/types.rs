//! PlaceToPay wire types
//!
//! Request and response bodies mirror the gateway's JSON verbatim; nothing
//! here is mutated locally after decoding.

use crate::error::AppError;
use crate::payments::auth::AuthCredential;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies the storefront charges in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "UYU")]
    Uyu,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Uyu
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Uyu => write!(f, "UYU"),
        }
    }
}

impl FromStr for Currency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "UYU" => Ok(Currency::Uyu),
            other => Err(AppError::validation(
                "currency",
                format!("unsupported currency '{}', expected USD or UYU", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amount {
    pub currency: Currency,
    pub total: f64,
}

/// Optional buyer details forwarded to the gateway so the payment page
/// comes pre-filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentBlock {
    pub reference: String,
    pub description: String,
    pub amount: Amount,
}

/// Body of `POST {base}/api/session`. Built once per checkout attempt,
/// sent, then discarded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub auth: AuthCredential,
    pub payment: PaymentBlock,
    /// ISO-8601, creation instant + 1 hour.
    pub expiration: String,
    pub return_url: String,
    pub ip_address: String,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Buyer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response to session creation. `request_id` is the only durable handle
/// for the rest of the flow; callers must persist it before navigating the
/// buyer to `process_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub request_id: i64,
    pub process_url: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

/// Result of a status query. Read-only projection of gateway state; the
/// `request_id` round-trips unchanged from creation through every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub request_id: i64,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Vec<PaymentAttempt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<serde_json::Value>,
}

/// Status query body: `{auth}` only.
#[derive(Debug, Clone, Serialize)]
pub struct SessionQueryRequest {
    pub auth: AuthCredential,
}
