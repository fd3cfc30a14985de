//! Application error taxonomy
//!
//! Every failure that can cross the HTTP boundary is converted into one of
//! these variants; handlers never leak raw reqwest/serde errors to callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input to session creation. Not retried.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The gateway answered with a non-2xx HTTP status.
    #[error("Gateway HTTP error {status}: {body}")]
    GatewayHttp { status: u16, body: String },

    /// The gateway answered 2xx but its embedded status reports failure.
    #[error("Gateway rejected the request: {message}")]
    GatewayRejected { message: String },

    /// Network or decode failure while talking to the gateway.
    #[error("Gateway transport error: {message}")]
    GatewayTransport { message: String },

    /// No usable request id could be resolved on return from the gateway.
    /// Indicates a redirect/storage defect rather than a payment failure.
    #[error("No request id could be resolved from the return context")]
    CorrelationLost,

    /// Transport/parse failure while polling status after the redirect.
    /// Treated as a rejection by the return flow (fail closed).
    #[error("Status polling failed: {message}")]
    PollingTransport { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Rate lookup failed: {message}")]
    RateLookup { message: String },
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway_http(status: u16, body: impl Into<String>) -> Self {
        Self::GatewayHttp {
            status,
            body: body.into(),
        }
    }

    pub fn gateway_rejected(message: impl Into<String>) -> Self {
        Self::GatewayRejected {
            message: message.into(),
        }
    }

    pub fn gateway_transport(message: impl Into<String>) -> Self {
        Self::GatewayTransport {
            message: message.into(),
        }
    }

    pub fn polling_transport(message: impl Into<String>) -> Self {
        Self::PollingTransport {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn rate_lookup(message: impl Into<String>) -> Self {
        Self::RateLookup {
            message: message.into(),
        }
    }

    /// Only transport-class failures are worth a retry; validation and
    /// gateway business rejections are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::GatewayTransport { .. } | Self::PollingTransport { .. } => true,
            Self::GatewayHttp { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::GatewayHttp { .. }
            | Self::GatewayRejected { .. }
            | Self::GatewayTransport { .. }
            | Self::PollingTransport { .. } => StatusCode::BAD_GATEWAY,
            Self::CorrelationLost => StatusCode::BAD_REQUEST,
            Self::Config { .. } | Self::RateLookup { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::GatewayHttp { .. } => "GATEWAY_HTTP",
            Self::GatewayRejected { .. } => "GATEWAY_REJECTED",
            Self::GatewayTransport { .. } => "GATEWAY_TRANSPORT",
            Self::CorrelationLost => "CORRELATION_LOST",
            Self::PollingTransport { .. } => "POLLING_TRANSPORT",
            Self::Config { .. } => "CONFIG",
            Self::RateLookup { .. } => "RATE_LOOKUP",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            AppError::gateway_http(status.as_u16(), err.to_string())
        } else {
            AppError::gateway_transport(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        } else {
            tracing::warn!(code = self.code(), "request rejected: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
