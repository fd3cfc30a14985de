//! PlaceToPay web-checkout session client
//!
//! Two operations against the gateway: create a checkout session and query
//! its status. Each call authenticates with a fresh single-use credential
//! from [`crate::payments::auth`].

use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};
use crate::payments::auth::generate_auth;
use crate::payments::types::{
    Amount, Buyer, CreateSessionRequest, CreateSessionResponse, Currency, PaymentBlock,
    SessionInfo, SessionQueryRequest,
};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session lifetime requested from the gateway.
const SESSION_EXPIRATION_HOURS: i64 = 1;

/// Retry behavior for outbound gateway calls.
///
/// The default is a single attempt, which is what the storefront shipped
/// with; deployments can harden via `GATEWAY_MAX_ATTEMPTS`. Only transient
/// transport errors and 5xx responses are retried; validation failures and
/// gateway business rejections are final.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Input to [`WebCheckoutClient::create_session`], as received from the
/// storefront checkout handler.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub reference: String,
    pub description: String,
    pub amount: f64,
    pub currency: Currency,
    pub buyer: Option<Buyer>,
    pub ip_address: String,
    pub user_agent: String,
    pub return_url: String,
}

impl NewSession {
    fn validate(&self) -> AppResult<()> {
        if self.reference.trim().is_empty() {
            return Err(AppError::validation("reference", "reference is required"));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::validation(
                "description",
                "description is required",
            ));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::validation(
                "amount",
                "amount must be a positive number",
            ));
        }
        Ok(())
    }
}

pub struct WebCheckoutClient {
    config: GatewayConfig,
    client: Client,
    retry: RetryPolicy,
}

impl WebCheckoutClient {
    pub fn new(config: GatewayConfig) -> AppResult<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            "barraca-backend/",
            env!("CARGO_PKG_VERSION")
        ));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::config(format!("failed to create HTTP client: {}", e)))?;

        let retry = RetryPolicy {
            max_attempts: config.max_attempts,
            ..RetryPolicy::default()
        };

        Ok(Self {
            config,
            client,
            retry,
        })
    }

    /// Client with an explicit retry policy, for deployments that harden
    /// beyond the config defaults.
    pub fn with_retry(config: GatewayConfig, retry: RetryPolicy) -> AppResult<Self> {
        let mut client = Self::new(config)?;
        client.retry = retry;
        Ok(client)
    }

    /// Create a checkout session for one payment attempt.
    ///
    /// The caller must persist `request_id` from the response before
    /// navigating the buyer to `process_url`; it is the only handle for
    /// later status queries.
    pub async fn create_session(&self, new: NewSession) -> AppResult<CreateSessionResponse> {
        new.validate()?;

        info!(
            reference = %new.reference,
            amount = new.amount,
            currency = %new.currency,
            "creating checkout session"
        );

        let expiration = (Utc::now() + ChronoDuration::hours(SESSION_EXPIRATION_HOURS))
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let request = CreateSessionRequest {
            auth: generate_auth(&self.config.login, &self.config.secret_key),
            payment: PaymentBlock {
                reference: new.reference,
                description: new.description,
                amount: Amount {
                    currency: new.currency,
                    total: new.amount,
                },
            },
            expiration,
            return_url: new.return_url,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            buyer: new.buyer,
        };

        let url = format!("{}/api/session", self.config.base_url);
        let response: CreateSessionResponse = self.post_json(&url, &request).await?;

        if response.status.status != "OK" {
            let message = response
                .status
                .message
                .unwrap_or_else(|| response.status.status.clone());
            return Err(AppError::gateway_rejected(message));
        }

        info!(
            request_id = response.request_id,
            "checkout session created"
        );
        Ok(response)
    }

    /// Query the current state of a session.
    ///
    /// Returns the decoded body verbatim; interpreting it into an approval
    /// decision is [`crate::payments::approval`]'s job. Idempotent and safe
    /// to call repeatedly while polling.
    pub async fn session_info(&self, request_id: i64) -> AppResult<SessionInfo> {
        debug!(request_id, "querying session status");

        let request = SessionQueryRequest {
            auth: generate_auth(&self.config.login, &self.config.secret_key),
        };

        let url = format!("{}/api/session/{}", self.config.base_url, request_id);
        self.post_json(&url, &request).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> AppResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let mut last_error = AppError::gateway_transport("no attempts made");

        for attempt in 1..=self.retry.max_attempts {
            let result = self.client.post(url).json(body).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<T>().await.map_err(|e| {
                            AppError::gateway_transport(format!("invalid response body: {}", e))
                        });
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let error = AppError::gateway_http(status.as_u16(), body_text);

                    if status.is_server_error() && attempt < self.retry.max_attempts {
                        warn!(
                            %status,
                            attempt,
                            "gateway server error, retrying"
                        );
                        last_error = error;
                    } else {
                        return Err(error);
                    }
                }
                Err(e) => {
                    let error = AppError::from(e);
                    if attempt < self.retry.max_attempts {
                        warn!(attempt, "gateway request failed, retrying: {}", error);
                        last_error = error;
                    } else {
                        return Err(error);
                    }
                }
            }

            let backoff = self.retry.backoff * 2_u32.saturating_pow(attempt - 1);
            tokio::time::sleep(backoff).await;
        }

        Err(last_error)
    }
}
