//! Post-payment return flow
//!
//! When the gateway redirects the buyer back, the return page starts in
//! `Loading`, resolves a request id, issues a single status query and lands
//! in one of three terminal states; each terminal state schedules a redirect
//! to a fixed destination after a short delay so the buyer can read the
//! outcome. There is no retry loop: the gateway's redirect implies the
//! settlement is already queryable.

pub mod resolver;

use crate::config::CheckoutConfig;
use crate::error::{AppError, AppResult};
use crate::payments::approval::{is_approved, payment_reference, ApprovalPolicy};
use crate::payments::types::SessionInfo;
use crate::payments::WebCheckoutClient;
use async_trait::async_trait;
use self::resolver::{resolve_request_id, ReturnContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long the outcome page is shown before redirecting, unless
/// configured otherwise.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Where a status query comes from. The production impl wraps the gateway
/// client; tests substitute canned responses.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, request_id: i64) -> AppResult<SessionInfo>;
}

pub struct GatewayStatusSource {
    client: Arc<WebCheckoutClient>,
}

impl GatewayStatusSource {
    pub fn new(client: Arc<WebCheckoutClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusSource for GatewayStatusSource {
    async fn fetch(&self, request_id: i64) -> AppResult<SessionInfo> {
        self.client.session_info(request_id).await
    }
}

/// Terminal states of the return flow. The `Loading` entry state never
/// escapes [`ReturnFlow::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    Approved { reference: Option<String> },
    Rejected,
    Pending,
}

/// The routing decision handed to the storefront: where to send the buyer
/// and how long to wait first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub outcome: ReturnOutcome,
    pub destination: String,
    pub delay: Duration,
}

pub struct ReturnFlow {
    approved_destination: String,
    rejected_destination: String,
    pending_destination: String,
    delay: Duration,
    policy: ApprovalPolicy,
}

impl ReturnFlow {
    pub fn new(checkout: &CheckoutConfig, policy: ApprovalPolicy) -> Self {
        Self {
            approved_destination: checkout.approved_path.clone(),
            rejected_destination: checkout.rejected_path.clone(),
            pending_destination: checkout.pending_path.clone(),
            delay: Duration::from_millis(checkout.redirect_delay_ms),
            policy,
        }
    }

    /// Run the state machine once: resolve, poll, route.
    pub async fn run(&self, ctx: &mut ReturnContext, source: &dyn StatusSource) -> Routing {
        let raw_id = match resolve_request_id(ctx) {
            Some(raw) => raw,
            None => {
                // A redirect/storage defect, not a payment failure.
                warn!("{}", AppError::CorrelationLost);
                return self.rejected();
            }
        };

        let request_id: i64 = match raw_id.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(%raw_id, "resolved request id is not numeric");
                return self.rejected();
            }
        };

        let info = match source.fetch(request_id).await {
            Ok(info) => info,
            Err(e) => {
                // Fail closed rather than leaving the buyer pending forever.
                warn!(
                    request_id,
                    "{}",
                    AppError::polling_transport(e.to_string())
                );
                return self.rejected();
            }
        };

        info!(request_id, status = %info.status.status, "return flow resolved");

        match info.status.status.as_str() {
            "APPROVED" if is_approved(&info, self.policy) => {
                let reference = payment_reference(&info, self.policy).map(str::to_string);
                self.approved(reference)
            }
            "PENDING" => Routing {
                outcome: ReturnOutcome::Pending,
                destination: self.pending_destination.clone(),
                delay: self.delay,
            },
            // REJECTED and anything unrecognized fail closed.
            _ => self.rejected(),
        }
    }

    fn approved(&self, reference: Option<String>) -> Routing {
        // The confirmation code travels only on the approved destination.
        let destination = match reference.as_deref() {
            Some(code) => format!("{}?reference={}", self.approved_destination, code),
            None => self.approved_destination.clone(),
        };
        Routing {
            outcome: ReturnOutcome::Approved { reference },
            destination,
            delay: self.delay,
        }
    }

    fn rejected(&self) -> Routing {
        Routing {
            outcome: ReturnOutcome::Rejected,
            destination: self.rejected_destination.clone(),
            delay: self.delay,
        }
    }
}
