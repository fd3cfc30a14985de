//! HTTP surface consumed by the storefront

pub mod checkout;
pub mod health;
pub mod payment_sessions;
pub mod rates;

use crate::config::Config;
use crate::payments::{ApprovalPolicy, WebCheckoutClient};
use crate::rates::RateService;
use crate::return_flow::ReturnFlow;
use axum::routing::{get, post};
use axum::Router;
use http::{HeaderValue, Request};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<WebCheckoutClient>,
    pub rates: Arc<RateService>,
    pub return_flow: Arc<ReturnFlow>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let gateway = Arc::new(WebCheckoutClient::new(config.gateway.clone())?);
        let rates = Arc::new(RateService::new(&config.rates)?);
        let return_flow = Arc::new(ReturnFlow::new(
            &config.checkout,
            ApprovalPolicy::default(),
        ));

        Ok(Self {
            config,
            gateway,
            rates,
            return_flow,
        })
    }
}

/// Fresh UUID v4 per request, surfaced as `x-request-id`.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/payment-sessions",
            post(payment_sessions::create_payment_session),
        )
        .route(
            "/payment-sessions/:request_id",
            get(payment_sessions::get_payment_session),
        )
        .route("/checkout/return", get(checkout::return_routing))
        .route("/rates", get(rates::current_rate))
        // set the id before tracing so spans carry it, propagate it last
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
