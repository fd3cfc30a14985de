//! Return-page routing endpoint
//!
//! The return page calls this once after the gateway redirects the buyer
//! back. Query parameters carry whatever the redirect preserved; the page
//! forwards its one-time stashed request id (if any) as `stash`. The
//! response tells the page where to send the buyer and how long to show
//! the outcome first.

use crate::api::AppState;
use crate::return_flow::resolver::ReturnContext;
use crate::return_flow::{GatewayStatusSource, ReturnOutcome};
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingView {
    pub outcome: &'static str,
    pub destination: String,
    pub delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

pub async fn return_routing(
    State(state): State<AppState>,
    uri: Uri,
    Query(mut query): Query<HashMap<String, String>>,
) -> Json<RoutingView> {
    let stash = query.remove("stash");
    let mut ctx = ReturnContext {
        query,
        path: uri.path().to_string(),
        stash,
    };

    let source = GatewayStatusSource::new(state.gateway.clone());
    let routing = state.return_flow.run(&mut ctx, &source).await;

    let (outcome, reference) = match routing.outcome {
        ReturnOutcome::Approved { reference } => ("approved", reference),
        ReturnOutcome::Rejected => ("rejected", None),
        ReturnOutcome::Pending => ("pending", None),
    };

    Json(RoutingView {
        outcome,
        destination: routing.destination,
        delay_ms: routing.delay.as_millis() as u64,
        reference,
    })
}
