use crate::api::AppState;
use crate::error::AppResult;
use crate::payments::types::Currency;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RateView {
    pub from: Currency,
    pub to: Currency,
    pub rate: f64,
}

/// USD -> UYU rate the storefront uses to display peso prices.
pub async fn current_rate(State(state): State<AppState>) -> AppResult<Json<RateView>> {
    let rate = state.rates.usd_to_uyu().await?;
    Ok(Json(RateView {
        from: Currency::Usd,
        to: Currency::Uyu,
        rate,
    }))
}
