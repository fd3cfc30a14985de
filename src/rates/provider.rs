//! Currency-rate fetching

use crate::error::{AppError, AppResult};
use crate::payments::types::Currency;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch(&self, from: Currency, to: Currency) -> AppResult<f64>;
}

/// Rate-API response: `{"base": "USD", "rates": {"UYU": 40.5, ...}}`.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

pub struct HttpRateProvider {
    client: reqwest::Client,
    api_url: String,
}

impl HttpRateProvider {
    pub fn new(api_url: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("barraca-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, api_url })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch(&self, from: Currency, to: Currency) -> AppResult<f64> {
        debug!(%from, %to, "fetching currency rate");

        let response = self
            .client
            .get(&self.api_url)
            .send()
            .await
            .map_err(|e| AppError::rate_lookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::rate_lookup(format!(
                "rate API returned HTTP {}",
                response.status()
            )));
        }

        let body: RatesResponse = response
            .json()
            .await
            .map_err(|e| AppError::rate_lookup(format!("invalid rate API body: {}", e)))?;

        body.rates
            .get(&to.to_string())
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| {
                AppError::rate_lookup(format!("rate API has no usable {} -> {} rate", from, to))
            })
    }
}
