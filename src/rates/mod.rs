//! Currency-rate lookup with a TTL cache
//!
//! Storefront prices are listed in USD but charged in UYU; the conversion
//! rate comes from an external API and is cached for the configured TTL.

pub mod cache;
pub mod provider;

use crate::config::RatesConfig;
use crate::error::AppResult;
use crate::payments::types::Currency;
use self::cache::{Clock, RateCache, SystemClock};
use self::provider::{HttpRateProvider, RateProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn pair_key(from: Currency, to: Currency) -> String {
    format!("{}:{}", from, to)
}

pub struct RateService {
    cache: RateCache,
    provider: Box<dyn RateProvider>,
}

impl RateService {
    pub fn new(config: &RatesConfig) -> AppResult<Self> {
        let provider = HttpRateProvider::new(config.api_url.clone())?;
        Ok(Self::with_parts(
            Box::new(provider),
            Duration::from_secs(config.ttl_secs),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_parts(
        provider: Box<dyn RateProvider>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache: RateCache::new(ttl, clock),
            provider,
        }
    }

    /// Cache-first lookup; fetches and stores on a miss or stale entry.
    pub async fn get_rate(&self, from: Currency, to: Currency) -> AppResult<f64> {
        let key = pair_key(from, to);
        if let Some(rate) = self.cache.get(&key).await {
            return Ok(rate);
        }

        let rate = self.provider.fetch(from, to).await?;
        info!(%from, %to, rate, "fetched fresh currency rate");
        self.cache.put(&key, rate).await;
        Ok(rate)
    }

    pub async fn usd_to_uyu(&self) -> AppResult<f64> {
        self.get_rate(Currency::Usd, Currency::Uyu).await
    }
}
