//! TTL cache for currency rates
//!
//! An explicit cache value owned by the service, not process-global state.
//! The clock is injected so tests can age entries without sleeping.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CachedRate {
    rate: f64,
    fetched_at: DateTime<Utc>,
}

pub struct RateCache {
    ttl: ChronoDuration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CachedRate>>,
}

impl RateCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::hours(1)),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached rate unless it has aged past the TTL.
    pub async fn get(&self, key: &str) -> Option<f64> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if self.clock.now() - entry.fetched_at >= self.ttl {
            debug!(key, "rate cache entry expired");
            return None;
        }
        debug!(key, "rate cache hit");
        Some(entry.rate)
    }

    pub async fn put(&self, key: &str, rate: f64) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CachedRate {
                rate,
                fetched_at: self.clock.now(),
            },
        );
    }
}
