use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub checkout: CheckoutConfig,
    pub rates: RatesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

/// PlaceToPay web-checkout credentials and client tuning.
///
/// `login` and `secret_key` are read once at startup and never mutated;
/// every outbound call derives a fresh single-use credential from them.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub login: String,
    pub secret_key: String,
    pub base_url: String,
    /// Whole-client request timeout in seconds. 0 disables the timeout,
    /// matching the behavior the storefront shipped with.
    pub timeout_secs: u64,
    /// Attempts per gateway call. 1 means no retry.
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// Public origin of the storefront, used to build the return URL the
    /// gateway redirects the buyer to.
    pub public_base_url: String,
    /// How long the outcome page is shown before the buyer is redirected.
    pub redirect_delay_ms: u64,
    pub approved_path: String,
    pub rejected_path: String,
    pub pending_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    pub api_url: String,
    pub ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        let gateway = GatewayConfig {
            login: env::var("PLACETOPAY_LOGIN").context("PLACETOPAY_LOGIN not set")?,
            secret_key: env::var("PLACETOPAY_SECRET_KEY")
                .context("PLACETOPAY_SECRET_KEY not set")?,
            base_url: env::var("PLACETOPAY_BASE_URL").context("PLACETOPAY_BASE_URL not set")?,
            timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("GATEWAY_TIMEOUT_SECS must be a valid number")?,
            max_attempts: env::var("GATEWAY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("GATEWAY_MAX_ATTEMPTS must be a valid number")?,
        };

        let checkout = CheckoutConfig {
            public_base_url: env::var("PUBLIC_BASE_URL").context("PUBLIC_BASE_URL not set")?,
            redirect_delay_ms: env::var("REDIRECT_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("REDIRECT_DELAY_MS must be a valid number")?,
            approved_path: env::var("CHECKOUT_APPROVED_PATH")
                .unwrap_or_else(|_| "/checkout/approved".to_string()),
            rejected_path: env::var("CHECKOUT_REJECTED_PATH")
                .unwrap_or_else(|_| "/checkout/rejected".to_string()),
            pending_path: env::var("CHECKOUT_PENDING_PATH")
                .unwrap_or_else(|_| "/checkout/pending".to_string()),
        };

        let rates = RatesConfig {
            api_url: env::var("RATES_API_URL")
                .unwrap_or_else(|_| "https://api.exchangerate-api.com/v4/latest/USD".to_string()),
            ttl_secs: env::var("RATES_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("RATES_TTL_SECS must be a valid number")?,
        };

        let config = Config {
            server,
            gateway,
            checkout,
            rates,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if self.gateway.login.trim().is_empty() {
            return Err(anyhow!("PLACETOPAY_LOGIN cannot be empty"));
        }

        if self.gateway.secret_key.trim().is_empty() {
            return Err(anyhow!("PLACETOPAY_SECRET_KEY cannot be empty"));
        }

        if !self.gateway.base_url.starts_with("http://")
            && !self.gateway.base_url.starts_with("https://")
        {
            return Err(anyhow!(
                "PLACETOPAY_BASE_URL must be an http(s) URL, got {}",
                self.gateway.base_url
            ));
        }

        if !self.checkout.public_base_url.starts_with("http://")
            && !self.checkout.public_base_url.starts_with("https://")
        {
            return Err(anyhow!(
                "PUBLIC_BASE_URL must be an http(s) URL, got {}",
                self.checkout.public_base_url
            ));
        }

        if self.gateway.max_attempts == 0 {
            return Err(anyhow!("GATEWAY_MAX_ATTEMPTS must be greater than 0"));
        }

        if self.rates.ttl_secs == 0 {
            return Err(anyhow!("RATES_TTL_SECS must be greater than 0"));
        }

        Ok(())
    }
}
