//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `ROOMILY_API_URL` - Base URL of the Roomily REST backend
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `ROOMILY_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `STOREFRONT_SHIPPING_FEE` - Flat shipping fee (default: 30000)
//! - `STOREFRONT_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping
//!   (default: 500000, `0` or `none` disables free shipping)
//! - `PAYMENT_POLL_INTERVAL_SECS` - Bank transfer polling interval (default: 3)
//! - `PAYMENT_POLL_TIMEOUT_SECS` - Stop polling after this long (default: 900)
//! - `STOREFRONT_BANK_ACCOUNT` - Receiving bank account number
//! - `STOREFRONT_BANK_CODE` - Receiving bank short code (e.g. `VCB`)
//! - `STOREFRONT_BANK_ACCOUNT_NAME` - Receiving account holder name
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use roomily_core::{CurrencyCode, ShippingPolicy};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Currency of every amount the backend returns.
pub const CURRENCY: CurrencyCode = CurrencyCode::VND;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Roomily REST backend
    pub api: ApiConfig,
    /// Shipping fee rules shown in the cart
    pub shipping: ShippingPolicy,
    /// Bank transfer and polling settings
    pub payment: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Roomily REST backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.roomily.tech`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Bank transfer details and payment polling cadence.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub bank_account: Option<String>,
    pub bank_code: Option<String>,
    pub bank_account_name: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvVars(lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1".parse::<IpAddr>().ok())?;
        let port = env.parse_or("STOREFRONT_PORT", Some(3000u16))?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;

        let api = ApiConfig {
            base_url: env.url("ROOMILY_API_URL")?,
            timeout: Duration::from_secs(env.parse_or("ROOMILY_API_TIMEOUT_SECS", Some(10u64))?),
        };

        let shipping = ShippingPolicy {
            flat_fee: env.parse_or("STOREFRONT_SHIPPING_FEE", Some(Decimal::from(30_000)))?,
            free_threshold: env.threshold("STOREFRONT_FREE_SHIPPING_THRESHOLD", 500_000)?,
        };

        let payment = PaymentConfig {
            poll_interval: Duration::from_secs(
                env.parse_or("PAYMENT_POLL_INTERVAL_SECS", Some(3u64))?.max(1),
            ),
            poll_timeout: Duration::from_secs(
                env.parse_or("PAYMENT_POLL_TIMEOUT_SECS", Some(900u64))?,
            ),
            bank_account: env.optional("STOREFRONT_BANK_ACCOUNT"),
            bank_code: env.optional("STOREFRONT_BANK_CODE"),
            bank_account_name: env.optional("STOREFRONT_BANK_ACCOUNT_NAME"),
        };

        Ok(Self {
            host,
            port,
            base_url,
            api,
            shipping,
            payment,
            sentry_dsn: env.optional("SENTRY_DSN").map(SecretString::from),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", Some(0.1f32))?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup with typed accessors.
struct EnvVars<F>(F);

impl<F> EnvVars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    ///
    /// A `None` default makes the variable required.
    fn parse_or<T>(&self, key: &str, default: Option<T>) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
        }
    }

    /// Parse a required absolute http(s) URL.
    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }

    /// Free-shipping threshold; `0` or `none` disables it.
    fn threshold(&self, key: &str, default: i64) -> Result<Option<Decimal>, ConfigError> {
        match self.optional(key) {
            None => Ok(Some(Decimal::from(default))),
            Some(raw) if raw.eq_ignore_ascii_case("none") => Ok(None),
            Some(raw) => {
                let value = raw
                    .parse::<Decimal>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
                Ok((value > Decimal::ZERO).then_some(value))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;


    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
        ("ROOMILY_API_URL", "https://api.roomily.tech"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.base_url.as_str(), "https://api.roomily.tech/");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.shipping.flat_fee, Decimal::new(30000, 0));
        assert_eq!(config.shipping.free_threshold, Some(Decimal::new(500000, 0)));
        assert_eq!(config.payment.poll_interval, Duration::from_secs(3));
        assert_eq!(config.payment.poll_timeout, Duration::from_secs(900));
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "ROOMILY_API_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_PORT", "http"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_api_url_must_be_http() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("ROOMILY_API_URL", "ftp://api.roomily.tech"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_free_shipping_can_be_disabled() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_FREE_SHIPPING_THRESHOLD", "none"));
        assert_eq!(load(&pairs).unwrap().shipping.free_threshold, None);

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_FREE_SHIPPING_THRESHOLD", "0"));
        assert_eq!(load(&pairs).unwrap().shipping.free_threshold, None);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_BANK_ACCOUNT", "   "));
        pairs.push(("SENTRY_DSN", ""));
        let config = load(&pairs).unwrap();
        assert!(config.payment.bank_account.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SENTRY_DSN", "https://abcdef123456@o1.ingest.sentry.io/1"));
        let debug_output = format!("{:?}", load(&pairs).unwrap());
        assert!(!debug_output.contains("abcdef123456"));
    }
}
