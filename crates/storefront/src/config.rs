//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POCKET_SHOP_API_URL` - Base URL of the PocketBase backend (e.g., `http://127.0.0.1:8090`)
//!
//! ## Optional
//! - `POCKET_SHOP_PRODUCT_COLLECTION` - Products collection name (default: products)
//! - `POCKET_SHOP_USER_COLLECTION` - Auth collection name (default: users)
//! - `POCKET_SHOP_CURRENCY` - ISO 4217 code prices are quoted in (default: USD)
//! - `POCKET_SHOP_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `POCKET_SHOP_CACHE_CAPACITY` - Catalog cache entries (default: 1000)
//! - `POCKET_SHOP_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)

use std::time::Duration;

use pocket_shop_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, without a trailing slash
    pub api_url: Url,
    /// Name of the products collection
    pub product_collection: String,
    /// Name of the auth collection used for login and sign-up
    pub user_collection: String,
    /// Currency product prices are quoted in
    pub currency: CurrencyCode,
    /// Catalog cache settings
    pub cache: CacheConfig,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
}

/// In-memory catalog cache settings.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 1000,
        }
    }
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

        let api_url = parse_api_url(&get_required_env("POCKET_SHOP_API_URL")?)?;
        let currency = get_env_or_default("POCKET_SHOP_CURRENCY", "USD")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("POCKET_SHOP_CURRENCY".to_string(), e))?;

        let cache = CacheConfig {
            ttl: Duration::from_secs(parse_env_or_default("POCKET_SHOP_CACHE_TTL_SECS", 300)?),
            max_capacity: parse_env_or_default("POCKET_SHOP_CACHE_CAPACITY", 1000)?,
        };
        let request_timeout =
            Duration::from_secs(parse_env_or_default("POCKET_SHOP_REQUEST_TIMEOUT_SECS", 10)?);

        Ok(Self {
            api_url,
            product_collection: get_env_or_default("POCKET_SHOP_PRODUCT_COLLECTION", "products"),
            user_collection: get_env_or_default("POCKET_SHOP_USER_COLLECTION", "users"),
            currency,
            cache,
            request_timeout,
        })
    }

    /// Configuration for a backend at `api_url` with every other setting
    /// at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            product_collection: "products".to_string(),
            user_collection: "users".to_string(),
            currency: CurrencyCode::default(),
            cache: CacheConfig::default(),
            request_timeout: Duration::from_secs(10),
        })
    }

    /// Base URL as a string without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and check the backend URL.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("POCKET_SHOP_API_URL".to_string(), msg);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url() {
        let url = parse_api_url("http://127.0.0.1:8090").unwrap();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(8090));
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_api_base_strips_trailing_slash() {
        let config = StorefrontConfig::for_api_url("https://shop.example.com/").unwrap();
        assert_eq!(config.api_base(), "https://shop.example.com");

        let config = StorefrontConfig::for_api_url("https://shop.example.com/pb/").unwrap();
        assert_eq!(config.api_base(), "https://shop.example.com/pb");
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::for_api_url("http://localhost:8090").unwrap();
        assert_eq!(config.product_collection, "products");
        assert_eq!(config.user_collection, "users");
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_env_or_default_unset() {
        let value: u64 = parse_env_or_default("POCKET_SHOP_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
