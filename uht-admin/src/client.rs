//! Gateway configuration
//!
//! - [`GatewayConfig::default`] - endpoint from `UHT_URL`, default timeout and retries
//! - [`HttpGateway::with_config`](crate::http_client::HttpGateway::with_config) - build a gateway
//!

use std::time::Duration;

use crate::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, MAX_RETRIES, UHT_URL_ENV};

/// Configuration for the HTTP gateway. Defines endpoint url, timeout, and retry limit.
///
/// ```rust
/// use std::time::Duration;
/// use uht_admin::prelude::*;
///
/// let config = GatewayConfig::default()
///     .base_url("https://admin.example.com/uht")
///     .request_timeout(Duration::from_secs(10));
/// assert_eq!(config.base_url, "https://admin.example.com/uht");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base url for controller requests.
    /// If not provided in config, url is determined by:
    /// * The environment variable UHT_URL, if defined, or
    /// * `uht_admin::config::DEFAULT_BASE_URL`
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Maximum retries for connection failures and timeouts.
    /// Only idempotent requests (object and field listing) are retried; saves never are.
    pub max_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: std::env::var(UHT_URL_ENV).unwrap_or(DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
        }
    }
}

impl GatewayConfig {
    pub fn base_url(self, base_url: &str) -> Self {
        GatewayConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..self
        }
    }

    pub fn request_timeout(self, request_timeout: Duration) -> Self {
        GatewayConfig {
            request_timeout,
            ..self
        }
    }

    pub fn max_retries(self, max_retries: u32) -> Self {
        GatewayConfig {
            max_retries,
            ..self
        }
    }
}
