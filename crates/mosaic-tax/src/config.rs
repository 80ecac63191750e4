//! # Tax Configuration
//!
//! Explicit configuration for the tax provider integration.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Explicit construction (tests, embedding services)                  │
//! │     TaxConfig { enabled, endpoint, api_token, timeout }                │
//! │                                                                         │
//! │  2. Environment Variables (deployments)                                │
//! │     MOSAIC_TAX_ENABLED=true                                            │
//! │     MOSAIC_TAX_ENDPOINT=https://tax.example.com/v1/calculate           │
//! │     MOSAIC_TAX_API_TOKEN=...                                           │
//! │     MOSAIC_TAX_TIMEOUT_MS=4000                                         │
//! │                                                                         │
//! │  3. Default: disabled (zero tax, zero network calls)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The config is built once at startup and injected into the resolver —
//! never reconstructed lazily from ambient process state on each request.

use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Default per-request timeout for the tax provider call. There are no
/// retries: a slow provider means the manual fallback, not a slower
/// checkout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4_000);

/// Configuration errors raised while constructing a [`TaxConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tax calculation is enabled but no endpoint was provided.
    #[error("tax calculation enabled but MOSAIC_TAX_ENDPOINT is not set")]
    MissingEndpoint,

    /// The endpoint is not a valid URL.
    #[error("invalid tax endpoint '{value}': {reason}")]
    InvalidEndpoint { value: String, reason: String },

    /// The timeout value is not a number of milliseconds.
    #[error("invalid MOSAIC_TAX_TIMEOUT_MS '{value}'")]
    InvalidTimeout { value: String },
}

/// Tax provider configuration, injected into [`crate::TaxResolver`].
#[derive(Debug, Clone)]
pub struct TaxConfig {
    /// Process-wide flag: when false the resolver returns zero tax
    /// immediately and never touches the network.
    pub enabled: bool,
    /// The provider's calculation endpoint. Required when enabled.
    pub endpoint: Option<Url>,
    /// Bearer token for the provider, if it requires one.
    pub api_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TaxConfig {
    /// A disabled configuration: zero tax, no network.
    pub fn disabled() -> Self {
        TaxConfig {
            enabled: false,
            endpoint: None,
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// An enabled configuration pointing at `endpoint`.
    pub fn enabled(endpoint: Url) -> Self {
        TaxConfig {
            enabled: true,
            endpoint: Some(endpoint),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads configuration from `MOSAIC_TAX_*` environment variables.
    ///
    /// Absent `MOSAIC_TAX_ENABLED` (or any value other than `true`/`1`)
    /// yields the disabled configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        let enabled = matches!(
            std::env::var("MOSAIC_TAX_ENABLED").as_deref(),
            Ok("true") | Ok("1")
        );
        if !enabled {
            info!("tax calculation disabled; checkout proceeds with zero tax");
            return Ok(TaxConfig::disabled());
        }

        let raw_endpoint =
            std::env::var("MOSAIC_TAX_ENDPOINT").map_err(|_| ConfigError::MissingEndpoint)?;
        let endpoint = Url::parse(&raw_endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            value: raw_endpoint,
            reason: e.to_string(),
        })?;

        let api_token = std::env::var("MOSAIC_TAX_API_TOKEN").ok();
        if api_token.is_none() {
            warn!("tax provider configured without an API token");
        }

        let timeout = match std::env::var("MOSAIC_TAX_TIMEOUT_MS") {
            Ok(raw) => {
                let millis: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout { value: raw })?;
                Duration::from_millis(millis)
            }
            Err(_) => DEFAULT_TIMEOUT,
        };

        info!(endpoint = %endpoint, timeout_ms = timeout.as_millis() as u64, "tax provider configured");
        Ok(TaxConfig {
            enabled: true,
            endpoint: Some(endpoint),
            api_token,
            timeout,
        })
    }
}
