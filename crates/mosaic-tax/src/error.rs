//! Tax provider error types.
//!
//! These errors are internal to the tax integration: the resolver absorbs
//! every one of them into a degraded `TaxResult` (manual fallback or zero)
//! so that checkout is never blocked by the tax provider. The error text
//! survives only as the result's diagnostic field.

use thiserror::Error;

/// Errors from tax provider calls and configuration.
#[derive(Debug, Error)]
pub enum TaxError {
    /// HTTP transport error (connect failure, timeout, TLS).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The provider returned a non-2xx status.
    #[error("tax provider {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Configuration error.
    #[error("tax configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_config_error_converts() {
        let err: TaxError = ConfigError::MissingEndpoint.into();
        assert!(matches!(err, TaxError::Config(_)));
        assert!(err.to_string().contains("tax configuration error"));
    }
}
