//! # Tax Provider Client
//!
//! Typed HTTP client for the remote tax provider: one POST per pricing
//! attempt, no retries. Failures surface as [`TaxError`] and are absorbed
//! by the resolver into the manual fallback.
//!
//! ## Category References
//! The provider receives the order as per-category amounts, each tagged
//! with a stable reference string. `"shipping"` is a reserved term at the
//! provider and MUST NOT be used as a reference — the shipping category
//! is tagged `"delivery"` instead.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::TaxConfig;
use crate::error::TaxError;

// =============================================================================
// Category References
// =============================================================================

/// Reference tag for the order's item subtotal (base + cart entries).
pub const REF_ORDER_ITEMS: &str = "order-items";

/// Reference tag for the shipping subtotal. Not "shipping": that string
/// is reserved at the provider and collides with its own shipping logic.
pub const REF_DELIVERY: &str = "delivery";

/// Reference tag for the frame add-on subtotal.
pub const REF_FRAME: &str = "frame";

// =============================================================================
// Wire Types
// =============================================================================

/// One per-category amount in a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCategoryLine {
    pub reference: String,
    pub amount_subunits: i64,
}

/// The destination the order ships to (or the buyer's billing country for
/// pickup orders).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDestination {
    pub country: String,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub line1: Option<String>,
}

/// A calculation request: the combined per-category line items plus the
/// destination and currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationRequest {
    pub line_items: Vec<TaxCategoryLine>,
    pub currency: String,
    pub destination: TaxDestination,
}

/// The provider's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResponse {
    pub tax_subunits: i64,
    pub rate_bps: u32,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the tax provider's calculation endpoint.
#[derive(Debug, Clone)]
pub struct TaxProviderClient {
    http: reqwest::Client,
    endpoint: Url,
    api_token: Option<String>,
}

impl TaxProviderClient {
    /// Builds a client from an enabled configuration.
    ///
    /// The configured timeout applies per request; there is no retry loop
    /// behind it.
    pub fn new(config: &TaxConfig) -> Result<Self, TaxError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or(crate::config::ConfigError::MissingEndpoint)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| TaxError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        Ok(TaxProviderClient {
            http,
            endpoint,
            api_token: config.api_token.clone(),
        })
    }

    /// Submits one calculation request.
    pub async fn calculate(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<TaxCalculationResponse, TaxError> {
        let endpoint = self.endpoint.to_string();
        debug!(
            endpoint = %endpoint,
            categories = request.line_items.len(),
            country = %request.destination.country,
            "requesting tax calculation"
        );

        let mut builder = self.http.post(self.endpoint.clone()).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|source| TaxError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaxError::Api {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TaxCalculationResponse>()
            .await
            .map_err(|source| TaxError::Deserialization { endpoint, source })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TaxConfig {
        let url = Url::parse(&format!("{}/v1/calculate", server.uri())).unwrap();
        TaxConfig::enabled(url)
    }

    fn request() -> TaxCalculationRequest {
        TaxCalculationRequest {
            line_items: vec![
                TaxCategoryLine {
                    reference: REF_ORDER_ITEMS.to_string(),
                    amount_subunits: 20_000,
                },
                TaxCategoryLine {
                    reference: REF_DELIVERY.to_string(),
                    amount_subunits: 700,
                },
            ],
            currency: "EUR".to_string(),
            destination: TaxDestination {
                country: "FI".to_string(),
                postal_code: Some("00100".to_string()),
                city: None,
                line1: None,
            },
        }
    }

    #[tokio::test]
    async fn test_calculate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/calculate"))
            .and(body_partial_json(json!({
                "currency": "EUR",
                "destination": { "country": "FI" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "taxSubunits": 5279,
                "rateBps": 2550
            })))
            .mount(&server)
            .await;

        let client = TaxProviderClient::new(&config_for(&server)).unwrap();
        let response = client.calculate(&request()).await.unwrap();

        assert_eq!(response.tax_subunits, 5_279);
        assert_eq!(response.rate_bps, 2550);
    }

    #[tokio::test]
    async fn test_calculate_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/calculate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = TaxProviderClient::new(&config_for(&server)).unwrap();
        let err = client.calculate(&request()).await.unwrap_err();

        assert!(matches!(err, TaxError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_calculate_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/calculate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = TaxProviderClient::new(&config_for(&server)).unwrap();
        let err = client.calculate(&request()).await.unwrap_err();

        assert!(matches!(err, TaxError::Deserialization { .. }));
    }

    #[test]
    fn test_new_requires_endpoint() {
        let err = TaxProviderClient::new(&TaxConfig::disabled()).unwrap_err();
        assert!(matches!(err, TaxError::Config(_)));
    }

    #[test]
    fn test_category_references_avoid_reserved_word() {
        // The provider reserves "shipping"; the shipping category must be
        // tagged "delivery".
        assert_eq!(REF_DELIVERY, "delivery");
        assert_ne!(REF_DELIVERY, "shipping");
        assert_eq!(REF_ORDER_ITEMS, "order-items");
        assert_eq!(REF_FRAME, "frame");
    }
}
