//! # Tax Resolver
//!
//! Orchestrates one tax calculation per checkout attempt.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve(order, shipping, frame, address)                               │
//! │       │                                                                 │
//! │       ├── tax disabled? ──────────► zero tax, ZERO network calls       │
//! │       │                                                                 │
//! │       ├── no destination country? ► zero tax (checkout proceeds)       │
//! │       │                                                                 │
//! │       ├── remote provider ────────► TaxResult from response            │
//! │       │        │                                                        │
//! │       │        └── failure ───────► static VAT table by country        │
//! │       │                             (isManualCalculation: true,        │
//! │       │                              unknown country → 0%)             │
//! │       │                                                                 │
//! │       └── NEVER an error: every path degrades to a usable TaxResult;   │
//! │           the failure reason rides along as a diagnostic only.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use mosaic_core::money::{Currency, Money};
use mosaic_core::types::{TaxRate, TaxResult};

use crate::client::{
    TaxCalculationRequest, TaxCategoryLine, TaxDestination, TaxProviderClient, REF_DELIVERY,
    REF_FRAME, REF_ORDER_ITEMS,
};
use crate::config::TaxConfig;
use crate::error::TaxError;
use crate::rates::fallback_rate_bps;

// =============================================================================
// Shipping Address
// =============================================================================

/// The destination address from the checkout request.
///
/// Only the country drives tax; everything else is passed through to the
/// provider for rate precision where it supports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub line1: Option<String>,
}

// =============================================================================
// Resolver
// =============================================================================

/// The tax resolver: owns the injected configuration and (when enabled)
/// the provider client.
#[derive(Debug, Clone)]
pub struct TaxResolver {
    config: TaxConfig,
    client: Option<TaxProviderClient>,
}

impl TaxResolver {
    /// Builds a resolver. A disabled configuration yields a resolver that
    /// never constructs an HTTP client at all.
    pub fn new(config: TaxConfig) -> Result<Self, TaxError> {
        let client = if config.enabled {
            Some(TaxProviderClient::new(&config)?)
        } else {
            None
        };
        Ok(TaxResolver { config, client })
    }

    /// Resolves tax for one pricing attempt.
    ///
    /// Infallible by contract: provider failures degrade to the manual
    /// rate table, bad input degrades to zero tax, and the reason is
    /// attached as a diagnostic. Checkout is never blocked here.
    pub async fn resolve(
        &self,
        order_total: Money,
        shipping_total: Money,
        frame_total: Money,
        address: &ShippingAddress,
    ) -> TaxResult {
        let currency = order_total.currency();

        if !self.config.enabled {
            return TaxResult::zero(currency);
        }

        // Missing destination: zero tax rather than a failed checkout.
        let country = match address.country.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_ascii_uppercase(),
            _ => {
                debug!("no destination country; resolving zero tax");
                return TaxResult::zero(currency);
            }
        };

        // Subtotals must share the order currency; a drifted input is a
        // caller bug the pricing layer rejects separately, so here it
        // only degrades the tax to zero.
        let taxable_total = match order_total
            .checked_add(shipping_total)
            .and_then(|t| t.checked_add(frame_total))
        {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "mixed currencies across tax subtotals; resolving zero tax");
                let mut result = TaxResult::zero(currency);
                result.error = Some(e.to_string());
                return result;
            }
        };

        let request = Self::build_request(order_total, shipping_total, frame_total, &country, address);
        let failure = match &self.client {
            Some(client) => match client.calculate(&request).await {
                Ok(response) => {
                    return TaxResult {
                        tax_amount: Money::new(response.tax_subunits, currency),
                        tax_rate: TaxRate::from_bps(response.rate_bps),
                        is_manual_calculation: false,
                        error: None,
                    }
                }
                Err(e) => e,
            },
            // Enabled but clientless only happens in hand-built test
            // setups; treat it like a provider outage.
            None => TaxError::Config(crate::config::ConfigError::MissingEndpoint),
        };

        warn!(
            error = %failure,
            country = %country,
            "tax provider failed; falling back to manual rate table"
        );
        let rate = TaxRate::from_bps(fallback_rate_bps(&country));
        TaxResult {
            tax_amount: taxable_total.percentage_of(rate.bps()),
            tax_rate: rate,
            is_manual_calculation: true,
            error: Some(failure.to_string()),
        }
    }

    fn build_request(
        order_total: Money,
        shipping_total: Money,
        frame_total: Money,
        country: &str,
        address: &ShippingAddress,
    ) -> TaxCalculationRequest {
        let mut line_items = vec![TaxCategoryLine {
            reference: REF_ORDER_ITEMS.to_string(),
            amount_subunits: order_total.subunits(),
        }];
        if shipping_total.is_positive() {
            line_items.push(TaxCategoryLine {
                reference: REF_DELIVERY.to_string(),
                amount_subunits: shipping_total.subunits(),
            });
        }
        if frame_total.is_positive() {
            line_items.push(TaxCategoryLine {
                reference: REF_FRAME.to_string(),
                amount_subunits: frame_total.subunits(),
            });
        }

        TaxCalculationRequest {
            line_items,
            currency: order_total.currency().as_str().to_string(),
            destination: TaxDestination {
                country: country.to_string(),
                postal_code: address.postal_code.clone(),
                city: address.city.clone(),
                line1: address.line1.clone(),
            },
        }
    }
}

// =============================================================================
// Checkout DTOs
// =============================================================================

/// The storefront's checkout tax request (JSON over HTTP).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTaxRequest {
    pub order_total: i64,
    pub shipping_total: i64,
    pub frame_total: i64,
    pub shipping_address: ShippingAddress,
    #[ts(type = "string")]
    pub currency: Currency,
}

/// The storefront's checkout tax response.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTaxResponse {
    pub tax_amount: i64,
    /// Rate as a decimal percentage (25.5 = 25.5%).
    pub tax_rate: f64,
    pub tax_enabled: bool,
    pub is_manual_calculation: bool,
}

impl TaxResolver {
    /// Handles one storefront checkout tax request end to end.
    pub async fn handle_checkout(&self, request: &CheckoutTaxRequest) -> CheckoutTaxResponse {
        let currency = request.currency;
        let result = self
            .resolve(
                Money::new(request.order_total, currency),
                Money::new(request.shipping_total, currency),
                Money::new(request.frame_total, currency),
                &request.shipping_address,
            )
            .await;

        CheckoutTaxResponse {
            tax_amount: result.tax_amount.subunits(),
            tax_rate: result.tax_rate.percentage(),
            tax_enabled: self.config.enabled,
            is_manual_calculation: result.is_manual_calculation,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
