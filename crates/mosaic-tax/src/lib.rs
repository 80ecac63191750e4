//! # Mosaic Tax — Tax Provider Integration
//!
//! The only I/O crate in the workspace: everything network-shaped about
//! tax calculation lives here, keeping `mosaic-core` pure.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           mosaic-tax                                    │
//! │                                                                         │
//! │   config ──► resolver ──► client ──► remote tax provider (HTTP)        │
//! │                 │                                                       │
//! │                 └──► rates (static VAT fallback when the provider      │
//! │                      fails; flagged isManualCalculation)               │
//! │                                                                         │
//! │   Output: mosaic_core::TaxResult — the resolver never errors outward.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//! - Disabled configuration: zero tax, zero network calls.
//! - Missing destination country: zero tax.
//! - Provider failure: static rate table, `is_manual_calculation: true`,
//!   diagnostic attached. Checkout is never blocked by this crate.

pub mod client;
pub mod config;
pub mod error;
pub mod rates;
pub mod resolver;

pub use client::{TaxCalculationRequest, TaxCalculationResponse, TaxProviderClient};
pub use config::{ConfigError, TaxConfig};
pub use error::TaxError;
pub use rates::fallback_rate_bps;
pub use resolver::{CheckoutTaxRequest, CheckoutTaxResponse, ShippingAddress, TaxResolver};
