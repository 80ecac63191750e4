//! # mosaic-core: Pure Pricing & Transaction-State Logic
//!
//! This crate is the **heart** of the Mosaic marketplace storefront. It
//! contains the order pricing engine and the transaction state machines as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Mosaic Storefront Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront (React)                           │   │
//! │  │    Listing page ──► Cart ──► Checkout ──► Transaction page     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    API layer (thin glue)                        │   │
//! │  │    initiate checkout, transition transaction, fetch tax        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mosaic-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌────────────────┐  │   │
//! │  │  │  money   │ │ line_items │ │ process  │ │ offers/tx_state│  │   │
//! │  │  │ Currency │ │  Builder   │ │  Graphs  │ │ Ledger/Resolver│  │   │
//! │  │  └──────────┘ └────────────┘ └──────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO PLATFORM SDK • NO NETWORK • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      mosaic-tax (tax provider call + manual fallback)           │   │
//! │  │      hosted marketplace platform (persistence, payments)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Currency-tagged integer Money (no floating point!)
//! - [`types`] - Domain types (Listing, CartItem, LineItem, TaxResult, ...)
//! - [`shipping`] - Shipping fee calculator
//! - [`line_items`] - Order → priced line-item breakdown
//! - [`process`] - Transaction state graphs (standard / negotiated)
//! - [`offers`] - Negotiation offer ledger with consistency guard
//! - [`tx_state`] - (state, role) → UI presentation directives
//! - [`validation`] - Request input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input =
//!    same output; concurrent requests cannot interfere
//! 2. **No I/O**: network, platform SDK, and file access are FORBIDDEN here
//! 3. **Integer Money**: all amounts are minor-unit i64 tagged with their
//!    currency; mixing currencies is an error, not a conversion
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use mosaic_core::money::{Currency, Money};
//! use mosaic_core::process::{ProcessGraph, ProcessState, Transition};
//!
//! // Drive a negotiated purchase through its opening offer.
//! let graph = ProcessGraph::negotiated_purchase();
//! let state = graph
//!     .apply(ProcessState::Initial, Transition::CustomerOffer)
//!     .unwrap();
//! assert_eq!(state, ProcessState::OfferPending);
//!
//! // Price math never touches floats.
//! let usd = Currency::from_code("USD").unwrap();
//! let offer = Money::new(8_000, usd);
//! assert_eq!(offer.multiply_quantity(2).subunits(), 16_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod line_items;
pub mod money;
pub mod offers;
pub mod process;
pub mod shipping;
pub mod tx_state;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mosaic_core::Money` instead of
// `use mosaic_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use line_items::{
    build_line_items, negotiated_unit_price, payin_total, payout_total, reverse_line_items,
    total_for_role, CheckoutOrder,
};
pub use money::{Currency, Money};
pub use offers::{
    append_offer, append_offer_with_expected_len, latest_offer_subunits, Offer,
    HistoryEntry,
};
pub use process::{ProcessGraph, ProcessKind, ProcessState, Transition};
pub use tx_state::{resolve, UiDirective};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum additional cart items alongside the main listing in one order.
///
/// ## Business Reason
/// Keeps checkout payloads (and the transaction's protected data) bounded;
/// the storefront enforces the same limit in the cart UI.
pub const MAX_CART_ITEMS: usize = 50;

/// Maximum quantity of a single listing per order.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 100 instead of 10) on
/// listings that are mostly one-of-a-kind or small editions.
pub const MAX_ORDER_QUANTITY: i64 = 100;
