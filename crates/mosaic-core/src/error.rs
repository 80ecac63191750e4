//! # Error Types
//!
//! Domain-specific error types for mosaic-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mosaic-core errors (this file)                                        │
//! │  ├── CoreError        - Pricing and state-machine failures             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mosaic-tax errors (separate crate)                                    │
//! │  └── TaxError         - Provider call failures (absorbed, never fatal) │
//! │                                                                         │
//! │  API layer errors (storefront server)                                  │
//! │  └── What the React frontend sees (serialized kind + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → API error → Frontend              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (listing id, state, transition)
//! 3. Errors are enum variants, never String
//! 4. Every fatal variant maps to a user-facing message; only the tax
//!    provider path is allowed to degrade silently (in mosaic-tax)

use thiserror::Error;

use crate::money::Currency;
use crate::process::{ProcessState, Transition};

// =============================================================================
// Core Error
// =============================================================================

/// Core pricing and transaction-state errors.
///
/// These errors abort the in-progress checkout or transition request.
/// They are surfaced to the caller as a structured kind + message and are
/// never silently swallowed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two Money values with different currencies met in arithmetic,
    /// or a cart item carries a different currency than the main listing.
    ///
    /// ## When This Occurs
    /// - Multi-currency carts (unsupported by policy, rejected up front)
    /// - A listing was re-priced in a different currency mid-checkout
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        expected: Currency,
        found: Currency,
    },

    /// Quantity is zero or negative where at least one unit is required.
    #[error("Invalid quantity: {requested} (must be at least 1)")]
    InvalidQuantity { requested: i64 },

    /// A purchased item has no resolvable price and no override offer.
    ///
    /// ## When This Occurs
    /// - Listing data is incomplete upstream (data integrity issue)
    /// - A negotiated payment request reached pricing without an accepted
    ///   offer amount to fall back on
    #[error("Listing {listing_id} has no price and no negotiated override")]
    MissingListingPrice { listing_id: String },

    /// The requested transition is not legal from the current state.
    ///
    /// Surfaced to the user as "this action is no longer available" —
    /// typically the other party acted first.
    #[error("Transition {transition} is not legal from state {state}")]
    IllegalTransition {
        state: ProcessState,
        transition: Transition,
    },

    /// The offer ledger and the transaction's transition history have
    /// drifted out of sync (e.g. a retried request double-appending).
    ///
    /// Surfaced as a generic retry-checkout error; logged upstream for
    /// investigation.
    #[error("Negotiation history is inconsistent: {reason}")]
    InvalidNegotiationHistory { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before pricing or state logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. invalid UUID, invalid country code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
