//! # Validation Module
//!
//! Input validation for checkout and transition requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront (React)                                           │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler (deserialization + THIS MODULE)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Hosted platform (authoritative listing/transaction checks)   │
//! │                                                                         │
//! │  Defense in depth: reject bad input before pricing ever runs.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ORDER_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ORDER_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ORDER_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ORDER_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero is allowed (free add-ons)
pub fn validate_price_subunits(subunits: i64) -> ValidationResult<()> {
    if subunits < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a commission rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_commission_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "commission".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a destination country code.
///
/// ## Rules
/// - Exactly two ASCII letters (ISO 3166-1 alpha-2)
/// - Case-insensitive on input; the tax layer normalizes to uppercase
pub fn validate_country_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "country".to_string(),
        });
    }

    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "country".to_string(),
            reason: "must be a two-letter ISO 3166-1 code".to_string(),
        });
    }

    Ok(())
}

/// Validates a listing identifier from the hosted platform.
///
/// ## Rules
/// - Must be a valid UUID
pub fn validate_listing_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "listing id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "listing id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the cart size (number of additional cart items).
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
