//! # Shipping Fee Calculator
//!
//! Computes the shipping charge for an order from the listing's shipping
//! price configuration.
//!
//! ## Pricing Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  first-item price + additional-item price × (quantity − 1)              │
//! │                                                                         │
//! │  quantity 1:  first                      (500)        → 500             │
//! │  quantity 3:  first + additional × 2     (500 + 400)  → 900             │
//! │                                                                         │
//! │  Missing prices count as zero. A listing with NO shipping price at     │
//! │  all produces no shipping line item (None), which is different from    │
//! │  free shipping (Some(0)).                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::{Currency, Money};
use crate::types::ShippingConfig;

/// Computes the shipping fee for `quantity` units under `config`.
///
/// Returns `Ok(None)` when the listing declares no shipping price at all.
/// Fails with `InvalidQuantity` for quantities below 1 and with
/// `CurrencyMismatch` if the configured prices disagree with the order
/// currency.
pub fn shipping_fee(
    config: &ShippingConfig,
    currency: Currency,
    quantity: i64,
) -> CoreResult<Option<Money>> {
    if quantity < 1 {
        return Err(CoreError::InvalidQuantity {
            requested: quantity,
        });
    }

    if !config.has_price() {
        return Ok(None);
    }

    let first = config
        .price_for_first_item
        .unwrap_or_else(|| Money::zero(currency));
    let additional = config
        .price_for_additional_items
        .unwrap_or_else(|| Money::zero(currency));

    let total = first.checked_add(additional.multiply_quantity(quantity - 1))?;
    if total.currency() != currency {
        return Err(CoreError::CurrencyMismatch {
            expected: currency,
            found: total.currency(),
        });
    }

    Ok(Some(total))
}

// =============================================================================
// Unit Tests
// =============================================================================
