//! # Money Module
//!
//! Provides the `Currency` and `Money` types for handling monetary values
//! safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Subunits                                         │
//! │    Every amount is an i64 count of the currency's minor unit            │
//! │    (cents for USD, pence for GBP). No fractional subunits exist.       │
//! │                                                                         │
//! │  AND: Currency Tagging                                                  │
//! │    A marketplace serves many currencies. Adding USD to EUR is a bug,   │
//! │    so arithmetic between Money values is fallible and checks the tag.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mosaic_core::money::{Currency, Money};
//!
//! let usd = Currency::from_code("USD").unwrap();
//! let price = Money::new(1099, usd); // $10.99
//!
//! let doubled = price.multiply_quantity(2);
//! assert_eq!(doubled.subunits(), 2198);
//!
//! // Cross-currency arithmetic fails instead of producing garbage:
//! let eur = Currency::from_code("EUR").unwrap();
//! assert!(price.checked_add(Money::new(500, eur)).is_err());
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Currency
// =============================================================================

/// An ISO 4217 currency code ("USD", "EUR", ...).
///
/// ## Design Decisions
/// - **[u8; 3] storage**: keeps `Money` `Copy` — no heap allocation for the
///   single most-passed-around value in the pricing engine
/// - **Validated at construction**: always three ASCII uppercase letters,
///   so later formatting can rely on the invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    /// Parses a three-letter ISO 4217 code.
    ///
    /// Accepts lowercase input and normalizes to uppercase.
    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be a three-letter ISO 4217 code".to_string(),
            });
        }

        let mut bytes = [0u8; 3];
        for (i, c) in code.bytes().enumerate() {
            bytes[i] = c.to_ascii_uppercase();
        }
        Ok(Currency(bytes))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Invariant: validated ASCII at construction
        std::str::from_utf8(&self.0).expect("currency code is validated ASCII")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::from_code(s)
    }
}

/// Currencies serialize as their bare code: `"USD"`.
impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Currency::from_code(&s).map_err(D::Error::custom)
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value: an integer count of minor currency units plus the
/// currency it is denominated in.
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values represent reversals and provider
///   commission (money flowing away from the provider)
/// - **Fallible arithmetic**: `checked_add`/`checked_sub` reject mixed
///   currencies with `CurrencyMismatch` instead of silently combining them
///
/// ## Where Money Flows
/// ```text
/// Listing.price ──► LineItem.unit_price ──► LineItem.line_total
///                                                │
///      TaxResult.tax_amount ◄── TaxResolver ◄────┤
///                                                ▼
///                              payin/payout totals ──► hosted platform
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    subunits: i64,
    #[ts(type = "string")]
    currency: Currency,
}

impl Money {
    /// Creates a Money value from minor-unit subunits.
    #[inline]
    pub const fn new(subunits: i64, currency: Currency) -> Self {
        Money { subunits, currency }
    }

    /// Zero in the given currency.
    #[inline]
    pub const fn zero(currency: Currency) -> Self {
        Money {
            subunits: 0,
            currency,
        }
    }

    /// Returns the amount in minor units.
    #[inline]
    pub const fn subunits(&self) -> i64 {
        self.subunits
    }

    /// Returns the currency tag.
    #[inline]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.subunits == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.subunits > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.subunits < 0
    }

    /// Returns the same amount with the sign flipped.
    ///
    /// Used to build reversal line items: a refund of a prior charge is
    /// the charge negated.
    #[inline]
    pub const fn negated(&self) -> Self {
        Money {
            subunits: -self.subunits,
            currency: self.currency,
        }
    }

    /// Adds two Money values, failing on mixed currencies.
    pub fn checked_add(self, other: Money) -> CoreResult<Money> {
        self.require_same_currency(other)?;
        Ok(Money {
            subunits: self.subunits + other.subunits,
            currency: self.currency,
        })
    }

    /// Subtracts two Money values, failing on mixed currencies.
    pub fn checked_sub(self, other: Money) -> CoreResult<Money> {
        self.require_same_currency(other)?;
        Ok(Money {
            subunits: self.subunits - other.subunits,
            currency: self.currency,
        })
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mosaic_core::money::{Currency, Money};
    ///
    /// let usd = Currency::from_code("USD").unwrap();
    /// let unit_price = Money::new(10_000, usd);
    /// assert_eq!(unit_price.multiply_quantity(2).subunits(), 20_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money {
            subunits: self.subunits * qty,
            currency: self.currency,
        }
    }

    /// Takes a percentage of this amount, expressed in basis points.
    ///
    /// ## Why Basis Points?
    /// 1 basis point = 0.01% = 1/10000. Commission rates like 12.5% are
    /// exact integers (1250 bps), so the whole pipeline stays float-free.
    ///
    /// ## Rounding
    /// Integer math with half-up rounding on the absolute value:
    /// `(|subunits| * bps + 5000) / 10000`, sign restored afterwards.
    /// i128 intermediates prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use mosaic_core::money::{Currency, Money};
    ///
    /// let usd = Currency::from_code("USD").unwrap();
    /// let base = Money::new(20_700, usd);
    /// // 10% commission
    /// assert_eq!(base.percentage_of(1000).subunits(), 2_070);
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let magnitude = (self.subunits.unsigned_abs() as i128 * bps as i128 + 5000) / 10000;
        let signed = if self.subunits < 0 {
            -(magnitude as i64)
        } else {
            magnitude as i64
        };
        Money {
            subunits: signed,
            currency: self.currency,
        }
    }

    fn require_same_currency(&self, other: Money) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. The storefront formats amounts itself
/// to handle localization properly. Assumes a two-decimal minor unit,
/// which holds for every currency the marketplace currently sells in.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.subunits < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} {}",
            sign,
            (self.subunits / 100).abs(),
            (self.subunits % 100).abs(),
            self.currency
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
