//! # Domain Types
//!
//! Core domain types for the order pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Listing      │   │    CartItem     │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  code           │       │
//! │  │  price          │   │  price, qty     │   │  unit_price     │       │
//! │  │  shipping cfg   │   │  frame choice   │   │  include_for    │       │
//! │  └─────────────────┘   └─────────────────┘   │  reversal       │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionRole │   │    TaxRate      │   │   TaxResult     │       │
//! │  │  Customer       │   │  bps (u32)      │   │  amount, rate   │       │
//! │  │  Provider       │   │  2000 = 20%     │   │  manual flag    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inputs (Listing, CartItem, OrderParams) come from the hosted platform's
//! records and the checkout request; LineItem sequences are what we attach
//! to transition requests going back to it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Transaction Role
// =============================================================================

/// The two parties to a transaction.
///
/// Always passed explicitly. An unrecognized actor upstream is a hard
/// validation error at the API boundary, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionRole {
    /// The buyer.
    Customer,
    /// The seller (the listing's owner).
    Provider,
}

impl fmt::Display for TransactionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionRole::Customer => f.write_str("customer"),
            TransactionRole::Provider => f.write_str("provider"),
        }
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (e.g. UK VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Line Item Code
// =============================================================================

/// The wire-stable code identifying what a line item prices.
///
/// Codes are strings on the wire (`line-item/item`,
/// `line-item/cart-item-{listingId}`, ...) because the hosted platform and
/// the stored transaction data speak strings; in Rust they are a closed
/// enum so dispatch over them is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LineItemCode {
    /// Base per-unit entry for a standard purchase.
    Item,
    /// Base per-unit entry priced by an accepted offer.
    NegotiatedItem,
    /// Additional cart entry, keyed by its listing id.
    CartItem(String),
    /// Shipping fee for the order.
    ShippingFee,
    /// Frame add-on charge.
    Frame,
    /// Marketplace commission charged to the provider (negative amount).
    ProviderCommission,
    /// Marketplace commission charged to the customer (positive amount).
    CustomerCommission,
    /// Tax on the order (customer-borne).
    Tax,
}

impl fmt::Display for LineItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineItemCode::Item => f.write_str("line-item/item"),
            LineItemCode::NegotiatedItem => f.write_str("line-item/negotiatedItem"),
            LineItemCode::CartItem(id) => write!(f, "line-item/cart-item-{id}"),
            LineItemCode::ShippingFee => f.write_str("line-item/shipping-fee"),
            LineItemCode::Frame => f.write_str("line-item/frame"),
            LineItemCode::ProviderCommission => f.write_str("line-item/provider-commission"),
            LineItemCode::CustomerCommission => f.write_str("line-item/customer-commission"),
            LineItemCode::Tax => f.write_str("line-item/tax"),
        }
    }
}

impl FromStr for LineItemCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line-item/item" => Ok(LineItemCode::Item),
            "line-item/negotiatedItem" => Ok(LineItemCode::NegotiatedItem),
            "line-item/shipping-fee" => Ok(LineItemCode::ShippingFee),
            "line-item/frame" => Ok(LineItemCode::Frame),
            "line-item/provider-commission" => Ok(LineItemCode::ProviderCommission),
            "line-item/customer-commission" => Ok(LineItemCode::CustomerCommission),
            "line-item/tax" => Ok(LineItemCode::Tax),
            other => match other.strip_prefix("line-item/cart-item-") {
                Some(id) if !id.is_empty() => Ok(LineItemCode::CartItem(id.to_string())),
                _ => Err(format!("unknown line item code: {other}")),
            },
        }
    }
}

/// Codes serialize as their wire string.
impl Serialize for LineItemCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LineItemCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// =============================================================================
// Include For
// =============================================================================

/// Which role's receipt displays a line item.
///
/// A line item can be visible to the customer, the provider, or both:
/// commission entries are one-sided, base and shipping entries are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct IncludeFor {
    pub customer: bool,
    pub provider: bool,
}

impl IncludeFor {
    /// Visible on both receipts.
    pub const fn both() -> Self {
        IncludeFor {
            customer: true,
            provider: true,
        }
    }

    /// Customer receipt only.
    pub const fn customer_only() -> Self {
        IncludeFor {
            customer: true,
            provider: false,
        }
    }

    /// Provider receipt only.
    pub const fn provider_only() -> Self {
        IncludeFor {
            customer: false,
            provider: true,
        }
    }

    /// Whether the given role sees this entry.
    pub const fn includes(&self, role: TransactionRole) -> bool {
        match role {
            TransactionRole::Customer => self.customer,
            TransactionRole::Provider => self.provider,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One priced component of an order's total.
///
/// ## Invariants
/// - `line_total == unit_price * quantity` for unit-priced entries;
///   non-unit entries (commission, tax) carry `quantity == 1` and
///   `line_total == unit_price`
/// - A reversal entry is the refund/credit of a prior entry with the same
///   code: its totals carry the opposite sign, and a full reversal nets
///   each code to exactly zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[ts(type = "string")]
    pub code: LineItemCode,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
    pub include_for: IncludeFor,
    pub reversal: bool,
}

impl LineItem {
    /// A unit-priced entry: `line_total = unit_price * quantity`.
    pub fn unit_priced(
        code: LineItemCode,
        unit_price: Money,
        quantity: i64,
        include_for: IncludeFor,
    ) -> Self {
        LineItem {
            code,
            unit_price,
            line_total: unit_price.multiply_quantity(quantity),
            quantity,
            include_for,
            reversal: false,
        }
    }

    /// A single-amount entry (shipping total, commission, tax):
    /// `quantity = 1`, `line_total = amount`.
    pub fn amount(code: LineItemCode, amount: Money, include_for: IncludeFor) -> Self {
        LineItem {
            code,
            unit_price: amount,
            quantity: 1,
            line_total: amount,
            include_for,
            reversal: false,
        }
    }

    /// The reversal of this entry: same code, negated totals.
    pub fn reversed(&self) -> Self {
        LineItem {
            code: self.code.clone(),
            unit_price: self.unit_price.negated(),
            quantity: self.quantity,
            line_total: self.line_total.negated(),
            include_for: self.include_for,
            reversal: true,
        }
    }
}

// =============================================================================
// Order Inputs
// =============================================================================

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Shipped to the customer's address (adds a shipping line item).
    Shipping,
    /// Picked up in person (no shipping charge).
    Pickup,
}

/// Per-listing shipping price configuration.
///
/// Read-only input to the shipping fee calculator. Both prices absent
/// means the listing declares no shipping price at all, and no shipping
/// line item is produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingConfig {
    pub price_for_first_item: Option<Money>,
    pub price_for_additional_items: Option<Money>,
}

impl ShippingConfig {
    /// Whether the listing declares any shipping price.
    pub fn has_price(&self) -> bool {
        self.price_for_first_item.is_some() || self.price_for_additional_items.is_some()
    }
}

/// A frame add-on chosen for an item at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FrameSelection {
    /// The frame option's display label ("Natural Oak", ...).
    pub label: String,
    /// The frame's declared price in minor units.
    pub price_subunits: i64,
}

/// The main listing being purchased.
///
/// A snapshot of the hosted platform's listing record, reduced to the
/// fields pricing needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Listed price. Absent prices are a data-integrity problem upstream
    /// and fail pricing with `MissingListingPrice` unless a negotiated
    /// override applies.
    pub price: Option<Money>,
    #[serde(default)]
    pub shipping: ShippingConfig,
}

/// An additional cart entry alongside the main listing.
///
/// Owned by the transaction's protected data for the duration of checkout;
/// the derived line item references it by `line-item/cart-item-{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub title: String,
    pub price: Money,
    pub quantity: i64,
    pub image_url: Option<String>,
    pub selected_frame_label: Option<String>,
    #[serde(rename = "framePriceInSubunits")]
    pub frame_price_subunits: Option<i64>,
}

/// Order parameters from the checkout request, covering the main listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    pub quantity: i64,
    pub delivery_method: DeliveryMethod,
    pub frame: Option<FrameSelection>,
}

/// Marketplace commission rates in basis points.
///
/// `None` means the side is not charged commission at all (no line item
/// is produced, as opposed to a zero-amount one).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRates {
    pub provider_bps: Option<u32>,
    pub customer_bps: Option<u32>,
}

// =============================================================================
// Tax Result
// =============================================================================

/// The outcome of one tax calculation attempt.
///
/// Produced per checkout attempt by the tax resolver (mosaic-tax) and
/// consumed by the line-item builder. Not persisted beyond the resulting
/// `line-item/tax` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub tax_amount: Money,
    pub tax_rate: TaxRate,
    /// True when the remote provider failed and the static rate table was
    /// used instead.
    pub is_manual_calculation: bool,
    /// Diagnostic only; checkout proceeds regardless.
    pub error: Option<String>,
}

impl TaxResult {
    /// A zero-tax result (tax disabled, or destination unknown).
    pub fn zero(currency: crate::money::Currency) -> Self {
        TaxResult {
            tax_amount: Money::zero(currency),
            tax_rate: TaxRate::zero(),
            is_manual_calculation: false,
            error: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
