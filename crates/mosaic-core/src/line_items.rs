//! # Line Item Builder
//!
//! Turns a checkout order (listing, cart, delivery method, frame choices,
//! commission rates, tax result) into the ordered, reversal-aware list of
//! priced line items attached to a transition request.
//!
//! ## Construction Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. base item        line-item/item (or /negotiatedItem)   [C+P]       │
//! │  2. cart items       line-item/cart-item-{id} each         [C+P]       │
//! │  3. shipping         line-item/shipping-fee                [C+P]       │
//! │  4. frame            line-item/frame                       [C]         │
//! │  5. provider comm.   line-item/provider-commission (neg)   [P]         │
//! │  6. customer comm.   line-item/customer-commission (pos)   [C]         │
//! │  7. tax              line-item/tax                         [C]         │
//! │                                                                         │
//! │  Commission base = provider-visible entries so far (base + cart +      │
//! │  shipping). Frame entries are customer-only and therefore not          │
//! │  commissionable; tax is added after commission and never enters the    │
//! │  base.                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Negotiated Purchases
//! At the payment-request transition of a negotiated purchase the base
//! entry's unit price is the latest accepted offer amount, not the listed
//! price. [`negotiated_unit_price`] resolves that amount from the offer
//! ledger, falling back to the transaction's last non-reversed base entry
//! when the metadata is absent.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Currency, Money};
use crate::offers::{latest_offer_subunits, Offer};
use crate::process::ProcessKind;
use crate::types::{
    CartItem, CommissionRates, DeliveryMethod, IncludeFor, LineItem, LineItemCode, Listing,
    OrderParams, TaxResult, TransactionRole,
};
use crate::{shipping, validation};

// =============================================================================
// Checkout Order
// =============================================================================

/// The order side of a pricing request: what is being bought and how.
#[derive(Debug, Clone)]
pub struct CheckoutOrder {
    pub listing: Listing,
    pub cart_items: Vec<CartItem>,
    pub params: OrderParams,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the ordered line-item breakdown for a checkout or privileged
/// transition.
///
/// `negotiated_price` overrides the listing's price for the base entry; it
/// is required semantics at the payment-request transition of a negotiated
/// purchase and must be `None` for standard purchases.
///
/// ## Errors
/// - `InvalidQuantity` for any quantity below 1
/// - `MissingListingPrice` when neither a listed price nor an override
///   exists
/// - `CurrencyMismatch` when cart items, override, or tax disagree with
///   the order currency (multi-currency carts are rejected by policy)
pub fn build_line_items(
    kind: ProcessKind,
    order: &CheckoutOrder,
    commissions: &CommissionRates,
    tax: Option<&TaxResult>,
    negotiated_price: Option<Money>,
) -> CoreResult<Vec<LineItem>> {
    checked_quantity(order.params.quantity)?;
    validation::validate_cart_size(order.cart_items.len())?;

    // 1. Base unit price: negotiated override wins over the listed price.
    let unit_price = match (negotiated_price, order.listing.price) {
        (Some(offer), _) => offer,
        (None, Some(listed)) => listed,
        (None, None) => {
            return Err(CoreError::MissingListingPrice {
                listing_id: order.listing.id.clone(),
            })
        }
    };
    let currency = unit_price.currency();
    if let Some(listed) = order.listing.price {
        if listed.currency() != currency {
            return Err(CoreError::CurrencyMismatch {
                expected: currency,
                found: listed.currency(),
            });
        }
    }

    let mut items = vec![LineItem::unit_priced(
        kind.base_unit_code(),
        unit_price,
        order.params.quantity,
        IncludeFor::both(),
    )];

    // 2. One entry per additional cart item, keyed by listing id.
    for cart_item in &order.cart_items {
        checked_quantity(cart_item.quantity)?;
        if cart_item.price.currency() != currency {
            return Err(CoreError::CurrencyMismatch {
                expected: currency,
                found: cart_item.price.currency(),
            });
        }
        items.push(LineItem::unit_priced(
            LineItemCode::CartItem(cart_item.id.clone()),
            cart_item.price,
            cart_item.quantity,
            IncludeFor::both(),
        ));
    }

    // 3. Shipping over the whole order: the cart ships together, so the
    //    first-item price applies once and every further unit (main or
    //    cart) pays the incremental price.
    if order.params.delivery_method == DeliveryMethod::Shipping {
        let total_units = order.params.quantity
            + order.cart_items.iter().map(|i| i.quantity).sum::<i64>();
        if let Some(fee) = shipping::shipping_fee(&order.listing.shipping, currency, total_units)? {
            items.push(LineItem::amount(
                LineItemCode::ShippingFee,
                fee,
                IncludeFor::both(),
            ));
        }
    }

    // 4. Frame add-ons: each selected frame contributes its declared
    //    price once. Customer-only; frame cost is not commissionable.
    let frame_subunits = frame_total_subunits(order);
    if let Some(subunits) = frame_subunits {
        items.push(LineItem::amount(
            LineItemCode::Frame,
            Money::new(subunits, currency),
            IncludeFor::customer_only(),
        ));
    }

    // 5./6. Commission over the provider-payable entries so far.
    let commission_base = provider_payable_total(&items, currency)?;
    if let Some(bps) = commissions.provider_bps {
        items.push(LineItem::amount(
            LineItemCode::ProviderCommission,
            commission_base.percentage_of(bps).negated(),
            IncludeFor::provider_only(),
        ));
    }
    if let Some(bps) = commissions.customer_bps {
        items.push(LineItem::amount(
            LineItemCode::CustomerCommission,
            commission_base.percentage_of(bps),
            IncludeFor::customer_only(),
        ));
    }

    // 7. Tax is customer-borne and never part of the commission base.
    if let Some(tax) = tax {
        if tax.tax_amount.is_positive() {
            if tax.tax_amount.currency() != currency {
                return Err(CoreError::CurrencyMismatch {
                    expected: currency,
                    found: tax.tax_amount.currency(),
                });
            }
            items.push(LineItem::amount(
                LineItemCode::Tax,
                tax.tax_amount,
                IncludeFor::customer_only(),
            ));
        }
    }

    Ok(items)
}

/// Quantity bounds live in [`validation`]; a non-positive quantity keeps
/// its dedicated error variant, an over-limit one surfaces the range.
fn checked_quantity(requested: i64) -> CoreResult<()> {
    validation::validate_quantity(requested).map_err(|err| match err {
        ValidationError::MustBePositive { .. } => CoreError::InvalidQuantity { requested },
        other => CoreError::Validation(other),
    })
}

/// Sum of declared frame prices across the main listing and cart items.
/// `None` when no frame was selected anywhere.
fn frame_total_subunits(order: &CheckoutOrder) -> Option<i64> {
    let mut any_selected = false;
    let mut total = 0i64;

    if let Some(frame) = &order.params.frame {
        any_selected = true;
        total += frame.price_subunits;
    }
    for item in &order.cart_items {
        if item.selected_frame_label.is_some() {
            any_selected = true;
            total += item.frame_price_subunits.unwrap_or(0);
        }
    }

    any_selected.then_some(total)
}

/// Sum of non-reversal, provider-visible line totals.
fn provider_payable_total(items: &[LineItem], currency: Currency) -> CoreResult<Money> {
    let mut total = Money::zero(currency);
    for item in items {
        if item.include_for.provider && !item.reversal {
            total = total.checked_add(item.line_total)?;
        }
    }
    Ok(total)
}

// =============================================================================
// Totals & Reversals
// =============================================================================

/// The total payable by (or to) a role: the sum of every line item on that
/// role's receipt. Reversal entries already carry negated totals, so a
/// fully-reversed breakdown nets to zero.
///
/// Returns `None` when no entry is visible to the role.
pub fn total_for_role(items: &[LineItem], role: TransactionRole) -> CoreResult<Option<Money>> {
    let mut total: Option<Money> = None;
    for item in items {
        if !item.include_for.includes(role) {
            continue;
        }
        total = Some(match total {
            None => item.line_total,
            Some(t) => t.checked_add(item.line_total)?,
        });
    }
    Ok(total)
}

/// What the customer pays in.
pub fn payin_total(items: &[LineItem]) -> CoreResult<Option<Money>> {
    total_for_role(items, TransactionRole::Customer)
}

/// What the provider is paid out.
pub fn payout_total(items: &[LineItem]) -> CoreResult<Option<Money>> {
    total_for_role(items, TransactionRole::Provider)
}

/// The full-reversal set for a refund/cancellation transition: one
/// reversal entry per non-reversed original, with negated totals.
///
/// Appending the result to the originals nets every code to exactly zero.
/// Partial refunds are not modeled.
pub fn reverse_line_items(items: &[LineItem]) -> Vec<LineItem> {
    items
        .iter()
        .filter(|item| !item.reversal)
        .map(LineItem::reversed)
        .collect()
}

// =============================================================================
// Negotiated Price Resolution
// =============================================================================

/// Resolves the unit price for a negotiated purchase's payment request.
///
/// Prefers the latest entry of the offer ledger; when the metadata is
/// absent (older transactions), falls back to the unit price of the last
/// non-reversed base entry already attached to the transaction.
pub fn negotiated_unit_price(
    offers: &[Offer],
    previous_items: &[LineItem],
    currency: Currency,
) -> Option<Money> {
    if let Some(subunits) = latest_offer_subunits(offers) {
        return Some(Money::new(subunits, currency));
    }

    previous_items
        .iter()
        .rev()
        .find(|item| {
            !item.reversal
                && matches!(item.code, LineItemCode::Item | LineItemCode::NegotiatedItem)
        })
        .map(|item| item.unit_price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Transition;
    use crate::types::{FrameSelection, ShippingConfig};
    use crate::{MAX_CART_ITEMS, MAX_ORDER_QUANTITY};
    use chrono::Utc;

    fn usd() -> Currency {
        Currency::from_code("USD").unwrap()
    }

    fn listing(price_subunits: Option<i64>, first: Option<i64>, additional: Option<i64>) -> Listing {
        Listing {
            id: "main-listing".to_string(),
            title: "Harbor at Dusk".to_string(),
            price: price_subunits.map(|s| Money::new(s, usd())),
            shipping: ShippingConfig {
                price_for_first_item: first.map(|s| Money::new(s, usd())),
                price_for_additional_items: additional.map(|s| Money::new(s, usd())),
            },
        }
    }

    fn order(quantity: i64, delivery: DeliveryMethod) -> CheckoutOrder {
        CheckoutOrder {
            listing: listing(Some(10_000), Some(500), Some(200)),
            cart_items: vec![],
            params: OrderParams {
                quantity,
                delivery_method: delivery,
                frame: None,
            },
        }
    }

    fn cart_item(id: &str, price: i64, quantity: i64) -> CartItem {
        CartItem {
            id: id.to_string(),
            title: format!("Cart listing {id}"),
            price: Money::new(price, usd()),
            quantity,
            image_url: None,
            selected_frame_label: None,
            frame_price_subunits: None,
        }
    }

    fn find<'a>(items: &'a [LineItem], code: &LineItemCode) -> Option<&'a LineItem> {
        items.iter().find(|i| &i.code == code)
    }

    #[test]
    fn test_base_plus_shipping_scenario() {
        // Listed 100.00, quantity 2, shipping 5.00 first + 2.00 additional,
        // no frame, no tax, no commission.
        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order(2, DeliveryMethod::Shipping),
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap();

        assert_eq!(items.len(), 2);

        let base = find(&items, &LineItemCode::Item).unwrap();
        assert_eq!(base.line_total.subunits(), 20_000);
        assert_eq!(base.quantity, 2);

        let shipping = find(&items, &LineItemCode::ShippingFee).unwrap();
        assert_eq!(shipping.line_total.subunits(), 700);

        let payin = payin_total(&items).unwrap().unwrap();
        assert_eq!(payin.subunits(), 20_700);
        let payout = payout_total(&items).unwrap().unwrap();
        assert_eq!(payout.subunits(), 20_700);
    }

    #[test]
    fn test_pickup_has_no_shipping_line() {
        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order(2, DeliveryMethod::Pickup),
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap();

        assert!(find(&items, &LineItemCode::ShippingFee).is_none());
        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 20_000);
    }

    #[test]
    fn test_cart_items_get_deterministic_codes() {
        let mut order = order(1, DeliveryMethod::Pickup);
        order.cart_items = vec![cart_item("l2", 5_000, 1), cart_item("l3", 2_500, 2)];

        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap();

        let l2 = find(&items, &LineItemCode::CartItem("l2".to_string())).unwrap();
        assert_eq!(l2.line_total.subunits(), 5_000);
        let l3 = find(&items, &LineItemCode::CartItem("l3".to_string())).unwrap();
        assert_eq!(l3.line_total.subunits(), 5_000);
        assert_eq!(l3.quantity, 2);

        // 10000 + 5000 + 5000
        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 20_000);
    }

    #[test]
    fn test_shipping_covers_cart_units_incrementally() {
        let mut order = order(1, DeliveryMethod::Shipping);
        order.cart_items = vec![cart_item("l2", 5_000, 2)];

        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap();

        // 3 units total: 500 + 200 × 2
        let shipping = find(&items, &LineItemCode::ShippingFee).unwrap();
        assert_eq!(shipping.line_total.subunits(), 900);
    }

    #[test]
    fn test_frame_is_customer_only_and_not_commissionable() {
        let mut order = order(1, DeliveryMethod::Pickup);
        order.params.frame = Some(FrameSelection {
            label: "Natural Oak".to_string(),
            price_subunits: 3_000,
        });

        let commissions = CommissionRates {
            provider_bps: Some(1000), // 10%
            customer_bps: None,
        };
        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &commissions,
            None,
            None,
        )
        .unwrap();

        let frame = find(&items, &LineItemCode::Frame).unwrap();
        assert_eq!(frame.line_total.subunits(), 3_000);
        assert!(frame.include_for.customer);
        assert!(!frame.include_for.provider);

        // Commission base is 10000 (base only), not 13000.
        let commission = find(&items, &LineItemCode::ProviderCommission).unwrap();
        assert_eq!(commission.line_total.subunits(), -1_000);

        // Customer pays base + frame; provider receives base − commission.
        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 13_000);
        assert_eq!(payout_total(&items).unwrap().unwrap().subunits(), 9_000);
    }

    #[test]
    fn test_cart_frames_sum_into_one_frame_line() {
        let mut order = order(1, DeliveryMethod::Pickup);
        order.params.frame = Some(FrameSelection {
            label: "Natural Oak".to_string(),
            price_subunits: 3_000,
        });
        let mut framed = cart_item("l2", 5_000, 1);
        framed.selected_frame_label = Some("Matte Black".to_string());
        framed.frame_price_subunits = Some(2_500);
        order.cart_items = vec![framed];

        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap();

        let frame = find(&items, &LineItemCode::Frame).unwrap();
        assert_eq!(frame.line_total.subunits(), 5_500);
    }

    #[test]
    fn test_commission_both_sides_over_base_plus_shipping() {
        let commissions = CommissionRates {
            provider_bps: Some(1000), // 10%
            customer_bps: Some(500),  // 5%
        };
        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order(2, DeliveryMethod::Shipping),
            &commissions,
            None,
            None,
        )
        .unwrap();

        // Base 20000 + shipping 700 = 20700 commission base.
        let provider = find(&items, &LineItemCode::ProviderCommission).unwrap();
        assert_eq!(provider.line_total.subunits(), -2_070);
        assert!(provider.include_for.provider);
        assert!(!provider.include_for.customer);

        let customer = find(&items, &LineItemCode::CustomerCommission).unwrap();
        assert_eq!(customer.line_total.subunits(), 1_035);
        assert!(customer.include_for.customer);
        assert!(!customer.include_for.provider);

        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 21_735);
        assert_eq!(payout_total(&items).unwrap().unwrap().subunits(), 18_630);
    }

    #[test]
    fn test_tax_line_is_customer_only_and_after_commission() {
        let tax = TaxResult {
            tax_amount: Money::new(4_140, usd()), // 20% of 20700
            tax_rate: crate::types::TaxRate::from_bps(2000),
            is_manual_calculation: false,
            error: None,
        };
        let commissions = CommissionRates {
            provider_bps: Some(1000),
            customer_bps: None,
        };
        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order(2, DeliveryMethod::Shipping),
            &commissions,
            Some(&tax),
            None,
        )
        .unwrap();

        let tax_line = find(&items, &LineItemCode::Tax).unwrap();
        assert_eq!(tax_line.line_total.subunits(), 4_140);
        assert!(!tax_line.include_for.provider);

        // Commission base unchanged by tax: 10% of 20700.
        let commission = find(&items, &LineItemCode::ProviderCommission).unwrap();
        assert_eq!(commission.line_total.subunits(), -2_070);

        // Tax line comes last.
        assert_eq!(items.last().unwrap().code, LineItemCode::Tax);
    }

    #[test]
    fn test_zero_tax_produces_no_line() {
        let tax = TaxResult::zero(usd());
        let items = build_line_items(
            ProcessKind::StandardPurchase,
            &order(1, DeliveryMethod::Pickup),
            &CommissionRates::default(),
            Some(&tax),
            None,
        )
        .unwrap();
        assert!(find(&items, &LineItemCode::Tax).is_none());
    }

    #[test]
    fn test_negotiated_override_replaces_listed_price() {
        // Customer offered 80.00 on a 100.00 listing; offer accepted.
        let items = build_line_items(
            ProcessKind::NegotiatedPurchase,
            &order(1, DeliveryMethod::Pickup),
            &CommissionRates::default(),
            None,
            Some(Money::new(8_000, usd())),
        )
        .unwrap();

        let base = find(&items, &LineItemCode::NegotiatedItem).unwrap();
        assert_eq!(base.unit_price.subunits(), 8_000);
        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 8_000);
        assert!(find(&items, &LineItemCode::Item).is_none());
    }

    #[test]
    fn test_missing_price_fails_without_override() {
        let mut order = order(1, DeliveryMethod::Pickup);
        order.listing = listing(None, None, None);

        let err = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingListingPrice { .. }));

        // A negotiated override rescues the missing listed price.
        let items = build_line_items(
            ProcessKind::NegotiatedPurchase,
            &order,
            &CommissionRates::default(),
            None,
            Some(Money::new(8_000, usd())),
        )
        .unwrap();
        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 8_000);
    }

    #[test]
    fn test_multi_currency_cart_rejected() {
        let eur = Currency::from_code("EUR").unwrap();
        let mut order = order(1, DeliveryMethod::Pickup);
        let mut foreign = cart_item("l2", 5_000, 1);
        foreign.price = Money::new(5_000, eur);
        order.cart_items = vec![foreign];

        let err = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::CurrencyMismatch { .. }));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(matches!(
            build_line_items(
                ProcessKind::StandardPurchase,
                &order(0, DeliveryMethod::Pickup),
                &CommissionRates::default(),
                None,
                None,
            )
            .unwrap_err(),
            CoreError::InvalidQuantity { requested: 0 }
        ));
    }

    #[test]
    fn test_quantity_above_limit_rejected() {
        // Same bound as validation::validate_quantity, not a local copy.
        let err = build_line_items(
            ProcessKind::StandardPurchase,
            &order(MAX_ORDER_QUANTITY + 1, DeliveryMethod::Pickup),
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut order = order(1, DeliveryMethod::Pickup);
        order.cart_items = vec![cart_item("l2", 5_000, MAX_ORDER_QUANTITY + 1)];
        let err = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_oversized_cart_rejected() {
        let mut order = order(1, DeliveryMethod::Pickup);
        order.cart_items = (0..=MAX_CART_ITEMS)
            .map(|i| cart_item(&format!("l{i}"), 100, 1))
            .collect();

        let err = build_line_items(
            ProcessKind::StandardPurchase,
            &order,
            &CommissionRates::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_full_reversal_nets_every_code_to_zero() {
        let commissions = CommissionRates {
            provider_bps: Some(1000),
            customer_bps: Some(500),
        };
        let mut items = build_line_items(
            ProcessKind::StandardPurchase,
            &order(2, DeliveryMethod::Shipping),
            &commissions,
            None,
            None,
        )
        .unwrap();

        let reversals = reverse_line_items(&items);
        assert_eq!(reversals.len(), items.len());
        items.extend(reversals);

        // Per-code and per-role totals all net to zero.
        for code in [
            LineItemCode::Item,
            LineItemCode::ShippingFee,
            LineItemCode::ProviderCommission,
            LineItemCode::CustomerCommission,
        ] {
            let net: i64 = items
                .iter()
                .filter(|i| i.code == code)
                .map(|i| i.line_total.subunits())
                .sum();
            assert_eq!(net, 0, "{code} should net to zero");
        }
        assert_eq!(payin_total(&items).unwrap().unwrap().subunits(), 0);
        assert_eq!(payout_total(&items).unwrap().unwrap().subunits(), 0);
    }

    #[test]
    fn test_negotiated_unit_price_prefers_ledger() {
        let offers = vec![
            Offer {
                offer_subunits: 8_000,
                by: TransactionRole::Customer,
                transition: Transition::CustomerOffer,
                at: Some(Utc::now()),
            },
            Offer {
                offer_subunits: 9_000,
                by: TransactionRole::Provider,
                transition: Transition::ProviderCounterOffer,
                at: None,
            },
        ];

        let price = negotiated_unit_price(&offers, &[], usd()).unwrap();
        assert_eq!(price.subunits(), 9_000);
    }

    #[test]
    fn test_negotiated_unit_price_falls_back_to_prior_items() {
        let prior = vec![
            LineItem::unit_priced(
                LineItemCode::NegotiatedItem,
                Money::new(8_500, usd()),
                1,
                IncludeFor::both(),
            ),
            LineItem::amount(
                LineItemCode::ShippingFee,
                Money::new(700, usd()),
                IncludeFor::both(),
            ),
        ];

        let price = negotiated_unit_price(&[], &prior, usd()).unwrap();
        assert_eq!(price.subunits(), 8_500);

        // A reversed base entry is not a valid fallback source.
        let reversed: Vec<LineItem> = prior.iter().map(LineItem::reversed).collect();
        assert!(negotiated_unit_price(&[], &reversed, usd()).is_none());
    }
}
