//! # Transaction UI-State Resolver
//!
//! A pure function from (process, state, role) to presentation directives:
//! which transitions the role may fire, whether it is their turn, and
//! whether the transaction is over.
//!
//! ## Dispatch
//! The source of truth is one exhaustive `match` over `(state, role)` —
//! straight-line and compiler-checked, instead of a generic wildcard
//! pattern-matcher. Unmapped pairs fall through to a minimal directive
//! with no actions, so the storefront never crashes on a state it does
//! not recognize as actionable.
//!
//! Actions are named by the [`Transition`] the button fires; privileged
//! transitions still go through the trusted server, the directive only
//! says what to show.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::process::{ProcessKind, ProcessState, Transition};
use crate::types::TransactionRole;

// =============================================================================
// UI Directive
// =============================================================================

/// What the storefront should present for one (state, role) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UiDirective {
    /// It is this role's turn: the transaction is waiting on them.
    pub action_needed: bool,
    /// The transaction has ended; no further transitions are possible.
    pub is_final: bool,
    /// Who the transaction is waiting on, if anyone.
    pub waiting_on: Option<TransactionRole>,
    /// Ranked actions, most prominent first.
    #[ts(type = "string | null")]
    pub primary_action: Option<Transition>,
    #[ts(type = "string | null")]
    pub secondary_action: Option<Transition>,
    #[ts(type = "string | null")]
    pub tertiary_action: Option<Transition>,
}

impl UiDirective {
    /// The exhaustive default: nothing to do, nothing to show.
    fn none() -> Self {
        UiDirective {
            action_needed: false,
            is_final: false,
            waiting_on: None,
            primary_action: None,
            secondary_action: None,
            tertiary_action: None,
        }
    }

    fn terminal() -> Self {
        UiDirective {
            is_final: true,
            ..UiDirective::none()
        }
    }

    fn waiting_on(role: TransactionRole) -> Self {
        UiDirective {
            waiting_on: Some(role),
            ..UiDirective::none()
        }
    }

    fn actions(primary: Transition, secondary: Option<Transition>, tertiary: Option<Transition>) -> Self {
        UiDirective {
            action_needed: true,
            is_final: false,
            waiting_on: None,
            primary_action: Some(primary),
            secondary_action: secondary,
            tertiary_action: tertiary,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the presentation directive for a role looking at a transaction
/// in a given state.
///
/// Deterministic and idempotent: same inputs, same directive, no side
/// effects.
pub fn resolve(kind: ProcessKind, state: ProcessState, role: TransactionRole) -> UiDirective {
    use ProcessState::*;
    use TransactionRole::*;

    match (state, role) {
        // A fresh transaction: the customer opens with an offer (negotiated)
        // or goes straight to payment (standard).
        (Initial, Customer) => match kind {
            ProcessKind::NegotiatedPurchase => {
                UiDirective::actions(Transition::CustomerOffer, None, None)
            }
            ProcessKind::StandardPurchase => {
                UiDirective::actions(Transition::RequestPayment, None, None)
            }
        },
        (Initial, Provider) => UiDirective::waiting_on(Customer),

        // Negotiation loop: the side holding the open offer decides; the
        // other side may only withdraw what they put forward.
        (OfferPending, Provider) => UiDirective::actions(
            Transition::AcceptOffer,
            Some(Transition::ProviderCounterOffer),
            Some(Transition::DeclineOffer),
        ),
        (OfferPending, Customer) => UiDirective {
            primary_action: Some(Transition::WithdrawOffer),
            ..UiDirective::waiting_on(Provider)
        },
        (CounterPending, Customer) => UiDirective::actions(
            Transition::AcceptCounterOffer,
            Some(Transition::CustomerCounterOffer),
            Some(Transition::DeclineCounterOffer),
        ),
        (CounterPending, Provider) => UiDirective {
            primary_action: Some(Transition::WithdrawCounterOffer),
            ..UiDirective::waiting_on(Customer)
        },

        // Price agreed: the customer carries the flow to payment.
        (Accepted, Customer) => UiDirective::actions(Transition::RequestPayment, None, None),
        (Accepted, Provider) => UiDirective::waiting_on(Customer),
        (PendingPayment, Customer) => UiDirective::actions(Transition::ConfirmPayment, None, None),
        (PendingPayment, Provider) => UiDirective::waiting_on(Customer),

        // Fulfillment.
        (Purchased, Provider) => UiDirective::actions(
            Transition::MarkDelivered,
            Some(Transition::Cancel),
            None,
        ),
        (Purchased, Customer) => UiDirective {
            primary_action: Some(Transition::MarkReceivedFromPurchased),
            ..UiDirective::waiting_on(Provider)
        },
        (Delivered, Customer) => UiDirective::actions(
            Transition::MarkReceived,
            Some(Transition::Dispute),
            None,
        ),
        (Delivered, Provider) => UiDirective::waiting_on(Customer),

        // Disputes are resolved by the operator; the customer may still
        // settle by accepting the delivery.
        (Disputed, Customer) => UiDirective {
            primary_action: Some(Transition::MarkReceivedFromDisputed),
            ..UiDirective::none()
        },
        (Disputed, Provider) => UiDirective::none(),

        // Received is a quiet state: completion is automatic.
        (Received, _) => UiDirective::none(),

        // Terminal states, any role.
        (Declined | PaymentExpired | Canceled | Completed, _) => UiDirective::terminal(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
