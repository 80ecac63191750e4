//! # Transaction Process Graphs
//!
//! Declarative state machines for the two transaction lifecycles the
//! marketplace runs: the standard purchase and the negotiated purchase.
//!
//! ## Graph Shape (negotiated purchase)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  initial ──customer-offer──► offer-pending ◄──┐                        │
//! │                                  │            │ customer-counter-offer │
//! │             provider-counter-offer            │                        │
//! │                                  ▼            │                        │
//! │                            counter-pending ───┘                        │
//! │                                                                         │
//! │  Either side of the loop can accept / decline / withdraw / expire.     │
//! │  Accepting leaves the loop:                                             │
//! │                                                                         │
//! │  accepted ──request-payment──► pending-payment ──confirm-payment──►    │
//! │  purchased ──mark-delivered──► delivered ──mark-received──► received   │
//! │  received ──auto-complete──► completed                                  │
//! │                                                                         │
//! │  Terminal: declined, payment-expired, canceled, completed               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Notes
//! - States and transitions are enums with wire-stable kebab-case names;
//!   the hosted platform speaks those strings
//! - Each graph is an explicit edge table built once; `apply` is a lookup,
//!   never a heuristic
//! - "Privileged" transitions affect pricing or payment and must only be
//!   submitted by the trusted server after line items are recomputed

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{LineItemCode, TransactionRole};

// =============================================================================
// Process State
// =============================================================================

/// A state in a transaction process graph.
///
/// The union of both graphs' states; which states are reachable depends on
/// the [`ProcessKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessState {
    Initial,
    OfferPending,
    CounterPending,
    Accepted,
    Declined,
    PendingPayment,
    PaymentExpired,
    Purchased,
    Delivered,
    Disputed,
    Received,
    Completed,
    Canceled,
}

impl ProcessState {
    /// The wire-stable name the hosted platform uses for this state.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Initial => "initial",
            ProcessState::OfferPending => "offer-pending",
            ProcessState::CounterPending => "counter-pending",
            ProcessState::Accepted => "accepted",
            ProcessState::Declined => "declined",
            ProcessState::PendingPayment => "pending-payment",
            ProcessState::PaymentExpired => "payment-expired",
            ProcessState::Purchased => "purchased",
            ProcessState::Delivered => "delivered",
            ProcessState::Disputed => "disputed",
            ProcessState::Received => "received",
            ProcessState::Completed => "completed",
            ProcessState::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(ProcessState::Initial),
            "offer-pending" => Ok(ProcessState::OfferPending),
            "counter-pending" => Ok(ProcessState::CounterPending),
            "accepted" => Ok(ProcessState::Accepted),
            "declined" => Ok(ProcessState::Declined),
            "pending-payment" => Ok(ProcessState::PendingPayment),
            "payment-expired" => Ok(ProcessState::PaymentExpired),
            "purchased" => Ok(ProcessState::Purchased),
            "delivered" => Ok(ProcessState::Delivered),
            "disputed" => Ok(ProcessState::Disputed),
            "received" => Ok(ProcessState::Received),
            "completed" => Ok(ProcessState::Completed),
            "canceled" => Ok(ProcessState::Canceled),
            other => Err(format!("unknown process state: {other}")),
        }
    }
}

// =============================================================================
// Transition
// =============================================================================

/// A named edge in a transaction process graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    // Negotiation loop
    CustomerOffer,
    AcceptOffer,
    DeclineOffer,
    ProviderCounterOffer,
    WithdrawOffer,
    OperatorDeclineFromOffer,
    ExpireOffer,
    AcceptCounterOffer,
    DeclineCounterOffer,
    CustomerCounterOffer,
    WithdrawCounterOffer,
    OperatorDeclineFromCounter,
    ExpireCounterOffer,
    ExpireAccepted,
    // Payment
    RequestPayment,
    ConfirmPayment,
    ExpirePayment,
    // Fulfillment
    MarkReceivedFromPurchased,
    MarkDelivered,
    OperatorMarkDelivered,
    Cancel,
    AutoCancel,
    MarkReceived,
    AutoMarkReceived,
    Dispute,
    OperatorDispute,
    MarkReceivedFromDisputed,
    CancelFromDisputed,
    AutoCancelFromDisputed,
    AutoComplete,
}

impl Transition {
    /// The wire-stable name the hosted platform uses for this transition.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Transition::CustomerOffer => "customer-offer",
            Transition::AcceptOffer => "accept-offer",
            Transition::DeclineOffer => "decline-offer",
            Transition::ProviderCounterOffer => "provider-counter-offer",
            Transition::WithdrawOffer => "withdraw-offer",
            Transition::OperatorDeclineFromOffer => "operator-decline-from-offer",
            Transition::ExpireOffer => "expire-offer",
            Transition::AcceptCounterOffer => "accept-counter-offer",
            Transition::DeclineCounterOffer => "decline-counter-offer",
            Transition::CustomerCounterOffer => "customer-counter-offer",
            Transition::WithdrawCounterOffer => "withdraw-counter-offer",
            Transition::OperatorDeclineFromCounter => "operator-decline-from-counter",
            Transition::ExpireCounterOffer => "expire-counter-offer",
            Transition::ExpireAccepted => "expire-accepted",
            Transition::RequestPayment => "request-payment",
            Transition::ConfirmPayment => "confirm-payment",
            Transition::ExpirePayment => "expire-payment",
            Transition::MarkReceivedFromPurchased => "mark-received-from-purchased",
            Transition::MarkDelivered => "mark-delivered",
            Transition::OperatorMarkDelivered => "operator-mark-delivered",
            Transition::Cancel => "cancel",
            Transition::AutoCancel => "auto-cancel",
            Transition::MarkReceived => "mark-received",
            Transition::AutoMarkReceived => "auto-mark-received",
            Transition::Dispute => "dispute",
            Transition::OperatorDispute => "operator-dispute",
            Transition::MarkReceivedFromDisputed => "mark-received-from-disputed",
            Transition::CancelFromDisputed => "cancel-from-disputed",
            Transition::AutoCancelFromDisputed => "auto-cancel-from-disputed",
            Transition::AutoComplete => "auto-complete",
        }
    }

    /// Whether this transition must be executed server-side.
    ///
    /// Privileged transitions carry or re-establish pricing: the line-item
    /// breakdown must be recomputed by the trusted server and attached to
    /// the transition request. They are never accepted straight from the
    /// browser.
    pub const fn is_privileged(&self) -> bool {
        matches!(
            self,
            Transition::CustomerOffer
                | Transition::ProviderCounterOffer
                | Transition::CustomerCounterOffer
                | Transition::RequestPayment
        )
    }

    /// Whether this transition carries an offer amount that must be
    /// appended to the transaction's offer ledger.
    pub const fn is_offer_bearing(&self) -> bool {
        matches!(
            self,
            Transition::CustomerOffer
                | Transition::ProviderCounterOffer
                | Transition::CustomerCounterOffer
        )
    }

    /// The role that acts when taking an offer-bearing transition.
    ///
    /// Returns `None` for transitions that carry no offer. There is no
    /// defaulting here: an offer append without a known acting role is a
    /// caller bug, not a provider action.
    pub const fn offer_role(&self) -> Option<TransactionRole> {
        match self {
            Transition::CustomerOffer | Transition::CustomerCounterOffer => {
                Some(TransactionRole::Customer)
            }
            Transition::ProviderCounterOffer => Some(TransactionRole::Provider),
            _ => None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Process Kind
// =============================================================================

/// Which transaction process a transaction runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessKind {
    /// Buy-now at the listed price.
    StandardPurchase,
    /// Price established via offer/counter-offer before payment.
    NegotiatedPurchase,
}

impl ProcessKind {
    /// The process graph for this kind.
    pub fn graph(&self) -> ProcessGraph {
        match self {
            ProcessKind::StandardPurchase => ProcessGraph::standard_purchase(),
            ProcessKind::NegotiatedPurchase => ProcessGraph::negotiated_purchase(),
        }
    }

    /// The line-item code used for the base (per-unit) entry under this
    /// process.
    pub fn base_unit_code(&self) -> LineItemCode {
        match self {
            ProcessKind::StandardPurchase => LineItemCode::Item,
            ProcessKind::NegotiatedPurchase => LineItemCode::NegotiatedItem,
        }
    }
}

// =============================================================================
// Process Graph
// =============================================================================

/// A declarative transaction state machine: states, named edges, and an
/// initial state.
///
/// ## Invariants
/// - Every non-terminal state has at least one outgoing transition
/// - A state with no outgoing edges is terminal
/// - Cycles exist only through the explicit re-offer loop
///   (`offer-pending` ⇄ `counter-pending`)
#[derive(Debug, Clone)]
pub struct ProcessGraph {
    id: &'static str,
    initial: ProcessState,
    edges: HashMap<ProcessState, Vec<(Transition, ProcessState)>>,
}

impl ProcessGraph {
    /// The standard buy-now purchase process.
    ///
    /// Payment is requested directly from `initial` at the listed price;
    /// the fulfillment path after payment is shared with the negotiated
    /// process.
    pub fn standard_purchase() -> Self {
        let mut edges: HashMap<ProcessState, Vec<(Transition, ProcessState)>> = HashMap::new();
        edges.insert(
            ProcessState::Initial,
            vec![(Transition::RequestPayment, ProcessState::PendingPayment)],
        );
        Self::insert_fulfillment_edges(&mut edges);

        ProcessGraph {
            id: "standard-purchase",
            initial: ProcessState::Initial,
            edges,
        }
    }

    /// The negotiated purchase process.
    ///
    /// This is the authoritative transition table: the negotiation loop
    /// allows unbounded back-and-forth until one side accepts, declines,
    /// withdraws, or the offer expires; from `accepted` onwards the graph
    /// is a strict forward DAG.
    pub fn negotiated_purchase() -> Self {
        use ProcessState::*;
        use Transition::*;

        let mut edges: HashMap<ProcessState, Vec<(Transition, ProcessState)>> = HashMap::new();
        edges.insert(Initial, vec![(CustomerOffer, OfferPending)]);
        edges.insert(
            OfferPending,
            vec![
                (AcceptOffer, Accepted),
                (DeclineOffer, Declined),
                (ProviderCounterOffer, CounterPending),
                (WithdrawOffer, Declined),
                (OperatorDeclineFromOffer, Declined),
                (ExpireOffer, Declined),
            ],
        );
        edges.insert(
            CounterPending,
            vec![
                (AcceptCounterOffer, Accepted),
                (DeclineCounterOffer, Declined),
                (CustomerCounterOffer, OfferPending),
                (WithdrawCounterOffer, Declined),
                (OperatorDeclineFromCounter, Declined),
                (ExpireCounterOffer, Declined),
            ],
        );
        edges.insert(
            Accepted,
            vec![
                (RequestPayment, PendingPayment),
                (ExpireAccepted, Declined),
            ],
        );
        Self::insert_fulfillment_edges(&mut edges);

        ProcessGraph {
            id: "negotiated-purchase",
            initial: ProcessState::Initial,
            edges,
        }
    }

    /// Fulfillment edges shared by both processes: payment, delivery,
    /// dispute, and completion.
    fn insert_fulfillment_edges(edges: &mut HashMap<ProcessState, Vec<(Transition, ProcessState)>>) {
        use ProcessState::*;
        use Transition::*;

        edges.insert(
            PendingPayment,
            vec![
                (ConfirmPayment, Purchased),
                (ExpirePayment, PaymentExpired),
            ],
        );
        edges.insert(
            Purchased,
            vec![
                (MarkReceivedFromPurchased, Received),
                (MarkDelivered, Delivered),
                (OperatorMarkDelivered, Delivered),
                (Cancel, Canceled),
                (AutoCancel, Canceled),
            ],
        );
        edges.insert(
            Delivered,
            vec![
                (MarkReceived, Received),
                (AutoMarkReceived, Received),
                (Dispute, Disputed),
                (OperatorDispute, Disputed),
            ],
        );
        edges.insert(
            Disputed,
            vec![
                (MarkReceivedFromDisputed, Received),
                (CancelFromDisputed, Canceled),
                (AutoCancelFromDisputed, Canceled),
            ],
        );
        edges.insert(Received, vec![(AutoComplete, Completed)]);
    }

    /// The process identifier the hosted platform knows this graph by.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// The state a fresh transaction starts in.
    pub fn initial_state(&self) -> ProcessState {
        self.initial
    }

    /// Applies a named transition to the current state.
    ///
    /// Fails with `IllegalTransition` if the transition is not an outgoing
    /// edge of `current` in this graph. Deterministic: the same
    /// (state, transition) pair always yields the same next state.
    pub fn apply(&self, current: ProcessState, transition: Transition) -> CoreResult<ProcessState> {
        self.edges
            .get(&current)
            .and_then(|outgoing| {
                outgoing
                    .iter()
                    .find(|(t, _)| *t == transition)
                    .map(|(_, next)| *next)
            })
            .ok_or(CoreError::IllegalTransition {
                state: current,
                transition,
            })
    }

    /// Whether a state has no outgoing edges in this graph.
    pub fn is_terminal(&self, state: ProcessState) -> bool {
        self.edges.get(&state).map_or(true, |e| e.is_empty())
    }

    /// The outgoing edges of a state, in declaration order.
    pub fn transitions_from(&self, state: ProcessState) -> &[(Transition, ProcessState)] {
        self.edges.get(&state).map_or(&[], Vec::as_slice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
