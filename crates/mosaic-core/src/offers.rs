//! # Negotiation Offer Ledger
//!
//! The append-only record of offer and counter-offer amounts attached to a
//! negotiated transaction's metadata.
//!
//! ## Consistency Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Transition history        Offer ledger                                 │
//! │  ──────────────────        ─────────────                                │
//! │  customer-offer        ◄──► offers[0]  by customer                      │
//! │  provider-counter-offer◄──► offers[1]  by provider                      │
//! │  customer-counter-offer◄──► offers[2]  by customer                      │
//! │                                                                         │
//! │  Offer-bearing transitions and ledger entries must match 1:1 in        │
//! │  count, order, transition name, and acting role. A retried request     │
//! │  that would double-append desynchronizes them and is rejected with     │
//! │  InvalidNegotiationHistory BEFORE any mutation.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no lock here: two concurrent appends for the same transaction
//! race, and the loser is caught after the fact by this invariant plus the
//! caller-supplied expected history length (see
//! [`append_offer_with_expected_len`]), which defers real concurrency
//! control to the hosted platform's optimistic-locking primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::process::Transition;
use crate::types::TransactionRole;

// =============================================================================
// Offer
// =============================================================================

/// One offer or counter-offer record.
///
/// Appended exactly once per offer-bearing transition, never mutated in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// The offered amount in minor units (currency is the transaction's).
    #[serde(rename = "offerInSubunits")]
    pub offer_subunits: i64,
    /// Who made the offer. Required and explicit — never inferred.
    pub by: TransactionRole,
    /// The transition that carried the offer.
    #[ts(type = "string")]
    pub transition: Transition,
    /// When the offer was recorded. Absent on records written before
    /// timestamps were kept and on platform-authored metadata, which
    /// carries only the amount, role, and transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub at: Option<DateTime<Utc>>,
}

/// One entry of a transaction's transition history, as reported by the
/// hosted platform: which transition ran and which role took it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub transition: Transition,
    pub by: TransactionRole,
}

// =============================================================================
// Ledger Operations
// =============================================================================

/// Checks that the ledger mirrors the offer-bearing transitions of the
/// history 1:1: same count, same order, same transition, same role.
pub fn validate_against_history(offers: &[Offer], history: &[HistoryEntry]) -> CoreResult<()> {
    let offer_bearing: Vec<&HistoryEntry> = history
        .iter()
        .filter(|entry| entry.transition.is_offer_bearing())
        .collect();

    if offer_bearing.len() != offers.len() {
        return Err(CoreError::InvalidNegotiationHistory {
            reason: format!(
                "{} offer-bearing transitions but {} ledger entries",
                offer_bearing.len(),
                offers.len()
            ),
        });
    }

    for (index, (entry, offer)) in offer_bearing.iter().zip(offers).enumerate() {
        if entry.transition != offer.transition {
            return Err(CoreError::InvalidNegotiationHistory {
                reason: format!(
                    "entry {index}: history has {} but ledger has {}",
                    entry.transition, offer.transition
                ),
            });
        }
        if entry.by != offer.by {
            return Err(CoreError::InvalidNegotiationHistory {
                reason: format!(
                    "entry {index}: {} taken by {} but recorded by {}",
                    entry.transition, entry.by, offer.by
                ),
            });
        }
    }

    Ok(())
}

/// Appends a new offer to the ledger, or normalizes it when `new_offer`
/// is `None`.
///
/// `history` is the transaction's transition history *prior to* the
/// in-flight transition. Validation runs before any mutation; on drift the
/// existing ledger is left untouched and `InvalidNegotiationHistory` is
/// returned.
///
/// The new offer's role must match the acting role its transition implies;
/// a mismatch is the same class of drift.
pub fn append_offer(
    offers: &[Offer],
    history: &[HistoryEntry],
    new_offer: Option<Offer>,
) -> CoreResult<Vec<Offer>> {
    validate_against_history(offers, history)?;

    let mut updated = offers.to_vec();
    if let Some(offer) = new_offer {
        match offer.transition.offer_role() {
            Some(expected) if expected == offer.by => {}
            Some(expected) => {
                return Err(CoreError::InvalidNegotiationHistory {
                    reason: format!(
                        "{} must be made by {}, got {}",
                        offer.transition, expected, offer.by
                    ),
                });
            }
            None => {
                return Err(CoreError::InvalidNegotiationHistory {
                    reason: format!("{} does not carry an offer", offer.transition),
                });
            }
        }
        updated.push(offer);
    }

    Ok(updated)
}

/// Like [`append_offer`], but additionally requires the caller's view of
/// the full transition-history length as a version token.
///
/// A concurrent request that committed first grows the history, so the
/// slower request's token is stale and its write is rejected instead of
/// double-appending.
pub fn append_offer_with_expected_len(
    offers: &[Offer],
    history: &[HistoryEntry],
    new_offer: Option<Offer>,
    expected_history_len: usize,
) -> CoreResult<Vec<Offer>> {
    if history.len() != expected_history_len {
        return Err(CoreError::InvalidNegotiationHistory {
            reason: format!(
                "stale version token: expected history length {expected_history_len}, found {}",
                history.len()
            ),
        });
    }
    append_offer(offers, history, new_offer)
}

/// The most recent offer amount, for re-display or for reconstructing a
/// withdrawn/countered offer's value. `None` on an empty ledger.
pub fn latest_offer_subunits(offers: &[Offer]) -> Option<i64> {
    offers.last().map(|offer| offer.offer_subunits)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(subunits: i64, by: TransactionRole, transition: Transition) -> Offer {
        Offer {
            offer_subunits: subunits,
            by,
            transition,
            at: Some(Utc::now()),
        }
    }

    fn entry(transition: Transition, by: TransactionRole) -> HistoryEntry {
        HistoryEntry { transition, by }
    }

    #[test]
    fn test_matching_sequence_never_fails() {
        let mut offers: Vec<Offer> = vec![];
        let mut history: Vec<HistoryEntry> = vec![];

        let sequence = [
            (Transition::CustomerOffer, TransactionRole::Customer, 8_000),
            (Transition::ProviderCounterOffer, TransactionRole::Provider, 9_500),
            (Transition::CustomerCounterOffer, TransactionRole::Customer, 8_750),
            (Transition::ProviderCounterOffer, TransactionRole::Provider, 9_000),
        ];

        for (transition, by, amount) in sequence {
            offers = append_offer(&offers, &history, Some(offer(amount, by, transition))).unwrap();
            history.push(entry(transition, by));
        }

        assert_eq!(offers.len(), 4);
        assert_eq!(latest_offer_subunits(&offers), Some(9_000));
        validate_against_history(&offers, &history).unwrap();
    }

    #[test]
    fn test_non_offer_transitions_are_ignored_by_the_guard() {
        let offers = vec![offer(8_000, TransactionRole::Customer, Transition::CustomerOffer)];
        let history = vec![
            entry(Transition::CustomerOffer, TransactionRole::Customer),
            entry(Transition::AcceptOffer, TransactionRole::Provider),
        ];
        validate_against_history(&offers, &history).unwrap();
    }

    #[test]
    fn test_extra_ledger_entry_fails() {
        // Double-append: two ledger entries for one offer-bearing transition.
        let offers = vec![
            offer(8_000, TransactionRole::Customer, Transition::CustomerOffer),
            offer(8_000, TransactionRole::Customer, Transition::CustomerOffer),
        ];
        let history = vec![entry(Transition::CustomerOffer, TransactionRole::Customer)];

        let err = validate_against_history(&offers, &history).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNegotiationHistory { .. }));

        // And the append path refuses to build on a drifted ledger.
        assert!(append_offer(&offers, &history, None).is_err());
    }

    #[test]
    fn test_out_of_order_ledger_fails() {
        let offers = vec![
            offer(9_500, TransactionRole::Provider, Transition::ProviderCounterOffer),
            offer(8_000, TransactionRole::Customer, Transition::CustomerOffer),
        ];
        let history = vec![
            entry(Transition::CustomerOffer, TransactionRole::Customer),
            entry(Transition::ProviderCounterOffer, TransactionRole::Provider),
        ];
        assert!(validate_against_history(&offers, &history).is_err());
    }

    #[test]
    fn test_role_mismatch_fails() {
        // Ledger claims the provider made the initial customer offer.
        let offers = vec![offer(8_000, TransactionRole::Provider, Transition::CustomerOffer)];
        let history = vec![entry(Transition::CustomerOffer, TransactionRole::Customer)];
        assert!(validate_against_history(&offers, &history).is_err());
    }

    #[test]
    fn test_append_rejects_wrong_role_for_transition() {
        let err = append_offer(
            &[],
            &[],
            Some(offer(9_000, TransactionRole::Customer, Transition::ProviderCounterOffer)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNegotiationHistory { .. }));
    }

    #[test]
    fn test_append_rejects_non_offer_transition() {
        let err = append_offer(
            &[],
            &[],
            Some(offer(9_000, TransactionRole::Provider, Transition::AcceptOffer)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNegotiationHistory { .. }));
    }

    #[test]
    fn test_append_none_normalizes_without_growing() {
        let offers = vec![offer(8_000, TransactionRole::Customer, Transition::CustomerOffer)];
        let history = vec![entry(Transition::CustomerOffer, TransactionRole::Customer)];

        let updated = append_offer(&offers, &history, None).unwrap();
        assert_eq!(updated, offers);
    }

    #[test]
    fn test_version_token_rejects_stale_writer() {
        let offers = vec![offer(8_000, TransactionRole::Customer, Transition::CustomerOffer)];
        // The faster concurrent request already appended its counter-offer.
        let history = vec![
            entry(Transition::CustomerOffer, TransactionRole::Customer),
            entry(Transition::ProviderCounterOffer, TransactionRole::Provider),
        ];

        // Slow writer still believes the history has one entry.
        let err = append_offer_with_expected_len(
            &offers,
            &history,
            Some(offer(9_500, TransactionRole::Provider, Transition::ProviderCounterOffer)),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNegotiationHistory { .. }));
    }

    #[test]
    fn test_version_token_accepts_fresh_writer() {
        let history = vec![entry(Transition::CustomerOffer, TransactionRole::Customer)];
        let offers = vec![offer(8_000, TransactionRole::Customer, Transition::CustomerOffer)];

        let updated = append_offer_with_expected_len(
            &offers,
            &history,
            Some(offer(9_500, TransactionRole::Provider, Transition::ProviderCounterOffer)),
            1,
        )
        .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(latest_offer_subunits(&updated), Some(9_500));
    }

    #[test]
    fn test_latest_offer_on_empty_ledger() {
        assert_eq!(latest_offer_subunits(&[]), None);
    }

    #[test]
    fn test_platform_offer_record_without_timestamp_round_trips() {
        // The hosted platform writes only amount, role, and transition.
        let parsed: Offer = serde_json::from_str(
            r#"{"offerInSubunits":8000,"by":"customer","transition":"customer-offer"}"#,
        )
        .unwrap();
        assert_eq!(parsed.offer_subunits, 8_000);
        assert_eq!(parsed.by, TransactionRole::Customer);
        assert_eq!(parsed.transition, Transition::CustomerOffer);
        assert!(parsed.at.is_none());

        // Re-serializing keeps the record in the platform's shape.
        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("at").is_none());
        assert_eq!(json["offerInSubunits"], 8_000);

        // A timestamped record keeps its timestamp.
        let stamped = offer(9_000, TransactionRole::Provider, Transition::ProviderCounterOffer);
        let json = serde_json::to_value(&stamped).unwrap();
        assert!(json.get("at").is_some());
    }
}
