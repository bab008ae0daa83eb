//! Settlement line matching and net-cash orientation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pinewood_shared::types::{Cents, PaymentId};

use crate::ledger::types::{AccountCode, PostingLine};
use crate::payment::PaymentDirection;

use super::gateway::{SettlementLine, SettlementLineType};

/// The internal payment record a settlement line is matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalPaymentRecord {
    /// Internal payment id.
    pub payment_id: PaymentId,
    /// Gateway reference (charge/refund/dispute id) the record carries.
    pub gateway_reference_id: String,
    /// Recorded amount in cents (always positive; direction gives the sign).
    pub amount: Cents,
    /// Charge or refund.
    pub direction: PaymentDirection,
}

impl InternalPaymentRecord {
    /// Signed cents as they should appear in a settlement feed.
    #[must_use]
    pub const fn signed_amount(&self) -> Cents {
        Cents::new(self.amount.into_inner() * self.direction.sign())
    }
}

/// The outcome of matching one settlement line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedLine {
    /// The settlement line.
    pub line: SettlementLine,
    /// The matched internal payment, when one was found.
    pub payment_id: Option<PaymentId>,
    /// True when the line is accounted for (matched to a payment, or a pure
    /// gateway-side line such as a fee that has no internal counterpart).
    pub matched: bool,
    /// Cents of disagreement between the settlement line and the internal
    /// record. Unmatched money lines carry their full net as drift.
    pub drift: Cents,
}

/// Matches settlement lines against an index of internal payments keyed by
/// gateway reference id.
///
/// - Charge/Refund/Chargeback lines match by `source_ref`; a gross amount
///   that disagrees with the internal record surfaces as drift on a matched
///   line.
/// - Fee and Adjustment lines have no internal counterpart; they are
///   considered accounted for and contribute no drift (fees become explicit
///   reconciling postings instead).
#[must_use]
pub fn match_lines(
    lines: &[SettlementLine],
    index: &HashMap<String, InternalPaymentRecord>,
) -> Vec<MatchedLine> {
    lines
        .iter()
        .map(|line| match line.line_type {
            SettlementLineType::Fee | SettlementLineType::Adjustment => MatchedLine {
                line: line.clone(),
                payment_id: None,
                matched: true,
                drift: Cents::ZERO,
            },
            SettlementLineType::Charge
            | SettlementLineType::Refund
            | SettlementLineType::Chargeback => {
                let record = line.source_ref.as_deref().and_then(|r| index.get(r));
                match record {
                    Some(record) => MatchedLine {
                        line: line.clone(),
                        payment_id: Some(record.payment_id),
                        matched: true,
                        drift: line.gross - record.signed_amount(),
                    },
                    None => MatchedLine {
                        line: line.clone(),
                        payment_id: None,
                        matched: false,
                        drift: line.net,
                    },
                }
            }
        })
        .collect()
}

/// The balanced posting lines for a payout's net cash movement.
///
/// A positive net payout moves money from the clearing account into the
/// operating bank account. A negative net payout (dispute-heavy period) pulls
/// money back out of the bank: the same two accounts, opposite sides.
/// A zero net moves nothing and produces no lines.
#[must_use]
pub fn net_cash_lines(net: Cents) -> Vec<PostingLine> {
    if net.is_zero() {
        return Vec::new();
    }

    let amount = net.abs();
    if net.is_positive() {
        vec![
            PostingLine::debit(AccountCode::BankOperating, amount),
            PostingLine::credit(AccountCode::BankClearing, amount),
        ]
    } else {
        vec![
            PostingLine::debit(AccountCode::BankClearing, amount),
            PostingLine::credit(AccountCode::BankOperating, amount),
        ]
    }
}

/// Total gateway fees across a payout's lines.
#[must_use]
pub fn total_fees(lines: &[SettlementLine]) -> Cents {
    lines.iter().map(|l| l.fee).sum()
}

/// Net cash movement across a payout's lines.
#[must_use]
pub fn total_net(lines: &[SettlementLine]) -> Cents {
    lines.iter().map(|l| l.net).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinewood_shared::types::Currency;
    use proptest::prelude::*;

    use crate::ledger::posting::PostingGroup;
    use crate::ledger::types::EntryDirection;

    fn settlement_line(
        id: &str,
        line_type: SettlementLineType,
        source_ref: Option<&str>,
        gross: i64,
        fee: i64,
    ) -> SettlementLine {
        SettlementLine {
            balance_transaction_id: id.to_string(),
            line_type,
            source_ref: source_ref.map(ToString::to_string),
            gross: Cents::new(gross),
            fee: Cents::new(fee),
            net: Cents::new(gross - fee),
            currency: Currency::Usd,
        }
    }

    fn record(reference: &str, amount: i64, direction: PaymentDirection) -> InternalPaymentRecord {
        InternalPaymentRecord {
            payment_id: PaymentId::new(),
            gateway_reference_id: reference.to_string(),
            amount: Cents::new(amount),
            direction,
        }
    }

    #[test]
    fn test_charge_matches_by_reference() {
        let lines = vec![settlement_line(
            "txn_1",
            SettlementLineType::Charge,
            Some("ch_1"),
            50_000,
            1480,
        )];
        let mut index = HashMap::new();
        index.insert(
            "ch_1".to_string(),
            record("ch_1", 50_000, PaymentDirection::Charge),
        );

        let matched = match_lines(&lines, &index);
        assert!(matched[0].matched);
        assert!(matched[0].payment_id.is_some());
        assert_eq!(matched[0].drift, Cents::ZERO);
    }

    #[test]
    fn test_refund_matches_with_negative_gross() {
        let lines = vec![settlement_line(
            "txn_2",
            SettlementLineType::Refund,
            Some("re_1"),
            -3000,
            0,
        )];
        let mut index = HashMap::new();
        index.insert(
            "re_1".to_string(),
            record("re_1", 3000, PaymentDirection::Refund),
        );

        let matched = match_lines(&lines, &index);
        assert!(matched[0].matched);
        assert_eq!(matched[0].drift, Cents::ZERO);
    }

    #[test]
    fn test_unmatched_line_is_drift() {
        let lines = vec![settlement_line(
            "txn_3",
            SettlementLineType::Charge,
            Some("ch_unknown"),
            10_000,
            300,
        )];
        let matched = match_lines(&lines, &HashMap::new());
        assert!(!matched[0].matched);
        assert_eq!(matched[0].drift, Cents::new(9700));
    }

    #[test]
    fn test_amount_disagreement_surfaces_as_drift() {
        let lines = vec![settlement_line(
            "txn_4",
            SettlementLineType::Charge,
            Some("ch_1"),
            50_100,
            0,
        )];
        let mut index = HashMap::new();
        index.insert(
            "ch_1".to_string(),
            record("ch_1", 50_000, PaymentDirection::Charge),
        );

        let matched = match_lines(&lines, &index);
        assert!(matched[0].matched);
        assert_eq!(matched[0].drift, Cents::new(100));
    }

    #[test]
    fn test_fee_lines_are_accounted_for() {
        let lines = vec![settlement_line(
            "txn_5",
            SettlementLineType::Fee,
            None,
            -1480,
            0,
        )];
        let matched = match_lines(&lines, &HashMap::new());
        assert!(matched[0].matched);
        assert_eq!(matched[0].drift, Cents::ZERO);
    }

    #[test]
    fn test_positive_net_orientation() {
        let lines = net_cash_lines(Cents::new(48_520));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account, AccountCode::BankOperating);
        assert_eq!(lines[0].direction, EntryDirection::Debit);
        assert_eq!(lines[1].account, AccountCode::BankClearing);
        assert_eq!(lines[1].direction, EntryDirection::Credit);
        assert_eq!(lines[0].amount, Cents::new(48_520));
    }

    #[test]
    fn test_negative_net_orientation_flips_sides() {
        // Net payout of -$42.00: credit the bank, debit the clearing account.
        let lines = net_cash_lines(Cents::new(-4200));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account, AccountCode::BankClearing);
        assert_eq!(lines[0].direction, EntryDirection::Debit);
        assert_eq!(lines[1].account, AccountCode::BankOperating);
        assert_eq!(lines[1].direction, EntryDirection::Credit);
        assert_eq!(lines[1].amount, Cents::new(4200));
    }

    #[test]
    fn test_zero_net_produces_no_lines() {
        assert!(net_cash_lines(Cents::ZERO).is_empty());
    }

    #[test]
    fn test_totals() {
        let lines = vec![
            settlement_line("txn_1", SettlementLineType::Charge, Some("ch_1"), 50_000, 1480),
            settlement_line("txn_2", SettlementLineType::Refund, Some("re_1"), -3000, 0),
        ];
        assert_eq!(total_fees(&lines), Cents::new(1480));
        assert_eq!(total_net(&lines), Cents::new(45_520));
    }

    proptest! {
        /// **Property: non-zero nets always form a balanced two-line group**
        #[test]
        fn prop_net_lines_balance(net in -10_000_000i64..10_000_000) {
            prop_assume!(net != 0);
            let lines = net_cash_lines(Cents::new(net));
            let group = PostingGroup::new("payout:prop:net", chrono::Utc::now(), lines).unwrap();
            prop_assert!(group.totals().is_balanced());
        }

        /// **Property: matching is exhaustive**
        ///
        /// Every input line appears in the output exactly once, either
        /// matched or flagged.
        #[test]
        fn prop_matching_exhaustive(count in 0usize..20) {
            let lines: Vec<SettlementLine> = (0..count)
                .map(|i| settlement_line(
                    &format!("txn_{i}"),
                    SettlementLineType::Charge,
                    Some(&format!("ch_{i}")),
                    1000,
                    30,
                ))
                .collect();
            let matched = match_lines(&lines, &HashMap::new());
            prop_assert_eq!(matched.len(), lines.len());
            for m in &matched {
                prop_assert!(!m.matched);
            }
        }
    }
}
