//! Property tests for posting-group validation.

use chrono::Utc;
use proptest::prelude::*;

use pinewood_shared::types::Cents;

use super::error::LedgerError;
use super::posting::{PostingGroup, PostingTotals};
use super::types::{AccountCode, EntryDirection, PostingLine};

/// Strategy for generating positive cent amounts.
fn amount_strategy() -> impl Strategy<Value = Cents> {
    (1i64..10_000_000i64).prop_map(Cents::new)
}

/// Strategy for generating account codes.
fn account_strategy() -> impl Strategy<Value = AccountCode> {
    prop_oneof![
        Just(AccountCode::CashOnHand),
        Just(AccountCode::BankClearing),
        Just(AccountCode::BankOperating),
        Just(AccountCode::GuestRevenue),
        Just(AccountCode::PlatformFeeRevenue),
        Just(AccountCode::ProcessingFees),
        Just(AccountCode::Chargebacks),
    ]
}

/// Strategy for a random mirrored (balanced) group: every generated debit
/// amount is paired with an equal credit.
fn balanced_lines_strategy() -> impl Strategy<Value = Vec<PostingLine>> {
    prop::collection::vec((account_strategy(), account_strategy(), amount_strategy()), 1..8)
        .prop_map(|pairs| {
            let mut lines = Vec::with_capacity(pairs.len() * 2);
            for (debit_account, credit_account, amount) in pairs {
                lines.push(PostingLine::debit(debit_account, amount));
                lines.push(PostingLine::credit(credit_account, amount));
            }
            lines
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// **Property: every constructed group is balanced**
    ///
    /// *For any* mirrored set of debit/credit lines, construction succeeds and
    /// `sum(debits) == sum(credits)` holds on the resulting group.
    #[test]
    fn prop_constructed_groups_balance(lines in balanced_lines_strategy()) {
        let group = PostingGroup::new("fact:prop", Utc::now(), lines).unwrap();
        let totals = group.totals();
        prop_assert!(totals.is_balanced());
        prop_assert_eq!(totals.debits, totals.credits);
    }

    /// **Property: perturbing any line amount breaks construction**
    ///
    /// *For any* balanced group and any strictly positive skew added to one
    /// side, construction SHALL fail with `UnbalancedPosting`.
    #[test]
    fn prop_skewed_groups_rejected(
        lines in balanced_lines_strategy(),
        skew in 1i64..1_000_000i64,
        account in account_strategy(),
    ) {
        let mut lines = lines;
        lines.push(PostingLine::debit(account, Cents::new(skew)));

        let result = PostingGroup::new("fact:prop", Utc::now(), lines);
        prop_assert!(
            matches!(result, Err(LedgerError::UnbalancedPosting { .. })),
            "expected UnbalancedPosting error"
        );
    }

    /// **Property: totals are direction-additive**
    ///
    /// *For any* set of lines, the debit total is exactly the sum of debit
    /// line amounts and likewise for credits.
    #[test]
    fn prop_totals_additive(lines in balanced_lines_strategy()) {
        let expected_debits: Cents = lines
            .iter()
            .filter(|l| l.direction == EntryDirection::Debit)
            .map(|l| l.amount)
            .sum();
        let expected_credits: Cents = lines
            .iter()
            .filter(|l| l.direction == EntryDirection::Credit)
            .map(|l| l.amount)
            .sum();

        let totals = PostingTotals::of(&lines);
        prop_assert_eq!(totals.debits, expected_debits);
        prop_assert_eq!(totals.credits, expected_credits);
    }

    /// **Property: non-positive amounts never construct**
    #[test]
    fn prop_non_positive_amounts_rejected(
        amount in -1_000_000i64..=0i64,
        account in account_strategy(),
    ) {
        let lines = vec![
            PostingLine::debit(account, Cents::new(amount)),
            PostingLine::credit(account, Cents::new(amount)),
        ];
        let result = PostingGroup::new("fact:prop", Utc::now(), lines);
        prop_assert!(matches!(
            result,
            Err(LedgerError::ZeroAmount | LedgerError::NegativeAmount)
        ));
    }
}
