//! Reservation balance projection.
//!
//! The paid/balance/status fields on a reservation are a materialized
//! projection of its recorded payment facts. This module holds the pure
//! arithmetic; the database layer applies the result inside the same
//! transaction as the payment and ledger writes, under a row lock on the
//! reservation.

use serde::{Deserialize, Serialize};

use pinewood_shared::types::Cents;

use crate::ledger::error::LedgerError;

/// Reservation payment status derived from the paid/total ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationPaymentStatus {
    /// Nothing paid.
    Unpaid,
    /// Partially paid.
    Partial,
    /// Paid in full (or over).
    Paid,
}

/// How the projector treats a paid amount that would go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BalancePolicy {
    /// Floor paid at zero; over-refunds cannot produce credit balances.
    #[default]
    ClampToZero,
    /// Allow negative paid amounts (guest credit balances).
    AllowCredit,
}

/// The projected balance fields for a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationBalance {
    /// Reservation total in cents.
    pub total: Cents,
    /// Paid amount in cents.
    pub paid: Cents,
    /// Outstanding balance in cents, floored at zero.
    pub balance: Cents,
    /// Derived payment status.
    pub status: ReservationPaymentStatus,
}

/// Derives the payment status from total and paid amounts.
#[must_use]
pub fn derive_status(total: Cents, paid: Cents) -> ReservationPaymentStatus {
    if paid.into_inner() <= 0 {
        ReservationPaymentStatus::Unpaid
    } else if paid < total {
        ReservationPaymentStatus::Partial
    } else {
        ReservationPaymentStatus::Paid
    }
}

/// Applies a signed paid-amount delta and recomputes the projection.
///
/// A charge contributes a positive delta, a refund (or chargeback) a negative
/// one. The outstanding balance is always floored at zero; whether the *paid*
/// amount may go negative is governed by the policy.
#[must_use]
pub fn project(total: Cents, paid: Cents, delta: Cents, policy: BalancePolicy) -> ReservationBalance {
    let raw_paid = paid + delta;
    let paid = match policy {
        BalancePolicy::ClampToZero if raw_paid.is_negative() => Cents::ZERO,
        _ => raw_paid,
    };
    let balance = total.saturating_sub_floor_zero(paid);

    ReservationBalance {
        total,
        paid,
        balance,
        status: derive_status(total, paid),
    }
}

/// Pre-write refund guard: the requested refund may not exceed the recorded
/// paid amount.
///
/// # Errors
///
/// Returns `InsufficientFundsForRefund` when the request exceeds what was
/// recorded as paid.
pub fn validate_refundable(paid: Cents, requested: Cents) -> Result<(), LedgerError> {
    if requested > paid {
        return Err(LedgerError::InsufficientFundsForRefund {
            requested,
            available: paid,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_charge_to_paid_in_full() {
        // Reservation total $500; charge of $500 succeeds.
        let b = project(
            Cents::new(50_000),
            Cents::ZERO,
            Cents::new(50_000),
            BalancePolicy::ClampToZero,
        );
        assert_eq!(b.paid, Cents::new(50_000));
        assert_eq!(b.balance, Cents::ZERO);
        assert_eq!(b.status, ReservationPaymentStatus::Paid);
    }

    #[test]
    fn test_cumulative_refund_scenario() {
        // $500 paid in full, then refunds of $150 and $150 more (cumulative
        // $300 reported by the gateway as two events).
        let total = Cents::new(50_000);

        let b = project(total, Cents::new(50_000), Cents::new(-15_000), BalancePolicy::ClampToZero);
        assert_eq!(b.paid, Cents::new(35_000));
        assert_eq!(b.balance, Cents::new(15_000));
        assert_eq!(b.status, ReservationPaymentStatus::Partial);

        let b = project(total, b.paid, Cents::new(-15_000), BalancePolicy::ClampToZero);
        assert_eq!(b.paid, Cents::new(20_000));
        assert_eq!(b.balance, Cents::new(30_000));
        assert_eq!(b.status, ReservationPaymentStatus::Partial);
    }

    #[test]
    fn test_out_of_order_refunds_commute() {
        // $100 charge, refunds of $30 and $20 applied in either order land on
        // the same projection.
        let total = Cents::new(10_000);
        let paid = Cents::new(10_000);

        let a1 = project(total, paid, Cents::new(-2000), BalancePolicy::ClampToZero);
        let a2 = project(total, a1.paid, Cents::new(-3000), BalancePolicy::ClampToZero);

        let b1 = project(total, paid, Cents::new(-3000), BalancePolicy::ClampToZero);
        let b2 = project(total, b1.paid, Cents::new(-2000), BalancePolicy::ClampToZero);

        assert_eq!(a2, b2);
        assert_eq!(a2.paid, Cents::new(5000));
        assert_eq!(a2.balance, Cents::new(5000));
        assert_eq!(a2.status, ReservationPaymentStatus::Partial);
    }

    #[rstest]
    #[case(0, ReservationPaymentStatus::Unpaid)]
    #[case(1, ReservationPaymentStatus::Partial)]
    #[case(49_999, ReservationPaymentStatus::Partial)]
    #[case(50_000, ReservationPaymentStatus::Paid)]
    #[case(60_000, ReservationPaymentStatus::Paid)]
    fn test_status_thresholds(#[case] paid: i64, #[case] expected: ReservationPaymentStatus) {
        assert_eq!(derive_status(Cents::new(50_000), Cents::new(paid)), expected);
    }

    #[test]
    fn test_clamp_policy_floors_paid() {
        let b = project(
            Cents::new(10_000),
            Cents::new(1000),
            Cents::new(-5000),
            BalancePolicy::ClampToZero,
        );
        assert_eq!(b.paid, Cents::ZERO);
        assert_eq!(b.balance, Cents::new(10_000));
        assert_eq!(b.status, ReservationPaymentStatus::Unpaid);
    }

    #[test]
    fn test_credit_policy_allows_negative_paid() {
        let b = project(
            Cents::new(10_000),
            Cents::new(1000),
            Cents::new(-5000),
            BalancePolicy::AllowCredit,
        );
        assert_eq!(b.paid, Cents::new(-4000));
        assert_eq!(b.balance, Cents::new(10_000));
        assert_eq!(b.status, ReservationPaymentStatus::Unpaid);
    }

    #[test]
    fn test_refund_guard() {
        assert!(validate_refundable(Cents::new(5000), Cents::new(5000)).is_ok());
        assert!(validate_refundable(Cents::new(5000), Cents::new(4999)).is_ok());
        assert!(matches!(
            validate_refundable(Cents::new(5000), Cents::new(5001)),
            Err(LedgerError::InsufficientFundsForRefund { requested, available })
                if requested == Cents::new(5001) && available == Cents::new(5000)
        ));
    }

    proptest! {
        /// **Property: balance is never negative**
        #[test]
        fn prop_balance_never_negative(
            total in 0i64..10_000_000,
            paid in 0i64..10_000_000,
            delta in -10_000_000i64..10_000_000,
        ) {
            let b = project(
                Cents::new(total),
                Cents::new(paid),
                Cents::new(delta),
                BalancePolicy::ClampToZero,
            );
            prop_assert!(!b.balance.is_negative());
        }

        /// **Property: clamp policy never yields negative paid**
        #[test]
        fn prop_clamped_paid_never_negative(
            total in 0i64..10_000_000,
            paid in 0i64..10_000_000,
            delta in -10_000_000i64..10_000_000,
        ) {
            let b = project(
                Cents::new(total),
                Cents::new(paid),
                Cents::new(delta),
                BalancePolicy::ClampToZero,
            );
            prop_assert!(!b.paid.is_negative());
        }

        /// **Property: status matches the paid/total ratio**
        #[test]
        fn prop_status_matches_ratio(
            total in 1i64..10_000_000,
            paid in 0i64..10_000_000,
        ) {
            let status = derive_status(Cents::new(total), Cents::new(paid));
            if paid == 0 {
                prop_assert_eq!(status, ReservationPaymentStatus::Unpaid);
            } else if paid < total {
                prop_assert_eq!(status, ReservationPaymentStatus::Partial);
            } else {
                prop_assert_eq!(status, ReservationPaymentStatus::Paid);
            }
        }

        /// **Property: paid + balance >= total under the clamp policy**
        ///
        /// The floor can only ever round the balance *up* to zero, never
        /// under-report what is owed.
        #[test]
        fn prop_balance_covers_remainder(
            total in 0i64..10_000_000,
            paid in 0i64..10_000_000,
        ) {
            let b = project(Cents::new(total), Cents::ZERO, Cents::new(paid), BalancePolicy::ClampToZero);
            prop_assert!(b.paid + b.balance >= b.total);
        }
    }
}
