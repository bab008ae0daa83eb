//! Refund and dispute delta computation.
//!
//! Gateways commonly report a *cumulative* refunded amount per charge. The
//! only safe way to apply such an event is the delta against what has already
//! been recorded; reapplying the cumulative value double-counts on redelivery,
//! and applying "the latest event" loses refunds on out-of-order delivery.

use pinewood_shared::types::Cents;

/// Delta to apply for a cumulative refund report.
///
/// Returns how many cents of refund are not yet recorded. Never negative: a
/// stale cumulative report (lower than what is recorded) applies nothing.
#[must_use]
pub fn refund_delta(cumulative_reported: Cents, recorded_total: Cents) -> Cents {
    cumulative_reported.saturating_sub_floor_zero(recorded_total)
}

/// Signed delta to apply for a dispute amount report.
///
/// Positive when the dispute grew (additional funds withheld), negative when
/// it shrank or was reversed (funds restored). A closure in the cardholder's
/// favor reports the full recorded total as reversed.
#[must_use]
pub fn dispute_delta(reported_amount: Cents, recorded_total: Cents) -> Cents {
    reported_amount - recorded_total
}
