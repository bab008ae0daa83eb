//! Payment intent state machine.
//!
//! `pending -> authorized -> succeeded | failed`, with refund and dispute
//! tracks branching off `succeeded`. Transitions are validated so that a
//! replayed or out-of-order event can never move a payment backwards.

use serde::{Deserialize, Serialize};

use pinewood_shared::types::Cents;

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Intent created, no money movement yet.
    Pending,
    /// Funds authorized (requires capture); no paid-amount effect.
    Authorized,
    /// Charge succeeded; funds captured.
    Succeeded,
    /// Part of the charge has been refunded.
    PartiallyRefunded,
    /// The full charge has been refunded.
    Refunded,
    /// A dispute is open against the charge.
    Disputed,
    /// The dispute was lost; funds were clawed back.
    ChargedBack,
    /// The charge failed.
    Failed,
}

impl PaymentState {
    /// Returns true if the transition is a legal forward move.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Authorized | Self::Succeeded | Self::Failed)
                | (Self::Authorized, Self::Succeeded | Self::Failed)
                | (
                    Self::Succeeded,
                    Self::PartiallyRefunded | Self::Refunded | Self::Disputed
                )
                | (
                    Self::PartiallyRefunded,
                    Self::PartiallyRefunded | Self::Refunded | Self::Disputed
                )
                | (Self::Disputed, Self::Succeeded | Self::ChargedBack)
        )
    }

    /// Returns true if the payment has captured funds that can be refunded
    /// or disputed.
    #[must_use]
    pub const fn has_captured_funds(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::PartiallyRefunded | Self::Disputed
        )
    }

    /// State after a refund, based on the refunded running total.
    #[must_use]
    pub fn after_refund(charge_amount: Cents, refunded_total: Cents) -> Self {
        if refunded_total >= charge_amount {
            Self::Refunded
        } else {
            Self::PartiallyRefunded
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::Succeeded => "succeeded",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Disputed => "disputed",
            Self::ChargedBack => "charged_back",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
