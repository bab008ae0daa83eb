//! Payment lifecycle rules and gateway event normalization.
//!
//! Every externally sourced payment event is normalized into one or more
//! *facts* that carry their own identity (charge id, refund id, dispute id).
//! Arrival order never matters: the processor records each fact exactly once
//! and derives totals from the recorded facts rather than from whichever
//! event arrived last.

pub mod event;
pub mod refund;
pub mod state;

pub use event::{GatewayEventEnvelope, NormalizeError, NormalizedEvent, PaymentFact};
pub use refund::{dispute_delta, refund_delta};
pub use state::PaymentState;

use serde::{Deserialize, Serialize};

/// Direction of a payment fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentDirection {
    /// Money in: guest charge, POS tender, seasonal billing.
    Charge,
    /// Money out: refund or chargeback.
    Refund,
}

impl PaymentDirection {
    /// Sign applied to the paid-amount projection delta.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Charge => 1,
            Self::Refund => -1,
        }
    }
}

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the gateway.
    Card,
    /// Cash at the property.
    Cash,
    /// Digital wallet.
    Wallet,
    /// Paper check.
    Check,
    /// Point-of-sale terminal tender.
    PosTerminal,
}

impl PaymentMethod {
    /// Returns true if this method settles through the gateway (and therefore
    /// flows through the clearing account rather than cash on hand).
    #[must_use]
    pub const fn settles_via_gateway(self) -> bool {
        matches!(self, Self::Card | Self::Wallet | Self::PosTerminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(PaymentDirection::Charge.sign(), 1);
        assert_eq!(PaymentDirection::Refund.sign(), -1);
    }

    #[test]
    fn test_method_settlement_routing() {
        assert!(PaymentMethod::Card.settles_via_gateway());
        assert!(PaymentMethod::Wallet.settles_via_gateway());
        assert!(PaymentMethod::PosTerminal.settles_via_gateway());
        assert!(!PaymentMethod::Cash.settles_via_gateway());
        assert!(!PaymentMethod::Check.settles_via_gateway());
    }
}
