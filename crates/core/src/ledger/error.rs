//! Ledger error types for validation and posting-time errors.
//!
//! This module defines all errors that can occur during ledger operations,
//! including posting-group validation, GL period enforcement, and the refund
//! pre-write guard.

use chrono::NaiveDate;
use thiserror::Error;

use pinewood_shared::types::Cents;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Posting Group Validation ==========
    /// Posting group does not sum to zero net.
    #[error("Posting group is not balanced. Debits: {debits}, Credits: {credits}")]
    UnbalancedPosting {
        /// Total debit amount in cents.
        debits: Cents,
        /// Total credit amount in cents.
        credits: Cents,
    },

    /// Posting group must have at least 2 lines.
    #[error("Posting group must have at least 2 lines")]
    InsufficientLines,

    /// Line amount cannot be zero.
    #[error("Posting line amount cannot be zero")]
    ZeroAmount,

    /// Line amount cannot be negative.
    #[error("Posting line amount cannot be negative")]
    NegativeAmount,

    /// Dedupe key must be non-empty.
    #[error("Posting group dedupe key must be non-empty")]
    EmptyDedupeKey,

    /// Unknown account code string.
    #[error("Unknown account code: {0}")]
    UnknownAccountCode(String),

    // ========== GL Period Errors ==========
    /// The target date has no GL period; treated as not open for posting.
    #[error("No GL period covers date {0}")]
    NoPeriodForDate(NaiveDate),

    /// GL period is closed, no posting allowed.
    #[error("GL period covering {0} is closed")]
    PeriodClosed(NaiveDate),

    /// GL period is locked, no posting or changes allowed.
    #[error("GL period covering {0} is locked")]
    PeriodLocked(NaiveDate),

    // ========== Refund Guard ==========
    /// Refund amount exceeds the recorded paid amount; rejected before writes.
    #[error("Refund of {requested} exceeds recorded paid amount {available}")]
    InsufficientFundsForRefund {
        /// Requested refund amount in cents.
        requested: Cents,
        /// Recorded paid amount in cents.
        available: Cents,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnbalancedPosting { .. } => "UNBALANCED_POSTING",
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::EmptyDedupeKey => "EMPTY_DEDUPE_KEY",
            Self::UnknownAccountCode(_) => "UNKNOWN_ACCOUNT_CODE",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::PeriodLocked(_) => "PERIOD_LOCKED",
            Self::InsufficientFundsForRefund { .. } => "INSUFFICIENT_FUNDS_FOR_REFUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - programming/config defects upstream
            Self::UnbalancedPosting { .. }
            | Self::InsufficientLines
            | Self::ZeroAmount
            | Self::NegativeAmount
            | Self::EmptyDedupeKey
            | Self::UnknownAccountCode(_) => 400,

            // 409 Conflict - period gating requires a manual override workflow
            Self::NoPeriodForDate(_) | Self::PeriodClosed(_) | Self::PeriodLocked(_) => 409,

            // 422 Unprocessable - business rule rejection
            Self::InsufficientFundsForRefund { .. } => 422,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// None of the ledger errors are: an unbalanced group or a closed period
    /// will not heal on redelivery.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}
