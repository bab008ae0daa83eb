//! Balanced posting groups.
//!
//! A `PostingGroup` is validated at construction: once a value of this type
//! exists, its lines are non-empty, strictly positive, and sum to zero net.
//! The database write path consumes only validated groups, so an unbalanced
//! set of lines can never reach the ledger table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pinewood_shared::types::{Cents, ReservationId};

use super::error::LedgerError;
use super::types::{EntryDirection, PostingLine};

/// Totals of a posting group, split by direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingTotals {
    /// Total debit amount in cents.
    pub debits: Cents,
    /// Total credit amount in cents.
    pub credits: Cents,
}

impl PostingTotals {
    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debits == self.credits
    }

    /// Computes totals over a set of lines.
    #[must_use]
    pub fn of(lines: &[PostingLine]) -> Self {
        let mut debits = Cents::ZERO;
        let mut credits = Cents::ZERO;
        for line in lines {
            match line.direction {
                EntryDirection::Debit => debits = debits + line.amount,
                EntryDirection::Credit => credits = credits + line.amount,
            }
        }
        Self { debits, credits }
    }
}

/// A validated, balanced group of ledger lines.
///
/// The dedupe key identifies the financial fact this group records; together
/// with the tenant id (applied at the write path) it prevents the same fact
/// from being posted twice. Only constructible through `new`, so an
/// unbalanced group cannot exist.
#[derive(Debug, Clone, Serialize)]
pub struct PostingGroup {
    /// Tenant-scoped deduplication key.
    pub dedupe_key: String,
    /// When the underlying financial fact occurred.
    pub occurred_at: DateTime<Utc>,
    /// Reservation the group relates to, if any.
    pub reservation_id: Option<ReservationId>,
    /// External reference (charge id, refund id, payout id), if any.
    pub reference_id: Option<String>,
    lines: Vec<PostingLine>,
}

impl PostingGroup {
    /// Creates a validated posting group.
    ///
    /// # Errors
    ///
    /// - `EmptyDedupeKey` if the dedupe key is blank
    /// - `InsufficientLines` if fewer than 2 lines are given
    /// - `ZeroAmount` / `NegativeAmount` for non-positive line amounts
    /// - `UnbalancedPosting` if debit and credit totals differ
    pub fn new(
        dedupe_key: impl Into<String>,
        occurred_at: DateTime<Utc>,
        lines: Vec<PostingLine>,
    ) -> Result<Self, LedgerError> {
        let dedupe_key = dedupe_key.into();
        if dedupe_key.trim().is_empty() {
            return Err(LedgerError::EmptyDedupeKey);
        }

        if lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }

        for line in &lines {
            if line.amount.is_zero() {
                return Err(LedgerError::ZeroAmount);
            }
            if line.amount.is_negative() {
                return Err(LedgerError::NegativeAmount);
            }
        }

        let totals = PostingTotals::of(&lines);
        if !totals.is_balanced() {
            return Err(LedgerError::UnbalancedPosting {
                debits: totals.debits,
                credits: totals.credits,
            });
        }

        Ok(Self {
            dedupe_key,
            occurred_at,
            reservation_id: None,
            reference_id: None,
            lines,
        })
    }

    /// Tags the group with a reservation id.
    #[must_use]
    pub fn with_reservation(mut self, reservation_id: ReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    /// Tags the group with an external reference id.
    #[must_use]
    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// The validated lines.
    #[must_use]
    pub fn lines(&self) -> &[PostingLine] {
        &self.lines
    }

    /// Totals by direction (always balanced for a constructed group).
    #[must_use]
    pub fn totals(&self) -> PostingTotals {
        PostingTotals::of(&self.lines)
    }
}
