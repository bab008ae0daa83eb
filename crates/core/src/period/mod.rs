//! GL period guard rules.
//!
//! Periods are owned by the external accounting close workflow; the financial
//! core only ever reads them. The guard is the single enforcement point the
//! posting path consults before every ledger write.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pinewood_shared::types::{GlPeriodId, TenantId};

use crate::ledger::error::LedgerError;

/// Status of a GL period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period is open for posting.
    Open,
    /// Period is closed, no new postings allowed.
    Closed,
    /// Period is locked, no postings or changes allowed.
    Locked,
}

impl PeriodStatus {
    /// Returns true if the period allows posting.
    #[must_use]
    pub const fn allows_posting(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A GL period for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlPeriod {
    /// Unique identifier.
    pub id: GlPeriodId,
    /// Tenant this period belongs to.
    pub tenant_id: TenantId,
    /// First date of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last date of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
}

impl GlPeriod {
    /// Returns true if postings may target this period.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.allows_posting()
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Returns true if the looked-up period (if any) is open for posting.
///
/// A date with no covering period is not open: money may only target dates
/// the close workflow has explicitly provisioned.
#[must_use]
pub fn is_open(period: Option<&GlPeriod>) -> bool {
    period.is_some_and(GlPeriod::is_open)
}

/// Asserts that the looked-up period allows posting on `date`.
///
/// # Errors
///
/// - `NoPeriodForDate` if no period covers the date
/// - `PeriodClosed` if the covering period is closed
/// - `PeriodLocked` if the covering period is locked
pub fn assert_open(period: Option<&GlPeriod>, date: NaiveDate) -> Result<GlPeriodId, LedgerError> {
    match period {
        None => Err(LedgerError::NoPeriodForDate(date)),
        Some(p) => match p.status {
            PeriodStatus::Open => Ok(p.id),
            PeriodStatus::Closed => Err(LedgerError::PeriodClosed(date)),
            PeriodStatus::Locked => Err(LedgerError::PeriodLocked(date)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn period(status: PeriodStatus) -> GlPeriod {
        GlPeriod {
            id: GlPeriodId::new(),
            tenant_id: TenantId::new(),
            start_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            status,
        }
    }

    #[test]
    fn test_open_period_allows_posting() {
        let p = period(PeriodStatus::Open);
        let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert!(is_open(Some(&p)));
        assert_eq!(assert_open(Some(&p), date).unwrap(), p.id);
    }

    #[test]
    fn test_closed_period_rejects_posting() {
        let p = period(PeriodStatus::Closed);
        let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert!(!is_open(Some(&p)));
        assert!(matches!(
            assert_open(Some(&p), date),
            Err(LedgerError::PeriodClosed(d)) if d == date
        ));
    }

    #[test]
    fn test_locked_period_rejects_posting() {
        let p = period(PeriodStatus::Locked);
        let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert!(matches!(
            assert_open(Some(&p), date),
            Err(LedgerError::PeriodLocked(_))
        ));
    }

    #[test]
    fn test_missing_period_rejects_posting() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert!(!is_open(None));
        assert!(matches!(
            assert_open(None, date),
            Err(LedgerError::NoPeriodForDate(d)) if d == date
        ));
    }

    #[test]
    fn test_contains_date() {
        let p = period(PeriodStatus::Open);
        assert!(p.contains_date(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()));
        assert!(p.contains_date(NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()));
        assert!(!p.contains_date(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()));
        assert!(!p.contains_date(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()));
    }

    /// Strategy for generating period statuses.
    fn status_strategy() -> impl Strategy<Value = PeriodStatus> {
        prop_oneof![
            Just(PeriodStatus::Open),
            Just(PeriodStatus::Closed),
            Just(PeriodStatus::Locked),
        ]
    }

    proptest! {
        /// **Property: the guard and the quick check agree**
        ///
        /// *For any* period status, `assert_open` succeeds exactly when
        /// `is_open` reports true.
        #[test]
        fn prop_guard_consistent_with_is_open(status in status_strategy()) {
            let p = period(status);
            let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
            let asserted = assert_open(Some(&p), date).is_ok();
            prop_assert_eq!(asserted, is_open(Some(&p)));
        }

        /// **Property: only Open permits posting**
        #[test]
        fn prop_only_open_permits_posting(status in status_strategy()) {
            let p = period(status);
            let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
            match status {
                PeriodStatus::Open => prop_assert!(assert_open(Some(&p), date).is_ok()),
                PeriodStatus::Closed => prop_assert!(matches!(
                    assert_open(Some(&p), date),
                    Err(LedgerError::PeriodClosed(_))
                )),
                PeriodStatus::Locked => prop_assert!(matches!(
                    assert_open(Some(&p), date),
                    Err(LedgerError::PeriodLocked(_))
                )),
            }
        }
    }
}
