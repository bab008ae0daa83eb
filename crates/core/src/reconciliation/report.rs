//! Reconciliation reports and drift alerting.

use serde::{Deserialize, Serialize};

use pinewood_shared::types::{Cents, TenantId};

/// Severity of a drift alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    /// Drift at or above the configured threshold.
    Warning,
    /// Drift at or above ten times the configured threshold.
    Critical,
}

/// An alert raised when a payout's total drift crosses the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftAlert {
    /// The payout the drift belongs to.
    pub payout_ref: String,
    /// Total drift in cents (signed).
    pub drift: Cents,
    /// Alert severity.
    pub severity: DriftSeverity,
}

/// Computes a drift alert, if the drift warrants one.
///
/// Critical at 10x the threshold, warning at the threshold, nothing below.
/// Drift itself is data, not an error; the alert only makes it loud.
#[must_use]
pub fn drift_alert(payout_ref: &str, drift: Cents, threshold_cents: i64) -> Option<DriftAlert> {
    if threshold_cents <= 0 {
        return None;
    }

    let magnitude = drift.abs().into_inner();
    let severity = if magnitude >= threshold_cents.saturating_mul(10) {
        DriftSeverity::Critical
    } else if magnitude >= threshold_cents {
        DriftSeverity::Warning
    } else {
        return None;
    };

    Some(DriftAlert {
        payout_ref: payout_ref.to_string(),
        drift,
        severity,
    })
}

/// The result of reconciling one payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Tenant the payout belongs to.
    pub tenant_id: TenantId,
    /// Gateway payout reference.
    pub payout_ref: String,
    /// Total settlement lines pulled from the gateway.
    pub total_lines: usize,
    /// Lines accounted for.
    pub matched_count: usize,
    /// Lines flagged as drift.
    pub unmatched_count: usize,
    /// Total gateway fees in cents.
    pub fees: Cents,
    /// Net cash movement in cents (signed).
    pub net: Cents,
    /// Total drift in cents (signed).
    pub drift: Cents,
    /// True when the net-cash posting was created by this run (false for a
    /// replayed run or a zero-net payout).
    pub posted: bool,
    /// Drift alert, when the threshold was crossed.
    pub alert: Option<DriftAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, None)]
    #[case(99, None)]
    #[case(100, Some(DriftSeverity::Warning))]
    #[case(999, Some(DriftSeverity::Warning))]
    #[case(1000, Some(DriftSeverity::Critical))]
    #[case(50_000, Some(DriftSeverity::Critical))]
    fn test_drift_alert_thresholds(#[case] drift: i64, #[case] expected: Option<DriftSeverity>) {
        let alert = drift_alert("po_1", Cents::new(drift), 100);
        assert_eq!(alert.map(|a| a.severity), expected);
    }

    #[test]
    fn test_negative_drift_uses_magnitude() {
        let alert = drift_alert("po_1", Cents::new(-1000), 100).unwrap();
        assert_eq!(alert.severity, DriftSeverity::Critical);
        assert_eq!(alert.drift, Cents::new(-1000));
    }

    #[test]
    fn test_zero_threshold_disables_alerts() {
        assert!(drift_alert("po_1", Cents::new(1_000_000), 0).is_none());
    }
}
