//! Settlement matching, drift computation, and net-cash orientation.
//!
//! Reconciliation never auto-corrects silently: every settlement line is
//! either matched to an internal payment record or flagged as drift, and the
//! only postings it produces are the explicit reconciling entries (net cash
//! movement, gateway fees).

pub mod gateway;
pub mod matching;
pub mod report;

pub use gateway::{
    GatewayError, SettlementGateway, SettlementLine, SettlementLineType, SettlementPage,
    fetch_all_lines,
};
pub use matching::{InternalPaymentRecord, MatchedLine, match_lines, net_cash_lines};
pub use report::{DriftAlert, DriftSeverity, ReconciliationReport, drift_alert};
