//! Settlement gateway abstraction.
//!
//! The reconciliation service pulls a payout's balance transactions from the
//! external gateway through this trait. Pagination is mandatory: a payout can
//! itemize far more lines than one page, and reading only the first page
//! systematically under-reconciles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pinewood_shared::types::{Cents, Currency};

/// Errors from the settlement gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("Gateway request failed: {0}")]
    Http(String),
    /// The gateway responded but the body could not be decoded.
    #[error("Gateway response could not be decoded: {0}")]
    Decode(String),
    /// The gateway rejected the request.
    #[error("Gateway rejected request with status {0}")]
    Status(u16),
}

impl GatewayError {
    /// All gateway errors are retryable: the caller aborts the current run
    /// and the scheduler re-invokes reconciliation later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        true
    }
}

/// Classification of one settlement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementLineType {
    /// A captured charge.
    Charge,
    /// A refund.
    Refund,
    /// A gateway fee line.
    Fee,
    /// A chargeback withdrawal.
    Chargeback,
    /// A manual gateway adjustment.
    Adjustment,
}

/// One balance transaction inside a payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementLine {
    /// Gateway balance transaction id (`txn_...`), unique per tenant.
    pub balance_transaction_id: String,
    /// Line classification.
    pub line_type: SettlementLineType,
    /// The charge/refund/dispute the line settles, when the gateway reports
    /// one. Fees and adjustments typically have none.
    pub source_ref: Option<String>,
    /// Gross amount in cents (signed).
    pub gross: Cents,
    /// Fee deducted in cents.
    pub fee: Cents,
    /// Net amount in cents (signed).
    pub net: Cents,
    /// Settlement currency.
    pub currency: Currency,
}

/// One page of settlement lines.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementPage {
    /// Lines in this page.
    pub lines: Vec<SettlementLine>,
    /// Cursor for the next page; `None` when this is the last page.
    pub next_cursor: Option<String>,
}

/// Read access to the gateway's settlement feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Fetches one page of balance transactions for a payout.
    async fn fetch_settlement_page(
        &self,
        payout_ref: &str,
        cursor: Option<String>,
    ) -> Result<SettlementPage, GatewayError>;
}

/// Fetches *all* settlement lines for a payout, following the cursor until
/// the feed is exhausted.
///
/// No internal writes happen while this loop runs; callers fetch first, then
/// apply writes in short transactions.
///
/// # Errors
///
/// Propagates the first `GatewayError`; partial pages are discarded.
pub async fn fetch_all_lines(
    gateway: &dyn SettlementGateway,
    payout_ref: &str,
) -> Result<Vec<SettlementLine>, GatewayError> {
    let mut lines = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = gateway
            .fetch_settlement_page(payout_ref, cursor.clone())
            .await?;
        lines.extend(page.lines);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, net: i64) -> SettlementLine {
        SettlementLine {
            balance_transaction_id: id.to_string(),
            line_type: SettlementLineType::Charge,
            source_ref: Some(format!("ch_{id}")),
            gross: Cents::new(net),
            fee: Cents::ZERO,
            net: Cents::new(net),
            currency: Currency::Usd,
        }
    }

    #[tokio::test]
    async fn test_fetch_all_follows_every_page() {
        let mut gateway = MockSettlementGateway::new();

        gateway
            .expect_fetch_settlement_page()
            .times(2)
            .returning(|payout_ref, cursor| {
                assert_eq!(payout_ref, "po_1");
                match cursor.as_deref() {
                    None => Ok(SettlementPage {
                        lines: vec![line("txn_1", 100), line("txn_2", 200)],
                        next_cursor: Some("txn_2".to_string()),
                    }),
                    Some("txn_2") => Ok(SettlementPage {
                        lines: vec![line("txn_3", 300)],
                        next_cursor: None,
                    }),
                    Some(other) => panic!("unexpected cursor {other}"),
                }
            });

        let lines = fetch_all_lines(&gateway, "po_1").await.unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].balance_transaction_id, "txn_3");
    }

    #[tokio::test]
    async fn test_fetch_all_single_page() {
        let mut gateway = MockSettlementGateway::new();
        gateway
            .expect_fetch_settlement_page()
            .times(1)
            .returning(|_, _| {
                Ok(SettlementPage {
                    lines: vec![line("txn_1", 100)],
                    next_cursor: None,
                })
            });

        let lines = fetch_all_lines(&gateway, "po_1").await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_propagates_errors() {
        let mut gateway = MockSettlementGateway::new();
        gateway
            .expect_fetch_settlement_page()
            .times(1)
            .returning(|_, _| Err(GatewayError::Status(500)));

        let result = fetch_all_lines(&gateway, "po_1").await;
        assert!(matches!(result, Err(GatewayError::Status(500))));
        assert!(result.unwrap_err().is_retryable());
    }
}
