//! HTTP client for the payment gateway's settlement feed.
//!
//! Implements `SettlementGateway` over the gateway's balance-transactions
//! endpoint with cursor pagination. The raw wire shapes live here; the rest
//! of the system only sees the core `SettlementLine` model.

use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use pinewood_core::reconciliation::{
    GatewayError, SettlementGateway, SettlementLine, SettlementLineType, SettlementPage,
};
use pinewood_shared::config::GatewayConfig;
use pinewood_shared::types::{Cents, Currency};

/// Wire shape of one balance transaction.
#[derive(Debug, Deserialize)]
struct BalanceTransactionDto {
    id: String,
    #[serde(rename = "type")]
    txn_type: String,
    source: Option<String>,
    amount: i64,
    #[serde(default)]
    fee: i64,
    net: i64,
    #[serde(default)]
    currency: Option<String>,
}

/// Wire shape of one feed page.
#[derive(Debug, Deserialize)]
struct BalanceTransactionPageDto {
    data: Vec<BalanceTransactionDto>,
    #[serde(default)]
    has_more: bool,
}

impl BalanceTransactionDto {
    fn into_line(self) -> SettlementLine {
        let line_type = match self.txn_type.as_str() {
            "charge" | "payment" => SettlementLineType::Charge,
            "refund" | "payment_refund" => SettlementLineType::Refund,
            "stripe_fee" | "fee" => SettlementLineType::Fee,
            "adjustment" if self.amount < 0 => SettlementLineType::Chargeback,
            _ => SettlementLineType::Adjustment,
        };

        let currency = self
            .currency
            .as_deref()
            .and_then(|c| Currency::from_str(c).ok())
            .unwrap_or_default();

        SettlementLine {
            balance_transaction_id: self.id,
            line_type,
            source_ref: self.source,
            gross: Cents::new(self.amount),
            fee: Cents::new(self.fee),
            net: Cents::new(self.net),
            currency,
        }
    }
}

/// Settlement gateway client backed by `reqwest`.
#[derive(Clone)]
pub struct HttpSettlementGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpSettlementGateway {
    /// Creates a new gateway client.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl SettlementGateway for HttpSettlementGateway {
    async fn fetch_settlement_page(
        &self,
        payout_ref: &str,
        cursor: Option<String>,
    ) -> Result<SettlementPage, GatewayError> {
        let url = format!("{}/v1/balance_transactions", self.config.base_url);

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .query(&[
                ("payout", payout_ref),
                ("limit", &self.config.page_size.to_string()),
            ]);
        if let Some(cursor) = cursor.as_deref() {
            request = request.query(&[("starting_after", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let page: BalanceTransactionPageDto = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        debug!(
            payout_ref,
            fetched = page.data.len(),
            has_more = page.has_more,
            "Settlement page fetched"
        );

        let next_cursor = if page.has_more {
            page.data.last().map(|line| line.id.clone())
        } else {
            None
        };

        Ok(SettlementPage {
            lines: page.data.into_iter().map(BalanceTransactionDto::into_line).collect(),
            next_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_mapping() {
        let dto = BalanceTransactionDto {
            id: "txn_1".to_string(),
            txn_type: "charge".to_string(),
            source: Some("ch_1".to_string()),
            amount: 50_000,
            fee: 1480,
            net: 48_520,
            currency: Some("usd".to_string()),
        };
        let line = dto.into_line();
        assert_eq!(line.line_type, SettlementLineType::Charge);
        assert_eq!(line.gross, Cents::new(50_000));
        assert_eq!(line.fee, Cents::new(1480));
        assert_eq!(line.net, Cents::new(48_520));
        assert_eq!(line.currency, Currency::Usd);
    }

    #[test]
    fn test_negative_adjustment_is_chargeback() {
        let dto = BalanceTransactionDto {
            id: "txn_2".to_string(),
            txn_type: "adjustment".to_string(),
            source: Some("dp_1".to_string()),
            amount: -15_000,
            fee: 1500,
            net: -16_500,
            currency: None,
        };
        let line = dto.into_line();
        assert_eq!(line.line_type, SettlementLineType::Chargeback);
        assert_eq!(line.currency, Currency::Usd);
    }

    #[test]
    fn test_page_dto_decodes() {
        let json = serde_json::json!({
            "object": "list",
            "data": [
                { "id": "txn_1", "type": "charge", "source": "ch_1", "amount": 1000, "fee": 59, "net": 941, "currency": "usd" }
            ],
            "has_more": false
        });
        let page: BalanceTransactionPageDto = serde_json::from_value(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(!page.has_more);
    }
}
