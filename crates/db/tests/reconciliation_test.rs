//! Integration tests for payout reconciliation.

mod common;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use pinewood_core::reconciliation::{
    GatewayError, SettlementGateway, SettlementLine, SettlementLineType, SettlementPage,
};
use pinewood_db::entities::ledger_entries;
use pinewood_db::entities::sea_orm_active_enums::EntryDirection;
use pinewood_db::repositories::{
    PaymentEventProcessor, PeriodRepository, PostingRepository, ReconciliationRepository,
};
use pinewood_shared::notify::NotificationService;
use pinewood_shared::types::{Cents, Currency, TenantId};

/// In-memory settlement feed with fixed page size, for driving the
/// pagination loop without a network.
struct StubGateway {
    lines: Vec<SettlementLine>,
    page_size: usize,
}

#[async_trait]
impl SettlementGateway for StubGateway {
    async fn fetch_settlement_page(
        &self,
        _payout_ref: &str,
        cursor: Option<String>,
    ) -> Result<SettlementPage, GatewayError> {
        let start = match cursor.as_deref() {
            None => 0,
            Some(cursor) => {
                self.lines
                    .iter()
                    .position(|l| l.balance_transaction_id == cursor)
                    .map_or(self.lines.len(), |i| i + 1)
            }
        };
        let end = (start + self.page_size).min(self.lines.len());
        let page: Vec<SettlementLine> = self.lines[start..end].to_vec();
        let next_cursor = if end < self.lines.len() {
            page.last().map(|l| l.balance_transaction_id.clone())
        } else {
            None
        };
        Ok(SettlementPage {
            lines: page,
            next_cursor,
        })
    }
}

fn line(
    id: &str,
    line_type: SettlementLineType,
    source: Option<&str>,
    gross: i64,
    fee: i64,
) -> SettlementLine {
    SettlementLine {
        balance_transaction_id: id.to_string(),
        line_type,
        source_ref: source.map(ToString::to_string),
        gross: Cents::new(gross),
        fee: Cents::new(fee),
        net: Cents::new(gross - fee),
        currency: Currency::Usd,
    }
}

fn repositories(
    db: &DatabaseConnection,
) -> (PaymentEventProcessor, ReconciliationRepository) {
    let postings = PostingRepository::new(PeriodRepository::new(db.clone()));
    let processor = PaymentEventProcessor::new(
        db.clone(),
        postings.clone(),
        NotificationService::new(pinewood_shared::config::NotificationSettings::default()),
    );
    let reconciliation = ReconciliationRepository::new(db.clone(), postings, 100);
    (processor, reconciliation)
}

#[tokio::test]
async fn test_reconcile_matches_across_pages() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 100_000).await;

    let (processor, reconciliation) = repositories(&db);

    // A gateway charge recorded through the processor, so one settlement
    // line has an internal match.
    let charge_event: pinewood_core::payment::event::GatewayEventEnvelope =
        serde_json::from_value(serde_json::json!({
            "id": "evt_recon_pay",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_recon_1",
                "amount": 40_000,
                "amount_received": 40_000,
                "latest_charge": "ch_recon_1",
                "metadata": {
                    "tenant_id": tenant.to_string(),
                    "reservation_id": reservation.to_string()
                }
            }}
        }))
        .unwrap();
    processor.process_envelope(&charge_event).await.unwrap();

    let gateway = StubGateway {
        lines: vec![
            line("txn_a", SettlementLineType::Charge, Some("ch_recon_1"), 40_000, 1190),
            line("txn_b", SettlementLineType::Charge, Some("ch_unknown_1"), 35_000, 1045),
            line("txn_c", SettlementLineType::Fee, None, -500, 0),
        ],
        page_size: 2,
    };

    let report = reconciliation
        .reconcile(&gateway, tenant, "po_pages_1")
        .await
        .unwrap();

    assert_eq!(report.total_lines, 3, "Pagination must cover every page");
    assert_eq!(report.matched_count, 2, "Matched charge plus the fee line");
    assert_eq!(report.unmatched_count, 1);
}

#[tokio::test]
async fn test_reconcile_rerun_is_idempotent() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;

    let (_, reconciliation) = repositories(&db);

    let gateway = StubGateway {
        lines: vec![
            line("txn_r1", SettlementLineType::Charge, Some("ch_r1"), 50_000, 1480),
            line("txn_r2", SettlementLineType::Fee, None, -200, 0),
        ],
        page_size: 10,
    };

    let first = reconciliation
        .reconcile(&gateway, tenant, "po_rerun_1")
        .await
        .unwrap();
    let second = reconciliation
        .reconcile(&gateway, tenant, "po_rerun_1")
        .await
        .unwrap();

    assert_eq!(first.total_lines, second.total_lines);
    assert_eq!(first.matched_count, second.matched_count);
    assert_eq!(first.unmatched_count, second.unmatched_count);
    assert!(first.posted, "First run posts the net movement");
    assert!(!second.posted, "Re-run must not post again");

    // No duplicate postings.
    let rows = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TenantId.eq(tenant.into_inner()))
        .filter(ledger_entries::Column::DedupeKey.eq("payout:po_rerun_1:net"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_negative_net_payout_flips_orientation() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;

    let (_, reconciliation) = repositories(&db);

    // Dispute-heavy period: net payout of -$42.00.
    let gateway = StubGateway {
        lines: vec![line(
            "txn_neg_1",
            SettlementLineType::Chargeback,
            Some("dp_neg_1"),
            -4200,
            0,
        )],
        page_size: 10,
    };

    let report = reconciliation
        .reconcile(&gateway, tenant, "po_negative_1")
        .await
        .unwrap();
    assert_eq!(report.net, Cents::new(-4200));

    let rows = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TenantId.eq(tenant.into_inner()))
        .filter(ledger_entries::Column::DedupeKey.eq("payout:po_negative_1:net"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    // Credit the operating bank, debit the clearing account.
    let debit = rows.iter().find(|r| r.direction == EntryDirection::Debit).unwrap();
    let credit = rows.iter().find(|r| r.direction == EntryDirection::Credit).unwrap();
    assert_eq!(debit.account_code, "bank_clearing");
    assert_eq!(credit.account_code, "bank_operating");
    assert_eq!(debit.amount_cents, 4200);
    assert_eq!(credit.amount_cents, 4200);
}

#[tokio::test]
async fn test_drift_alert_raised_for_unmatched_lines() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;

    let (_, reconciliation) = repositories(&db);

    let gateway = StubGateway {
        lines: vec![line(
            "txn_drift_1",
            SettlementLineType::Charge,
            Some("ch_missing_1"),
            25_000,
            755,
        )],
        page_size: 10,
    };

    let report = reconciliation
        .reconcile(&gateway, tenant, "po_drift_1")
        .await
        .unwrap();
    assert_eq!(report.unmatched_count, 1);
    assert_eq!(report.drift, Cents::new(24_245));
    let alert = report.alert.expect("drift above threshold must alert");
    assert_eq!(
        alert.severity,
        pinewood_core::reconciliation::DriftSeverity::Critical
    );
}
