//! Integration tests for the payment event processor.
//!
//! Covers the idempotent-replay, out-of-order refund, requires-capture, and
//! cumulative-refund behaviors end to end against a real database.

mod common;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;

use pinewood_core::ledger::error::LedgerError;
use pinewood_core::payment::PaymentMethod;
use pinewood_core::payment::event::GatewayEventEnvelope;
use pinewood_db::entities::{
    ledger_entries, payments, reservations, sea_orm_active_enums::ReservationPaymentStatusDb,
};
use pinewood_db::repositories::processor::ProcessorError;
use pinewood_db::repositories::{PaymentEventProcessor, PeriodRepository, PostingRepository};
use pinewood_shared::notify::NotificationService;
use pinewood_shared::types::{Cents, ReservationId, TenantId};

fn processor(db: &DatabaseConnection) -> PaymentEventProcessor {
    PaymentEventProcessor::new(
        db.clone(),
        PostingRepository::new(PeriodRepository::new(db.clone())),
        NotificationService::new(pinewood_shared::config::NotificationSettings::default()),
    )
}

fn envelope(event_id: &str, event_type: &str, object: serde_json::Value) -> GatewayEventEnvelope {
    serde_json::from_value(json!({
        "id": event_id,
        "type": event_type,
        "data": { "object": object }
    }))
    .unwrap()
}

fn succeeded_event(
    event_id: &str,
    intent_ref: &str,
    amount: i64,
    tenant: TenantId,
    reservation: ReservationId,
) -> GatewayEventEnvelope {
    envelope(
        event_id,
        "payment_intent.succeeded",
        json!({
            "id": intent_ref,
            "amount": amount,
            "amount_received": amount,
            "latest_charge": format!("ch_{intent_ref}"),
            "metadata": {
                "tenant_id": tenant.to_string(),
                "reservation_id": reservation.to_string()
            }
        }),
    )
}

fn refund_event(
    event_id: &str,
    charge_ref: &str,
    cumulative: i64,
    refunds: &[(&str, i64)],
    tenant: TenantId,
) -> GatewayEventEnvelope {
    let refund_objects: Vec<serde_json::Value> = refunds
        .iter()
        .map(|(id, amount)| json!({ "id": id, "amount": amount }))
        .collect();
    envelope(
        event_id,
        "charge.refunded",
        json!({
            "id": charge_ref,
            "amount_refunded": cumulative,
            "refunds": { "data": refund_objects },
            "metadata": { "tenant_id": tenant.to_string() }
        }),
    )
}

async fn reservation_state(
    db: &DatabaseConnection,
    reservation: ReservationId,
) -> reservations::Model {
    reservations::Entity::find_by_id(reservation.into_inner())
        .one(db)
        .await
        .unwrap()
        .expect("reservation must exist")
}

#[tokio::test]
async fn test_charge_succeeded_pays_reservation_in_full() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 50_000).await;

    let processor = processor(&db);
    let event = succeeded_event("evt_pay_1", "pi_full_1", 50_000, tenant, reservation);
    let outcome = processor.process_envelope(&event).await.unwrap();

    assert_eq!(outcome.applied, 1);
    assert!(!outcome.quarantined);

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 50_000);
    assert_eq!(state.balance_amount_cents, 0);
    assert_eq!(state.payment_status, ReservationPaymentStatusDb::Paid);
}

#[tokio::test]
async fn test_replayed_event_applies_exactly_once() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 50_000).await;

    let processor = processor(&db);
    let event = succeeded_event("evt_replay_1", "pi_replay_1", 50_000, tenant, reservation);

    let first = processor.process_envelope(&event).await.unwrap();
    let second = processor.process_envelope(&event).await.unwrap();

    assert_eq!(first.applied, 1);
    assert_eq!(second.applied, 0);
    assert_eq!(second.skipped, 1);

    // Exactly one payment row and one posting group.
    let payment_rows = payments::Entity::find()
        .filter(payments::Column::TenantId.eq(tenant.into_inner()))
        .filter(payments::Column::GatewayReferenceId.eq("pi_replay_1"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(payment_rows.len(), 1);

    let ledger_rows = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TenantId.eq(tenant.into_inner()))
        .filter(ledger_entries::Column::ReferenceId.eq("pi_replay_1"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(ledger_rows.len(), 2);

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 50_000);
}

#[tokio::test]
async fn test_requires_capture_never_touches_balances() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 50_000).await;

    let processor = processor(&db);
    let event = envelope(
        "evt_auth_1",
        "payment_intent.amount_capturable_updated",
        json!({
            "id": "pi_auth_1",
            "amount_capturable": 50_000,
            "metadata": {
                "tenant_id": tenant.to_string(),
                "reservation_id": reservation.to_string()
            }
        }),
    );
    let outcome = processor.process_envelope(&event).await.unwrap();
    assert_eq!(outcome.applied, 1);

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 0);
    assert_eq!(state.balance_amount_cents, 50_000);
    assert_eq!(state.payment_status, ReservationPaymentStatusDb::Unpaid);

    // The authorized fact is recorded, with no ledger effect.
    let payment_rows = payments::Entity::find()
        .filter(payments::Column::TenantId.eq(tenant.into_inner()))
        .filter(payments::Column::GatewayReferenceId.eq("pi_auth_1"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(payment_rows.len(), 1);

    let ledger_rows = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TenantId.eq(tenant.into_inner()))
        .filter(ledger_entries::Column::ReferenceId.eq("pi_auth_1"))
        .all(&db)
        .await
        .unwrap();
    assert!(ledger_rows.is_empty());
}

#[tokio::test]
async fn test_out_of_order_refunds_each_apply_once() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 10_000).await;

    let processor = processor(&db);
    let charge = succeeded_event("evt_oo_pay", "pi_oo_1", 10_000, tenant, reservation);
    processor.process_envelope(&charge).await.unwrap();

    // Two refunds ($30 then $20) delivered in reverse order.
    let second_refund = refund_event(
        "evt_oo_r2",
        "ch_pi_oo_1",
        5000,
        &[("re_oo_1", 3000), ("re_oo_2", 2000)],
        tenant,
    );
    let first_refund = refund_event("evt_oo_r1", "ch_pi_oo_1", 3000, &[("re_oo_1", 3000)], tenant);

    processor.process_envelope(&second_refund).await.unwrap();
    let late = processor.process_envelope(&first_refund).await.unwrap();

    // The late event's only fact (re_oo_1) was already applied.
    assert_eq!(late.applied, 0);
    assert_eq!(late.skipped, 1);

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 5000);
    assert_eq!(state.balance_amount_cents, 5000);

    // Two distinct refund postings.
    let refund_rows = payments::Entity::find()
        .filter(payments::Column::TenantId.eq(tenant.into_inner()))
        .filter(payments::Column::ChargeReferenceId.eq("ch_pi_oo_1"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(refund_rows.len(), 2);
}

#[tokio::test]
async fn test_cumulative_refund_reports_apply_deltas() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 50_000).await;

    let processor = processor(&db);
    let charge = succeeded_event("evt_cum_pay", "pi_cum_1", 50_000, tenant, reservation);
    processor.process_envelope(&charge).await.unwrap();

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 50_000);
    assert_eq!(state.payment_status, ReservationPaymentStatusDb::Paid);

    // Gateway reports cumulative $150, then cumulative $300 (no itemized
    // refund list); each event applies only its delta.
    let first = envelope(
        "evt_cum_r1",
        "charge.refunded",
        json!({
            "id": "ch_pi_cum_1",
            "amount_refunded": 15_000,
            "metadata": { "tenant_id": tenant.to_string() }
        }),
    );
    processor.process_envelope(&first).await.unwrap();

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 35_000);
    assert_eq!(state.balance_amount_cents, 15_000);
    assert_eq!(state.payment_status, ReservationPaymentStatusDb::Partial);

    let second = envelope(
        "evt_cum_r2",
        "charge.refunded",
        json!({
            "id": "ch_pi_cum_1",
            "amount_refunded": 30_000,
            "metadata": { "tenant_id": tenant.to_string() }
        }),
    );
    processor.process_envelope(&second).await.unwrap();

    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 20_000);
    assert_eq!(state.balance_amount_cents, 30_000);
    assert_eq!(state.payment_status, ReservationPaymentStatusDb::Partial);
}

#[tokio::test]
async fn test_record_refund_rejects_overdraw_before_writes() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 20_000).await;

    let processor = processor(&db);
    processor
        .record_payment(
            tenant,
            reservation,
            Cents::new(10_000),
            PaymentMethod::Cash,
            "idem-refund-guard",
            None,
        )
        .await
        .unwrap();

    let result = processor
        .record_refund(tenant, reservation, Cents::new(10_001), PaymentMethod::Cash)
        .await;
    assert!(matches!(
        result,
        Err(ProcessorError::Ledger(
            LedgerError::InsufficientFundsForRefund { .. }
        ))
    ));

    // Nothing changed.
    let state = reservation_state(&db, reservation).await;
    assert_eq!(state.paid_amount_cents, 10_000);

    let refund_rows = payments::Entity::find()
        .filter(payments::Column::TenantId.eq(tenant.into_inner()))
        .filter(payments::Column::ReservationId.eq(reservation.into_inner()))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(refund_rows.len(), 1, "Only the charge row exists");
}

#[tokio::test]
async fn test_record_payment_replay_returns_recorded_state() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let tenant = TenantId::new();
    common::open_current_period(&db, tenant).await;
    let reservation = common::create_reservation(&db, tenant, 30_000).await;

    let processor = processor(&db);
    let first = processor
        .record_payment(
            tenant,
            reservation,
            Cents::new(30_000),
            PaymentMethod::Card,
            "idem-replay-1",
            None,
        )
        .await
        .unwrap();
    let second = processor
        .record_payment(
            tenant,
            reservation,
            Cents::new(30_000),
            PaymentMethod::Card,
            "idem-replay-1",
            None,
        )
        .await
        .unwrap();

    assert!(first.applied);
    assert!(!second.applied);
    assert!(second.payment.is_none());
    assert_eq!(second.reservation.paid_amount_cents, 30_000);
}

#[tokio::test]
async fn test_unmappable_event_is_quarantined_not_crashed() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let processor = processor(&db);

    let event = envelope(
        "evt_orphan_1",
        "charge.refunded",
        json!({
            "id": "ch_orphan_1",
            "amount_refunded": 1000,
            "metadata": {}
        }),
    );
    let outcome = processor.process_envelope(&event).await.unwrap();
    assert!(outcome.quarantined);
    assert_eq!(outcome.applied, 0);
}
