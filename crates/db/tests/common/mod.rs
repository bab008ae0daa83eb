//! Shared helpers for repository integration tests.
//!
//! Tests connect to the database named by `DATABASE_URL` and skip cleanly
//! when it is not set, so the pure-logic suites stay green on machines
//! without Postgres.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use pinewood_db::entities::{gl_periods, sea_orm_active_enums::GlPeriodStatus};
use pinewood_db::migration::Migrator;
use pinewood_db::repositories::reservation::NewReservation;
use pinewood_db::repositories::ReservationRepository;
use pinewood_shared::types::{Cents, Currency, ReservationId, TenantId};

/// Connects and migrates, or returns `None` (skip) when `DATABASE_URL` is
/// not configured.
pub async fn test_db() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let db = pinewood_db::connect(&url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Some(db)
}

/// Inserts an open GL period covering the current month for a tenant.
pub async fn open_current_period(db: &DatabaseConnection, tenant_id: TenantId) {
    let today = Utc::now().date_naive();
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap();
    let end = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1).unwrap()
    }
    .pred_opt()
    .unwrap();

    insert_period(db, tenant_id, start, end, GlPeriodStatus::Open).await;
}

/// Inserts a GL period row.
pub async fn insert_period(
    db: &DatabaseConnection,
    tenant_id: TenantId,
    start: NaiveDate,
    end: NaiveDate,
    status: GlPeriodStatus,
) {
    let now = Utc::now();
    gl_periods::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(tenant_id.into_inner()),
        name: Set(format!("{start} - {end}")),
        start_date: Set(start),
        end_date: Set(end),
        status: Set(status),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("Failed to insert GL period");
}

/// Creates a reservation financial record for a tenant.
pub async fn create_reservation(
    db: &DatabaseConnection,
    tenant_id: TenantId,
    total_cents: i64,
) -> ReservationId {
    let id = ReservationId::new();
    ReservationRepository::new()
        .create(
            db,
            NewReservation {
                tenant_id,
                id,
                total_amount: Cents::new(total_cents),
                currency: Currency::Usd,
            },
        )
        .await
        .expect("Failed to create reservation");
    id
}
