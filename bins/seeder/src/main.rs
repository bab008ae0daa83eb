//! Database seeder for Pinewood development and testing.
//!
//! Seeds a test tenant, GL periods for the current year, and a handful of
//! reservations for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use pinewood_db::entities::{gl_periods, sea_orm_active_enums::GlPeriodStatus};
use pinewood_db::repositories::ReservationRepository;
use pinewood_db::repositories::reservation::NewReservation;
use pinewood_shared::types::{Cents, Currency, ReservationId, TenantId};

/// Test tenant ID (consistent for all seeds)
const TEST_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = pinewood_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding GL periods...");
    seed_gl_periods(&db).await;

    println!("Seeding reservations...");
    seed_reservations(&db).await;

    println!("Seeding complete!");
}

fn test_tenant_id() -> TenantId {
    TenantId::from_uuid(Uuid::parse_str(TEST_TENANT_ID).unwrap())
}

/// One period per month of the current year: past months closed, the current
/// and future months open.
async fn seed_gl_periods(db: &DatabaseConnection) {
    let tenant = test_tenant_id();
    let today = Utc::now().date_naive();
    let year = today.year();

    let existing = gl_periods::Entity::find()
        .filter(gl_periods::Column::TenantId.eq(tenant.into_inner()))
        .all(db)
        .await
        .expect("Failed to query GL periods");
    if !existing.is_empty() {
        println!("  GL periods already seeded, skipping");
        return;
    }

    for month in 1..=12u32 {
        let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
        }
        .pred_opt()
        .unwrap();

        let status = if month < today.month() {
            GlPeriodStatus::Closed
        } else {
            GlPeriodStatus::Open
        };

        let now = Utc::now();
        gl_periods::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant.into_inner()),
            name: Set(format!("{year}-{month:02}")),
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

    println!("  Seeded 12 GL periods for {year}");
}

async fn seed_reservations(db: &DatabaseConnection) {
    let tenant = test_tenant_id();
    let repo = ReservationRepository::new();

    let existing = repo
        .list(db, tenant)
        .await
        .expect("Failed to query reservations");
    if !existing.is_empty() {
        println!("  Reservations already seeded, skipping");
        return;
    }

    for total in [50_000i64, 32_500, 18_000] {
        repo.create(
            db,
            NewReservation {
                tenant_id: tenant,
                id: ReservationId::new(),
                total_amount: Cents::new(total),
                currency: Currency::Usd,
            },
        )
        .await
        .expect("Failed to insert reservation");
    }

    println!("  Seeded 3 reservations");
}
