//! GL period lookups with a short-lived cache.
//!
//! Period state is read-mostly: it changes when the accounting close workflow
//! runs, not per request. Lookups are cached per (tenant, date) with a short
//! TTL so the posting hot path does not hit the periods table on every write.

use std::time::Duration;

use chrono::NaiveDate;
use moka::sync::Cache;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use pinewood_core::period::GlPeriod;
use pinewood_shared::types::{GlPeriodId, TenantId};

use crate::entities::gl_periods;

const CACHE_TTL: Duration = Duration::from_secs(60);
const CACHE_CAPACITY: u64 = 10_000;

/// Repository for GL period reads.
#[derive(Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
    cache: Cache<(Uuid, NaiveDate), Option<GlPeriod>>,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Finds the period covering `date` for a tenant, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for_date(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
    ) -> Result<Option<GlPeriod>, DbErr> {
        let key = (tenant_id.into_inner(), date);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let model = gl_periods::Entity::find()
            .filter(gl_periods::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(gl_periods::Column::StartDate.lte(date))
            .filter(gl_periods::Column::EndDate.gte(date))
            .one(&self.db)
            .await?;

        let period = model.map(to_core);
        self.cache.insert(key, period.clone());
        Ok(period)
    }

    /// Returns true if the tenant may post on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_open(&self, tenant_id: TenantId, date: NaiveDate) -> Result<bool, DbErr> {
        let period = self.find_for_date(tenant_id, date).await?;
        Ok(pinewood_core::period::is_open(period.as_ref()))
    }

    /// Drops a cached lookup (used after seeding or in tests that mutate
    /// period state).
    pub fn invalidate(&self, tenant_id: TenantId, date: NaiveDate) {
        self.cache.invalidate(&(tenant_id.into_inner(), date));
    }
}

fn to_core(model: gl_periods::Model) -> GlPeriod {
    GlPeriod {
        id: GlPeriodId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        start_date: model.start_date,
        end_date: model.end_date,
        status: model.status.into(),
    }
}
