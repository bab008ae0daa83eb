//! Gateway event deduplication and quarantine.
//!
//! The `(tenant_id, fact_key)` unique index is the idempotency mechanism: a
//! fact is "claimed" by inserting its key inside the same transaction as the
//! money writes, so a redelivered event either sees the committed claim and
//! skips, or races into the unique index and retries.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use pinewood_shared::types::TenantId;

use crate::entities::{gateway_events, unresolved_events};

/// Repository for processed-event records and the unresolved-event queue.
#[derive(Debug, Clone, Default)]
pub struct GatewayEventRepository;

impl GatewayEventRepository {
    /// Creates a new gateway event repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Attempts to record a fact as processed.
    ///
    /// Returns `true` when this call claimed the fact (the caller should
    /// apply it) and `false` when the fact was already processed (the caller
    /// must skip re-application).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn try_record_fact<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        event_id: &str,
        event_type: &str,
        fact_key: &str,
    ) -> Result<bool, DbErr> {
        let model = gateway_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id.into_inner()),
            event_id: Set(event_id.to_string()),
            event_type: Set(event_type.to_string()),
            fact_key: Set(fact_key.to_string()),
            processed_at: Set(Utc::now().into()),
        };

        let rows = gateway_events::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    gateway_events::Column::TenantId,
                    gateway_events::Column::FactKey,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(rows == 1)
    }

    /// Returns true if a fact key has already been processed for a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn was_processed<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        fact_key: &str,
    ) -> Result<bool, DbErr> {
        let found = gateway_events::Entity::find()
            .filter(gateway_events::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(gateway_events::Column::FactKey.eq(fact_key))
            .one(conn)
            .await?;
        Ok(found.is_some())
    }

    /// Quarantines an event that cannot be applied automatically.
    ///
    /// Quarantined events are excluded from posting and wait for manual
    /// resolution; the webhook is still acknowledged so the gateway stops
    /// redelivering.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn quarantine<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        event_type: &str,
        payload: serde_json::Value,
        reason: &str,
    ) -> Result<unresolved_events::Model, DbErr> {
        let model = unresolved_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_id: Set(event_id.to_string()),
            event_type: Set(event_type.to_string()),
            payload: Set(payload),
            reason: Set(reason.to_string()),
            received_at: Set(Utc::now().into()),
        };
        model.insert(conn).await
    }

    /// Lists quarantined events, oldest first (manual-resolution tooling).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_unresolved<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<Vec<unresolved_events::Model>, DbErr> {
        use sea_orm::QueryOrder;
        unresolved_events::Entity::find()
            .order_by_asc(unresolved_events::Column::ReceivedAt)
            .all(conn)
            .await
    }
}
