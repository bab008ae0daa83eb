//! Payment fact repository.
//!
//! Payment rows are append-only: refunds and dispute adjustments are new rows
//! linked to the charge by `charge_reference_id`, and running totals (refunded
//! so far, withheld by a dispute) are derived by summing the recorded rows
//! rather than stored on the original.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use pinewood_core::payment::{PaymentDirection, PaymentMethod, PaymentState};
use pinewood_shared::types::{Cents, PaymentId, ReservationId, TenantId};

use crate::entities::payments;
use crate::entities::sea_orm_active_enums::PaymentDirection as DbDirection;

/// Input for inserting a payment fact.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Tenant the payment belongs to.
    pub tenant_id: TenantId,
    /// Reservation the payment is tied to.
    pub reservation_id: ReservationId,
    /// Charge or refund.
    pub direction: PaymentDirection,
    /// Tender method.
    pub method: PaymentMethod,
    /// Lifecycle state at insert.
    pub state: PaymentState,
    /// Amount in cents (positive).
    pub amount: Cents,
    /// Gateway id of this fact (intent, refund, or dispute id).
    pub gateway_reference_id: Option<String>,
    /// Gateway charge this fact belongs to (refunds, disputes).
    pub charge_reference_id: Option<String>,
    /// When the money movement occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Repository for payment facts.
#[derive(Debug, Clone, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Inserts a payment fact.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        new: NewPayment,
    ) -> Result<payments::Model, DbErr> {
        let now = Utc::now();
        let model = payments::ActiveModel {
            id: Set(PaymentId::new().into_inner()),
            tenant_id: Set(new.tenant_id.into_inner()),
            reservation_id: Set(new.reservation_id.into_inner()),
            direction: Set(new.direction.into()),
            method: Set(new.method.into()),
            state: Set(new.state.into()),
            amount_cents: Set(new.amount.into_inner()),
            gateway_reference_id: Set(new.gateway_reference_id),
            charge_reference_id: Set(new.charge_reference_id),
            occurred_at: Set(new.occurred_at.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        model.insert(conn).await
    }

    /// Finds a payment by its own gateway reference id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_gateway_ref<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        reference: &str,
    ) -> Result<Option<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payments::Column::GatewayReferenceId.eq(reference))
            .one(conn)
            .await
    }

    /// Finds the charge row a gateway charge reference belongs to.
    ///
    /// Charges are recorded under the intent reference with the charge id as
    /// `charge_reference_id`, so the lookup matches either column.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_charge_by_reference<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        charge_ref: &str,
    ) -> Result<Option<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payments::Column::Direction.eq(DbDirection::Charge))
            .filter(
                Condition::any()
                    .add(payments::Column::GatewayReferenceId.eq(charge_ref))
                    .add(payments::Column::ChargeReferenceId.eq(charge_ref)),
            )
            .one(conn)
            .await
    }

    /// Sum of recorded refund rows for a charge reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn refunded_total_for_charge<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        charge_ref: &str,
    ) -> Result<Cents, DbErr> {
        let rows = payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payments::Column::Direction.eq(DbDirection::Refund))
            .filter(payments::Column::ChargeReferenceId.eq(charge_ref))
            .all(conn)
            .await?;

        Ok(rows.iter().map(|r| Cents::new(r.amount_cents)).sum())
    }

    /// Net amount currently withheld under a dispute id: refund rows add,
    /// restoring charge rows subtract.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn dispute_total<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        dispute_id: &str,
    ) -> Result<Cents, DbErr> {
        let rows = payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payments::Column::GatewayReferenceId.eq(dispute_id))
            .all(conn)
            .await?;

        let total = rows
            .iter()
            .map(|r| {
                let sign = match r.direction {
                    DbDirection::Refund => 1,
                    DbDirection::Charge => -1,
                };
                r.amount_cents * sign
            })
            .sum();
        Ok(Cents::new(total))
    }

    /// Updates the lifecycle state of a payment row.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_state<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: payments::Model,
        state: PaymentState,
    ) -> Result<payments::Model, DbErr> {
        let mut active: payments::ActiveModel = model.into();
        active.state = Set(state.into());
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await
    }

    /// Resolves which tenant a gateway reference belongs to.
    ///
    /// This is the fallback tenant mapping for webhook objects (disputes,
    /// refunds) that do not carry tenant metadata themselves; it matches the
    /// unique gateway reference against recorded payment facts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn resolve_tenant<C: ConnectionTrait>(
        &self,
        conn: &C,
        reference: &str,
    ) -> Result<Option<TenantId>, DbErr> {
        let row = payments::Entity::find()
            .filter(
                Condition::any()
                    .add(payments::Column::GatewayReferenceId.eq(reference))
                    .add(payments::Column::ChargeReferenceId.eq(reference)),
            )
            .one(conn)
            .await?;
        Ok(row.map(|r| TenantId::from_uuid(r.tenant_id)))
    }

    /// Lists payment facts for a reservation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_reservation<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        reservation_id: ReservationId,
    ) -> Result<Vec<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payments::Column::ReservationId.eq(reservation_id.into_inner()))
            .order_by_asc(payments::Column::OccurredAt)
            .all(conn)
            .await
    }

    /// Fetches a payment by primary key within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        payment_id: Uuid,
    ) -> Result<Option<payments::Model>, DbErr> {
        payments::Entity::find_by_id(payment_id)
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .one(conn)
            .await
    }
}
