//! Reservation balance repository.
//!
//! The reservation row is the lock-contention point for per-reservation money
//! operations: every payment or refund locks the row for the duration of its
//! transaction, serializing concurrent operations on the same reservation
//! while leaving unrelated reservations unaffected.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set,
};

use pinewood_core::balance::ReservationBalance;
use pinewood_shared::types::{Cents, Currency, ReservationId, TenantId};

use crate::entities::reservations;

/// Input for creating a reservation's financial record.
#[derive(Debug, Clone)]
pub struct NewReservation {
    /// Tenant the reservation belongs to.
    pub tenant_id: TenantId,
    /// Reservation id (assigned by the booking layer).
    pub id: ReservationId,
    /// Total amount in cents.
    pub total_amount: Cents,
    /// Reservation currency.
    pub currency: Currency,
}

/// Repository for reservation balance fields.
#[derive(Debug, Clone, Default)]
pub struct ReservationRepository;

impl ReservationRepository {
    /// Creates a new reservation repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Inserts a reservation's financial record (booking-layer handoff,
    /// seeding, and tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        new: NewReservation,
    ) -> Result<reservations::Model, DbErr> {
        let now = Utc::now();
        let model = reservations::ActiveModel {
            id: Set(new.id.into_inner()),
            tenant_id: Set(new.tenant_id.into_inner()),
            total_amount_cents: Set(new.total_amount.into_inner()),
            paid_amount_cents: Set(0),
            balance_amount_cents: Set(new.total_amount.into_inner()),
            payment_status: Set(crate::entities::sea_orm_active_enums::ReservationPaymentStatusDb::Unpaid),
            currency: Set(new.currency.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        model.insert(conn).await
    }

    /// Fetches a reservation without locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        reservation_id: ReservationId,
    ) -> Result<Option<reservations::Model>, DbErr> {
        reservations::Entity::find_by_id(reservation_id.into_inner())
            .filter(reservations::Column::TenantId.eq(tenant_id.into_inner()))
            .one(conn)
            .await
    }

    /// Fetches a reservation with a row lock (`SELECT ... FOR UPDATE`).
    ///
    /// The lock is held until the enclosing transaction commits or rolls
    /// back, which is what serializes concurrent payments/refunds against the
    /// same reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_for_update(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        reservation_id: ReservationId,
    ) -> Result<Option<reservations::Model>, DbErr> {
        reservations::Entity::find_by_id(reservation_id.into_inner())
            .filter(reservations::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Writes a projected balance back onto the locked reservation row.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn apply_balance(
        &self,
        txn: &DatabaseTransaction,
        model: reservations::Model,
        balance: &ReservationBalance,
    ) -> Result<reservations::Model, DbErr> {
        let mut active: reservations::ActiveModel = model.into();
        active.paid_amount_cents = Set(balance.paid.into_inner());
        active.balance_amount_cents = Set(balance.balance.into_inner());
        active.payment_status = Set(balance.status.into());
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await
    }

    /// Lists a tenant's reservations (tooling/diagnostics).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
    ) -> Result<Vec<reservations::Model>, DbErr> {
        reservations::Entity::find()
            .filter(reservations::Column::TenantId.eq(tenant_id.into_inner()))
            .all(conn)
            .await
    }
}

/// Converts a stored model into the core projection input values.
#[must_use]
pub fn balance_of(model: &reservations::Model) -> (Cents, Cents) {
    (
        Cents::new(model.total_amount_cents),
        Cents::new(model.paid_amount_cents),
    )
}

/// Narrow accessor used when only the id is needed as a typed value.
#[must_use]
pub fn reservation_id_of(model: &reservations::Model) -> ReservationId {
    ReservationId::from_uuid(model.id)
}

/// Narrow accessor for the tenant id as a typed value.
#[must_use]
pub fn tenant_id_of(model: &reservations::Model) -> TenantId {
    TenantId::from_uuid(model.tenant_id)
}
