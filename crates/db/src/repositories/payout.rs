//! Payout settlement line repository.
//!
//! Lines are upserted on `(tenant_id, balance_transaction_id)`: re-running
//! reconciliation refreshes match state instead of inserting duplicates.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use pinewood_core::reconciliation::MatchedLine;
use pinewood_shared::types::TenantId;

use crate::entities::payout_lines;

/// Repository for payout settlement lines.
#[derive(Debug, Clone, Default)]
pub struct PayoutLineRepository;

impl PayoutLineRepository {
    /// Creates a new payout line repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Upserts one matched settlement line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        payout_ref: &str,
        matched: &MatchedLine,
    ) -> Result<(), DbErr> {
        let now = Utc::now();
        let model = payout_lines::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id.into_inner()),
            payout_ref: Set(payout_ref.to_string()),
            balance_transaction_id: Set(matched.line.balance_transaction_id.clone()),
            line_type: Set(matched.line.line_type.into()),
            source_ref: Set(matched.line.source_ref.clone()),
            gross_cents: Set(matched.line.gross.into_inner()),
            fee_cents: Set(matched.line.fee.into_inner()),
            net_cents: Set(matched.line.net.into_inner()),
            currency: Set(matched.line.currency.to_string()),
            matched: Set(matched.matched),
            payment_id: Set(matched.payment_id.map(pinewood_shared::types::PaymentId::into_inner)),
            drift_cents: Set(matched.drift.into_inner()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        payout_lines::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    payout_lines::Column::TenantId,
                    payout_lines::Column::BalanceTransactionId,
                ])
                .update_columns([
                    payout_lines::Column::PayoutRef,
                    payout_lines::Column::LineType,
                    payout_lines::Column::SourceRef,
                    payout_lines::Column::GrossCents,
                    payout_lines::Column::FeeCents,
                    payout_lines::Column::NetCents,
                    payout_lines::Column::Currency,
                    payout_lines::Column::Matched,
                    payout_lines::Column::PaymentId,
                    payout_lines::Column::DriftCents,
                    payout_lines::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(())
    }

    /// Lists recorded lines for a payout.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_payout<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        payout_ref: &str,
    ) -> Result<Vec<payout_lines::Model>, DbErr> {
        payout_lines::Entity::find()
            .filter(payout_lines::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payout_lines::Column::PayoutRef.eq(payout_ref))
            .order_by_asc(payout_lines::Column::BalanceTransactionId)
            .all(conn)
            .await
    }
}
