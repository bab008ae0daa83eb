//! `SeaORM` Entity for the payout_lines table.
//!
//! One row per external settlement transaction, upserted on
//! `(tenant_id, balance_transaction_id)` so reconciliation re-runs never
//! duplicate lines.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SettlementLineTypeDb;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payout_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub payout_ref: String,
    pub balance_transaction_id: String,
    pub line_type: SettlementLineTypeDb,
    pub source_ref: Option<String>,
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub currency: String,
    pub matched: bool,
    pub payment_id: Option<Uuid>,
    pub drift_cents: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
