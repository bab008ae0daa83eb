//! `SeaORM` Entity for the reservations table (financial fields only).
//!
//! The booking layer owns the rest of a reservation; the financial core owns
//! the balance fields and mutates them only under a row lock, in the same
//! transaction as the corresponding payment and ledger writes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ReservationPaymentStatusDb;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub total_amount_cents: i64,
    pub paid_amount_cents: i64,
    pub balance_amount_cents: i64,
    pub payment_status: ReservationPaymentStatusDb,
    pub currency: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
