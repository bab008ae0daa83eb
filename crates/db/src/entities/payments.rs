//! `SeaORM` Entity for the payments table.
//!
//! Payment rows are append-only facts. Refunds and dispute adjustments are
//! separate rows linked to the original charge by `charge_reference_id`;
//! only the lifecycle `state` of a row ever changes after insert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentDirection, PaymentMethod, PaymentState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub direction: PaymentDirection,
    pub method: PaymentMethod,
    pub state: PaymentState,
    pub amount_cents: i64,
    /// Gateway id of this fact (intent, refund, or dispute id).
    pub gateway_reference_id: Option<String>,
    /// Gateway charge the fact belongs to, for refunds and disputes.
    pub charge_reference_id: Option<String>,
    pub occurred_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reservations::Entity",
        from = "Column::ReservationId",
        to = "super::reservations::Column::Id"
    )]
    Reservations,
}

impl Related<super::reservations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
