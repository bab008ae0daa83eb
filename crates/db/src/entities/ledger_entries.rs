//! `SeaORM` Entity for the ledger_entries table.
//!
//! Rows are immutable once inserted; corrections are offsetting entries.
//! `(tenant_id, dedupe_key, line_no)` is unique so a replayed posting group
//! can never double-insert a line.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::EntryDirection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_code: String,
    pub direction: EntryDirection,
    pub amount_cents: i64,
    /// When the underlying financial fact occurred.
    pub occurred_at: DateTimeWithTimeZone,
    /// When the row was written.
    pub posted_at: DateTimeWithTimeZone,
    pub dedupe_key: String,
    /// Position of this line within its posting group.
    pub line_no: i16,
    pub reservation_id: Option<Uuid>,
    pub reference_id: Option<String>,
    pub period_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gl_periods::Entity",
        from = "Column::PeriodId",
        to = "super::gl_periods::Column::Id"
    )]
    GlPeriods,
}

impl Related<super::gl_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GlPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
