//! `SeaORM` Entity for the unresolved_events table.
//!
//! Quarantine for webhooks and settlement records that cannot be mapped to a
//! tenant. These rows are excluded from automatic posting and wait for manual
//! resolution.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "unresolved_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub payload: Json,
    pub reason: String,
    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
