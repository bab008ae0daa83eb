//! `SeaORM` Entity for the gateway_events table.
//!
//! One row per processed financial fact. `(tenant_id, fact_key)` is unique:
//! the database, not application state, is what makes event replay a no-op.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gateway_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Gateway event id (`evt_...`); informational, one event can assert
    /// several facts.
    pub event_id: String,
    pub event_type: String,
    /// The granular financial fact key (refund id, dispute id, ...).
    pub fact_key: String,
    pub processed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
