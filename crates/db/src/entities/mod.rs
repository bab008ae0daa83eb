//! `SeaORM` entity definitions.

pub mod gateway_events;
pub mod gl_periods;
pub mod ledger_entries;
pub mod payments;
pub mod payout_lines;
pub mod reservations;
pub mod sea_orm_active_enums;
pub mod unresolved_events;
