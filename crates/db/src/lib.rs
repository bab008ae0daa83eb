//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - The HTTP settlement gateway client
//!
//! Every table is tenant-scoped: repositories include the `tenant_id`
//! predicate in every query, deduplication lookups included.

pub mod entities;
pub mod gateway;
pub mod migration;
pub mod repositories;

pub use gateway::HttpSettlementGateway;
pub use repositories::{
    GatewayEventRepository, PaymentEventProcessor, PaymentRepository, PeriodRepository,
    PostingRepository, PayoutLineRepository, ReconciliationRepository, ReservationRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
