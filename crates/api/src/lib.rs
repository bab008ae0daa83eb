//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for payments, refunds, webhooks, reconciliation, and
//!   the committed-ledger export
//! - Webhook signature verification
//! - Response types
//!
//! Authentication/authorization is owned by the platform shell in front of
//! this service; requests arriving here are already authorized.

pub mod routes;
pub mod signature;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use pinewood_db::{
    HttpSettlementGateway, PaymentEventProcessor, PeriodRepository, PostingRepository,
    ReconciliationRepository,
};
use pinewood_shared::config::{AppConfig, FeeSettings};
use pinewood_shared::notify::NotificationService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// The payment event processor.
    pub processor: Arc<PaymentEventProcessor>,
    /// Reconciliation runs.
    pub reconciliation: Arc<ReconciliationRepository>,
    /// Ledger reads (export).
    pub postings: Arc<PostingRepository>,
    /// Settlement gateway client.
    pub gateway: Arc<HttpSettlementGateway>,
    /// Default fee settings.
    pub fees: FeeSettings,
    /// Webhook signature secret (empty disables verification).
    pub webhook_secret: Arc<str>,
}

impl AppState {
    /// Wires the full repository stack from a connection and configuration.
    #[must_use]
    pub fn build(db: DatabaseConnection, config: &AppConfig) -> Self {
        let postings = PostingRepository::new(PeriodRepository::new(db.clone()));
        let notifier = NotificationService::new(config.notifications.clone());
        let processor = PaymentEventProcessor::new(db.clone(), postings.clone(), notifier);
        let reconciliation = ReconciliationRepository::new(
            db.clone(),
            postings.clone(),
            config.reconciliation.drift_threshold_cents,
        );
        let gateway = HttpSettlementGateway::new(config.gateway.clone());

        Self {
            db: Arc::new(db),
            processor: Arc::new(processor),
            reconciliation: Arc::new(reconciliation),
            postings: Arc::new(postings),
            gateway: Arc::new(gateway),
            fees: config.fees.clone(),
            webhook_secret: Arc::from(config.gateway.webhook_secret.as_str()),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .merge(routes::health::routes())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
