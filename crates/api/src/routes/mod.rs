//! API route definitions.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;

use crate::AppState;

pub mod fees;
pub mod health;
pub mod ledger;
pub mod payments;
pub mod reconciliation;
pub mod webhooks;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(payments::routes())
        .merge(webhooks::routes())
        .merge(reconciliation::routes())
        .merge(ledger::routes())
        .merge(fees::routes())
}

/// Renders a typed error as the standard error envelope.
pub(crate) fn error_response(status: u16, code: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}
