//! Gateway webhook ingestion.
//!
//! The endpoint is safely re-deliverable: at-least-once delivery is assumed,
//! duplicate facts are reported as skipped, and only retryable failures
//! surface as error statuses so the gateway redelivers.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::{error, warn};

use crate::signature::{SIGNATURE_HEADER, verify_signature};
use crate::{AppState, routes::error_response};
use pinewood_core::payment::event::GatewayEventEnvelope;

/// Creates the webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/gateway", post(handle_gateway_event))
}

/// POST `/webhooks/gateway`
async fn handle_gateway_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if !state.webhook_secret.is_empty() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if let Err(e) = verify_signature(&body, header, &state.webhook_secret) {
            warn!(error = %e, "Rejected webhook with bad signature");
            return error_response(401, "INVALID_SIGNATURE", &e.to_string());
        }
    }

    let envelope: GatewayEventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Rejected undecodable webhook body");
            return error_response(400, "INVALID_PAYLOAD", &e.to_string());
        }
    };

    match state.processor.process_envelope(&envelope).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "received": true,
                "event_id": outcome.event_id,
                "applied": outcome.applied,
                "skipped": outcome.skipped,
                "quarantined": outcome.quarantined,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(event_id = %envelope.id, error = %e, "Webhook processing failed");
            error_response(e.http_status_code(), e.error_code(), &e.to_string())
        }
    }
}
