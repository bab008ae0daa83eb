//! Payout reconciliation routes (scheduler-invoked).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use tracing::error;
use uuid::Uuid;

use crate::{AppState, routes::error_response};
use pinewood_shared::types::TenantId;

/// Creates the reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/tenants/{tenant_id}/payouts/{payout_ref}/reconcile",
        post(reconcile_payout),
    )
}

/// POST `/tenants/{tenant_id}/payouts/{payout_ref}/reconcile`
async fn reconcile_payout(
    State(state): State<AppState>,
    Path((tenant_id, payout_ref)): Path<(Uuid, String)>,
) -> impl IntoResponse {
    let result = state
        .reconciliation
        .reconcile(
            state.gateway.as_ref(),
            TenantId::from_uuid(tenant_id),
            &payout_ref,
        )
        .await;

    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(
                tenant_id = %tenant_id,
                payout_ref = %payout_ref,
                error = %e,
                retryable = e.is_retryable(),
                "Reconciliation failed"
            );
            error_response(e.http_status_code(), e.error_code(), &e.to_string())
        }
    }
}
