//! Payment and refund routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, routes::error_response};
use pinewood_core::fees::{FeeConfig, calculate_fees};
use pinewood_core::payment::PaymentMethod;
use pinewood_db::repositories::processor::{PaymentResult, ProcessorError};
use pinewood_shared::types::{Cents, ReservationId, TenantId};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tenants/{tenant_id}/reservations/{reservation_id}/payments",
            post(record_payment),
        )
        .route(
            "/tenants/{tenant_id}/reservations/{reservation_id}/refunds",
            post(record_refund),
        )
}

/// Request body for recording a payment.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    /// Charge amount in cents.
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    /// Tender method.
    pub method: PaymentMethod,
    /// Caller-supplied idempotency key.
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: String,
    /// Apply the configured fee breakdown to the charge.
    #[serde(default)]
    pub apply_fees: bool,
}

/// Destination of a refund.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundDestination {
    /// Back to the card through the gateway.
    Card,
    /// To the guest's wallet.
    Wallet,
    /// Cash at the desk.
    Cash,
}

impl From<RefundDestination> for PaymentMethod {
    fn from(value: RefundDestination) -> Self {
        match value {
            RefundDestination::Card => Self::Card,
            RefundDestination::Wallet => Self::Wallet,
            RefundDestination::Cash => Self::Cash,
        }
    }
}

/// Request body for recording a refund.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordRefundRequest {
    /// Refund amount in cents.
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    /// Where the money goes.
    pub destination: RefundDestination,
}

/// Response for a recorded payment or refund.
#[derive(Debug, Serialize)]
pub struct MoneyMovementResponse {
    /// The payment fact id, when a new fact was written.
    pub payment_id: Option<Uuid>,
    /// False for idempotent replays.
    pub applied: bool,
    /// Reservation paid amount after the operation.
    pub paid_amount_cents: i64,
    /// Reservation balance after the operation.
    pub balance_amount_cents: i64,
    /// Reservation payment status after the operation.
    pub payment_status: String,
}

impl From<PaymentResult> for MoneyMovementResponse {
    fn from(result: PaymentResult) -> Self {
        let status = serde_json::to_value(result.reservation.payment_status)
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
            .unwrap_or_default();
        Self {
            payment_id: result.payment.map(|p| p.id),
            applied: result.applied,
            paid_amount_cents: result.reservation.paid_amount_cents,
            balance_amount_cents: result.reservation.balance_amount_cents,
            payment_status: status,
        }
    }
}

/// POST `/tenants/{tenant_id}/reservations/{reservation_id}/payments`
async fn record_payment(
    State(state): State<AppState>,
    Path((tenant_id, reservation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RecordPaymentRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return error_response(400, "VALIDATION_ERROR", &e.to_string());
    }

    let fees = payload
        .apply_fees
        .then(|| calculate_fees(Cents::new(payload.amount_cents), &FeeConfig::from(&state.fees)));

    let result = state
        .processor
        .record_payment(
            TenantId::from_uuid(tenant_id),
            ReservationId::from_uuid(reservation_id),
            Cents::new(payload.amount_cents),
            payload.method,
            &payload.idempotency_key,
            fees.as_ref(),
        )
        .await;

    match result {
        Ok(result) => {
            (StatusCode::CREATED, Json(MoneyMovementResponse::from(result))).into_response()
        }
        Err(e) => processor_error_response(&e),
    }
}

/// POST `/tenants/{tenant_id}/reservations/{reservation_id}/refunds`
async fn record_refund(
    State(state): State<AppState>,
    Path((tenant_id, reservation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RecordRefundRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return error_response(400, "VALIDATION_ERROR", &e.to_string());
    }

    let result = state
        .processor
        .record_refund(
            TenantId::from_uuid(tenant_id),
            ReservationId::from_uuid(reservation_id),
            Cents::new(payload.amount_cents),
            payload.destination.into(),
        )
        .await;

    match result {
        Ok(result) => {
            (StatusCode::CREATED, Json(MoneyMovementResponse::from(result))).into_response()
        }
        Err(e) => processor_error_response(&e),
    }
}

fn processor_error_response(e: &ProcessorError) -> axum::response::Response {
    if matches!(e, ProcessorError::Database(_)) {
        error!(error = %e, "Money operation failed");
    }
    error_response(e.http_status_code(), e.error_code(), &e.to_string())
}
