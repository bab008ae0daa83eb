//! Fee breakdown preview.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use validator::Validate;

use crate::{AppState, routes::error_response};
use pinewood_core::fees::{FeeConfig, calculate_fees};
use pinewood_shared::types::Cents;

/// Creates the fee preview routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/fees/preview", post(preview_fees))
}

/// Request body for a fee preview.
#[derive(Debug, Deserialize, Validate)]
pub struct FeePreviewRequest {
    /// Base charge amount in cents.
    #[validate(range(min = 1))]
    pub amount_cents: i64,
}

/// POST `/fees/preview`
async fn preview_fees(
    State(state): State<AppState>,
    Json(payload): Json<FeePreviewRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return error_response(400, "VALIDATION_ERROR", &e.to_string());
    }

    let breakdown = calculate_fees(
        Cents::new(payload.amount_cents),
        &FeeConfig::from(&state.fees),
    );
    (StatusCode::OK, Json(breakdown)).into_response()
}
