//! Committed-ledger export for the reporting collaborator.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, routes::error_response};
use pinewood_core::ledger::types::AccountCode;
use pinewood_db::entities::ledger_entries;
use pinewood_db::entities::sea_orm_active_enums::EntryDirection as DbEntryDirection;
use pinewood_db::repositories::posting::LedgerExportFilter;
use pinewood_shared::types::{PageRequest, PageResponse, TenantId};

/// Creates the ledger export routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/tenants/{tenant_id}/ledger", get(export_ledger))
}

/// Query parameters for the ledger export.
#[derive(Debug, Deserialize)]
pub struct LedgerExportQuery {
    /// Earliest occurred-at date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest occurred-at date (inclusive).
    pub to: Option<NaiveDate>,
    /// Restrict to one account code.
    pub account_code: Option<String>,
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Rows per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

/// One exported ledger row.
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    /// Entry id.
    pub id: Uuid,
    /// GL account code.
    pub account_code: String,
    /// debit or credit.
    pub direction: String,
    /// Amount in cents.
    pub amount_cents: i64,
    /// When the financial fact occurred.
    pub occurred_at: String,
    /// When the row was written.
    pub posted_at: String,
    /// Posting group dedupe key.
    pub dedupe_key: String,
    /// Reservation, when the entry is tied to one.
    pub reservation_id: Option<Uuid>,
    /// External reference, when present.
    pub reference_id: Option<String>,
}

impl From<ledger_entries::Model> for LedgerEntryResponse {
    fn from(model: ledger_entries::Model) -> Self {
        let direction = match model.direction {
            DbEntryDirection::Debit => "debit",
            DbEntryDirection::Credit => "credit",
        };
        Self {
            id: model.id,
            account_code: model.account_code,
            direction: direction.to_string(),
            amount_cents: model.amount_cents,
            occurred_at: model.occurred_at.to_rfc3339(),
            posted_at: model.posted_at.to_rfc3339(),
            dedupe_key: model.dedupe_key,
            reservation_id: model.reservation_id,
            reference_id: model.reference_id,
        }
    }
}

/// GET `/tenants/{tenant_id}/ledger?from=&to=&account_code=`
async fn export_ledger(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<LedgerExportQuery>,
) -> impl IntoResponse {
    let account_code = match query.account_code.as_deref() {
        None => None,
        Some(raw) => match AccountCode::from_str(raw) {
            Ok(code) => Some(code),
            Err(e) => {
                return error_response(400, e.error_code(), &e.to_string());
            }
        },
    };

    let filter = LedgerExportFilter {
        from: query.from,
        to: query.to,
        account_code,
    };
    let page = PageRequest {
        page: query.page,
        per_page: query.per_page,
    };

    match state
        .postings
        .export(state.db.as_ref(), TenantId::from_uuid(tenant_id), &filter, &page)
        .await
    {
        Ok(page) => {
            let response = PageResponse {
                data: page
                    .data
                    .into_iter()
                    .map(LedgerEntryResponse::from)
                    .collect::<Vec<_>>(),
                meta: page.meta,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(tenant_id = %tenant_id, error = %e, "Ledger export failed");
            error_response(500, "DATABASE_ERROR", "An error occurred")
        }
    }
}
