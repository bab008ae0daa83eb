//! The single write path to the general ledger.
//!
//! Posting groups are validated in core (`PostingGroup` cannot exist
//! unbalanced); this repository adds the pieces only the database can
//! enforce: the GL period gate, tenant-namespaced deduplication, and
//! atomicity of the whole group.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::warn;
use uuid::Uuid;

use pinewood_core::ledger::error::LedgerError;
use pinewood_core::ledger::posting::PostingGroup;
use pinewood_core::ledger::types::AccountCode;
use pinewood_shared::types::{PageRequest, PageResponse, TenantId};

use crate::entities::ledger_entries;

use super::period::PeriodRepository;

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// A core ledger rule rejected the posting.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl PostingError {
    /// Database failures are retryable; rule violations are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// The result of posting a group.
#[derive(Debug, Clone)]
pub struct PostingReceipt {
    /// All entries of the group, in line order.
    pub entries: Vec<ledger_entries::Model>,
    /// True when the full group already existed (idempotent replay).
    pub replayed: bool,
    /// Number of lines inserted to complete a previously half-written group.
    pub repaired: usize,
}

/// Filters for the committed-ledger export.
#[derive(Debug, Clone, Default)]
pub struct LedgerExportFilter {
    /// Earliest occurred-at date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest occurred-at date (inclusive).
    pub to: Option<NaiveDate>,
    /// Restrict to one account code.
    pub account_code: Option<AccountCode>,
}

/// Repository for ledger writes and reads.
#[derive(Clone)]
pub struct PostingRepository {
    periods: PeriodRepository,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub const fn new(periods: PeriodRepository) -> Self {
        Self { periods }
    }

    /// Posts a balanced group inside the caller's transaction.
    ///
    /// Behavior per prior state of `(tenant_id, dedupe_key)`:
    /// - no lines exist: insert the full group
    /// - all lines exist: return them unchanged (`replayed = true`)
    /// - some lines exist: a prior run failed mid-group; insert only the
    ///   missing lines (`repaired > 0`)
    ///
    /// The dedupe lookup takes row locks so two concurrent deliveries of the
    /// same fact serialize here; a first-time race that slips past the lookup
    /// is stopped by the unique `(tenant_id, dedupe_key, line_no)` index and
    /// surfaces as a retryable database error.
    ///
    /// # Errors
    ///
    /// - `Ledger(PeriodClosed | PeriodLocked | NoPeriodForDate)` when the GL
    ///   period guard rejects the target date
    /// - `Database` on any persistence failure (whole transaction aborts)
    pub async fn post_group(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        group: &PostingGroup,
    ) -> Result<PostingReceipt, PostingError> {
        let date = group.occurred_at.date_naive();
        let period = self.periods.find_for_date(tenant_id, date).await?;
        let period_id = pinewood_core::period::assert_open(period.as_ref(), date)?;

        let existing = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(ledger_entries::Column::DedupeKey.eq(group.dedupe_key.as_str()))
            .order_by_asc(ledger_entries::Column::LineNo)
            .lock_exclusive()
            .all(txn)
            .await?;

        let lines = group.lines();
        if existing.len() == lines.len() {
            return Ok(PostingReceipt {
                entries: existing,
                replayed: true,
                repaired: 0,
            });
        }

        let prior = existing.len();
        if prior > 0 {
            warn!(
                tenant_id = %tenant_id,
                dedupe_key = %group.dedupe_key,
                present = prior,
                expected = lines.len(),
                "Partial posting group detected, completing missing lines"
            );
        }

        let existing_line_nos: HashSet<i16> = existing.iter().map(|e| e.line_no).collect();
        let posted_at = Utc::now();
        let mut entries = existing;

        for (idx, line) in lines.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let line_no = idx as i16;
            if existing_line_nos.contains(&line_no) {
                continue;
            }

            let entry = ledger_entries::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id.into_inner()),
                account_code: Set(line.account.as_str().to_string()),
                direction: Set(line.direction.into()),
                amount_cents: Set(line.amount.into_inner()),
                occurred_at: Set(group.occurred_at.into()),
                posted_at: Set(posted_at.into()),
                dedupe_key: Set(group.dedupe_key.clone()),
                line_no: Set(line_no),
                reservation_id: Set(group.reservation_id.map(pinewood_shared::types::ReservationId::into_inner)),
                reference_id: Set(group.reference_id.clone()),
                period_id: Set(period_id.into_inner()),
            };
            entries.push(entry.insert(txn).await?);
        }

        entries.sort_by_key(|e| e.line_no);
        let repaired = if prior > 0 { lines.len() - prior } else { 0 };

        Ok(PostingReceipt {
            entries,
            replayed: false,
            repaired,
        })
    }

    /// Lists committed ledger entries for the reporting/export collaborator.
    ///
    /// Export reflects exactly the committed ledger; there are no derived or
    /// estimated rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn export<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        filter: &LedgerExportFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<ledger_entries::Model>, DbErr> {
        let mut query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TenantId.eq(tenant_id.into_inner()));

        if let Some(from) = filter.from {
            let start = from.and_time(chrono::NaiveTime::MIN).and_utc();
            query = query.filter(ledger_entries::Column::OccurredAt.gte(start));
        }
        if let Some(to) = filter.to {
            let end = to.and_time(chrono::NaiveTime::MIN).and_utc() + chrono::Duration::days(1);
            query = query.filter(ledger_entries::Column::OccurredAt.lt(end));
        }
        if let Some(account) = filter.account_code {
            query = query.filter(ledger_entries::Column::AccountCode.eq(account.as_str()));
        }

        let paginator = query
            .order_by_asc(ledger_entries::Column::OccurredAt)
            .order_by_asc(ledger_entries::Column::DedupeKey)
            .order_by_asc(ledger_entries::Column::LineNo)
            .paginate(conn, page.limit());

        let total = paginator.num_items().await?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}
