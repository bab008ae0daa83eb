//! Payout reconciliation runs.
//!
//! A run fetches the payout's full settlement feed first (no database locks
//! held across the HTTP pagination loop), matches lines against recorded
//! payments, then applies writes in short transactions: one upsert per line
//! and one transaction for the reconciling postings.

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use std::collections::HashMap;
use tracing::{info, warn};

use chrono::Utc;
use pinewood_core::ledger::error::LedgerError;
use pinewood_core::ledger::posting::PostingGroup;
use pinewood_core::ledger::types::{AccountCode, PostingLine};
use pinewood_core::reconciliation::{
    GatewayError, InternalPaymentRecord, ReconciliationReport, SettlementGateway, fetch_all_lines,
    match_lines, net_cash_lines,
};
use pinewood_core::reconciliation::matching::{total_fees, total_net};
use pinewood_shared::types::{Cents, PaymentId, TenantId};

use super::payment::PaymentRepository;
use super::payout::PayoutLineRepository;
use super::posting::{PostingError, PostingRepository};

/// Error types for reconciliation runs.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    /// The settlement feed could not be read; retry later.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A core ledger rule rejected a reconciling posting.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PostingError> for ReconciliationError {
    fn from(value: PostingError) -> Self {
        match value {
            PostingError::Ledger(e) => Self::Ledger(e),
            PostingError::Database(e) => Self::Database(e),
        }
    }
}

impl ReconciliationError {
    /// Gateway and database failures are retryable; rule violations are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::Database(_))
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Gateway(_) => 502,
            Self::Ledger(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Ledger(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Repository orchestrating payout reconciliation.
#[derive(Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    payments: PaymentRepository,
    payout_lines: PayoutLineRepository,
    postings: PostingRepository,
    drift_threshold_cents: i64,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        postings: PostingRepository,
        drift_threshold_cents: i64,
    ) -> Self {
        Self {
            db,
            payments: PaymentRepository::new(),
            payout_lines: PayoutLineRepository::new(),
            postings,
            drift_threshold_cents,
        }
    }

    /// Reconciles one payout for a tenant.
    ///
    /// Idempotent: line upserts key on `(tenant_id, balance_transaction_id)`
    /// and the reconciling postings carry payout-scoped dedupe keys, so a
    /// re-run refreshes match state and posts nothing twice.
    ///
    /// # Errors
    ///
    /// Returns `Gateway` (retryable) when the settlement feed cannot be read,
    /// `Ledger` when the reconciling posting is rejected (e.g. closed
    /// period), and `Database` (retryable) on persistence failure.
    pub async fn reconcile(
        &self,
        gateway: &dyn SettlementGateway,
        tenant_id: TenantId,
        payout_ref: &str,
    ) -> Result<ReconciliationReport, ReconciliationError> {
        // Phase 1: pull the complete settlement feed. Nothing is written and
        // no locks are held while this loop runs.
        let lines = fetch_all_lines(gateway, payout_ref).await?;
        info!(
            tenant_id = %tenant_id,
            payout_ref,
            line_count = lines.len(),
            "Settlement feed fetched"
        );

        // Phase 2: build the internal index for every referenced payment.
        let mut index: HashMap<String, InternalPaymentRecord> = HashMap::new();
        for line in &lines {
            let Some(reference) = line.source_ref.as_deref() else {
                continue;
            };
            if index.contains_key(reference) {
                continue;
            }
            let record = self
                .payments
                .find_by_gateway_ref(&self.db, tenant_id, reference)
                .await?
                .or(self
                    .payments
                    .find_charge_by_reference(&self.db, tenant_id, reference)
                    .await?);
            if let Some(payment) = record {
                index.insert(
                    reference.to_string(),
                    InternalPaymentRecord {
                        payment_id: PaymentId::from_uuid(payment.id),
                        gateway_reference_id: reference.to_string(),
                        amount: Cents::new(payment.amount_cents),
                        direction: payment.direction.into(),
                    },
                );
            }
        }

        let matched = match_lines(&lines, &index);

        // Phase 3: upsert each line in its own short transaction.
        for line in &matched {
            self.payout_lines
                .upsert_line(&self.db, tenant_id, payout_ref, line)
                .await?;
        }

        let fees = total_fees(&lines);
        let net = total_net(&lines);
        let drift: Cents = matched.iter().map(|m| m.drift).sum();
        let matched_count = matched.iter().filter(|m| m.matched).count();
        let unmatched_count = matched.len() - matched_count;

        // Phase 4: reconciling postings in one short transaction.
        let posted = self
            .post_reconciling_entries(tenant_id, payout_ref, fees, net)
            .await?;

        let alert = pinewood_core::reconciliation::drift_alert(
            payout_ref,
            drift,
            self.drift_threshold_cents,
        );
        if let Some(alert) = &alert {
            warn!(
                tenant_id = %tenant_id,
                payout_ref = %alert.payout_ref,
                drift_cents = alert.drift.into_inner(),
                severity = ?alert.severity,
                "Drift detected in reconciliation"
            );
        }

        let report = ReconciliationReport {
            tenant_id,
            payout_ref: payout_ref.to_string(),
            total_lines: matched.len(),
            matched_count,
            unmatched_count,
            fees,
            net,
            drift,
            posted,
            alert: alert.clone(),
        };

        info!(
            tenant_id = %tenant_id,
            payout_ref,
            matched = matched_count,
            unmatched = unmatched_count,
            net_cents = net.into_inner(),
            fee_cents = fees.into_inner(),
            posted,
            "Payout reconciled"
        );
        Ok(report)
    }

    /// Posts the gateway fee expense and net cash movement for a payout.
    ///
    /// Returns true when the net-cash group was newly posted by this run.
    async fn post_reconciling_entries(
        &self,
        tenant_id: TenantId,
        payout_ref: &str,
        fees: Cents,
        net: Cents,
    ) -> Result<bool, ReconciliationError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        if fees.is_positive() {
            let fee_group = PostingGroup::new(
                format!("payout:{payout_ref}:fees"),
                now,
                vec![
                    PostingLine::debit(AccountCode::ProcessingFees, fees),
                    PostingLine::credit(AccountCode::BankClearing, fees),
                ],
            )?
            .with_reference(payout_ref);
            self.postings.post_group(&txn, tenant_id, &fee_group).await?;
        }

        let net_lines = net_cash_lines(net);
        let mut newly_posted = false;
        if !net_lines.is_empty() {
            let net_group = PostingGroup::new(format!("payout:{payout_ref}:net"), now, net_lines)?
                .with_reference(payout_ref);
            let receipt = self.postings.post_group(&txn, tenant_id, &net_group).await?;
            newly_posted = !receipt.replayed;
        }

        txn.commit().await?;
        Ok(newly_posted)
    }

    /// The configured drift alert threshold in cents.
    #[must_use]
    pub const fn drift_threshold_cents(&self) -> i64 {
        self.drift_threshold_cents
    }
}
