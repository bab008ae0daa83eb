//! The Payment Event Processor.
//!
//! The idempotent ingestion point for money movements: staff/guest-initiated
//! charges and refunds, and externally delivered gateway lifecycle events.
//! Every branch that changes money state claims its fact key, inserts the
//! payment fact, reprojects the reservation balance, and posts the balanced
//! ledger group inside ONE database transaction; on any failure nothing is
//! persisted and the error is surfaced as retryable where redelivery is safe.

use chrono::Utc;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::{debug, info, warn};

use pinewood_core::balance::{self, BalancePolicy};
use pinewood_core::fees::FeeBreakdown;
use pinewood_core::ledger::error::LedgerError;
use pinewood_core::ledger::posting::PostingGroup;
use pinewood_core::ledger::types::{AccountCode, PostingLine};
use pinewood_core::payment::event::{GatewayEventEnvelope, NormalizedEvent, PaymentFact, normalize};
use pinewood_core::payment::{
    PaymentDirection, PaymentMethod, PaymentState, dispute_delta, refund_delta,
};
use pinewood_shared::notify::{NotificationKind, NotificationService};
use pinewood_shared::types::{Cents, ReservationId, TenantId};

use crate::entities::{payments, reservations};

use super::gateway_event::GatewayEventRepository;
use super::payment::{NewPayment, PaymentRepository};
use super::posting::{PostingError, PostingRepository};
use super::reservation::{ReservationRepository, balance_of};

/// Error types for payment processing.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// A core ledger/balance rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Reservation not found for the tenant.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// Database error; safe to retry thanks to fact-level idempotency.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PostingError> for ProcessorError {
    fn from(value: PostingError) -> Self {
        match value {
            PostingError::Ledger(e) => Self::Ledger(e),
            PostingError::Database(e) => Self::Database(e),
        }
    }
}

impl ProcessorError {
    /// Returns true if the upstream delivery mechanism should redeliver.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(e) => e.http_status_code(),
            Self::ReservationNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }
}

/// Result of a staff/guest-initiated money operation.
#[derive(Debug, Clone)]
pub struct PaymentResult {
    /// The inserted payment fact; `None` when the call was an idempotent
    /// replay and no new fact was written.
    pub payment: Option<payments::Model>,
    /// The reservation after (or unchanged by) the operation.
    pub reservation: reservations::Model,
    /// False for idempotent replays.
    pub applied: bool,
}

/// Result of processing one webhook envelope.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Gateway event id.
    pub event_id: String,
    /// Gateway event type.
    pub event_type: String,
    /// Facts applied by this delivery.
    pub applied: usize,
    /// Facts skipped as already processed.
    pub skipped: usize,
    /// True when the event was quarantined for manual resolution.
    pub quarantined: bool,
}

/// Per-fact application outcome (internal).
enum Step {
    Applied(Option<(ReservationId, Cents, NotificationKind)>),
    Quarantine(String),
}

/// The idempotent payment event processor.
#[derive(Clone)]
pub struct PaymentEventProcessor {
    db: DatabaseConnection,
    payments: PaymentRepository,
    reservations: ReservationRepository,
    postings: PostingRepository,
    events: GatewayEventRepository,
    notifier: NotificationService,
    policy: BalancePolicy,
}

impl PaymentEventProcessor {
    /// Creates a new processor.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        postings: PostingRepository,
        notifier: NotificationService,
    ) -> Self {
        Self {
            db,
            payments: PaymentRepository::new(),
            reservations: ReservationRepository::new(),
            postings,
            events: GatewayEventRepository::new(),
            notifier,
            policy: BalancePolicy::default(),
        }
    }

    // ========================================================================
    // Staff/guest-initiated operations
    // ========================================================================

    /// Records a charge against a reservation.
    ///
    /// Idempotent on `idempotency_key`: a replay returns the current
    /// reservation state with `applied = false`. When a fee breakdown is
    /// given, the posting splits revenue across the platform fee accounts and
    /// the paid-amount projection moves by the base amount.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` errors for rule rejections (period closed, invalid
    /// amounts) and `Database` errors (retryable) on persistence failure.
    pub async fn record_payment(
        &self,
        tenant_id: TenantId,
        reservation_id: ReservationId,
        amount: Cents,
        method: PaymentMethod,
        idempotency_key: &str,
        fees: Option<&FeeBreakdown>,
    ) -> Result<PaymentResult, ProcessorError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeAmount.into());
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount.into());
        }

        let fact_key = format!("api-payment:{idempotency_key}");
        let txn = self.db.begin().await?;

        let newly_claimed = self
            .events
            .try_record_fact(&txn, tenant_id, idempotency_key, "payment.recorded", &fact_key)
            .await?;
        if !newly_claimed {
            txn.rollback().await?;
            let reservation = self
                .reservations
                .get(&self.db, tenant_id, reservation_id)
                .await?
                .ok_or(ProcessorError::ReservationNotFound(reservation_id))?;
            debug!(
                tenant_id = %tenant_id,
                reservation_id = %reservation_id,
                idempotency_key,
                "Replayed payment request, returning recorded state"
            );
            return Ok(PaymentResult {
                payment: None,
                reservation,
                applied: false,
            });
        }

        let model = self
            .reservations
            .find_for_update(&txn, tenant_id, reservation_id)
            .await?
            .ok_or(ProcessorError::ReservationNotFound(reservation_id))?;

        let charge_total = fees.map_or(amount, |f| f.charge_total);
        let paid_delta = fees.map_or(amount, |f| f.base_amount);

        let debit_account = if method.settles_via_gateway() {
            AccountCode::BankClearing
        } else {
            AccountCode::CashOnHand
        };

        let mut lines = vec![PostingLine::debit(debit_account, charge_total)];
        let mut revenue = charge_total;
        if let Some(f) = fees {
            if f.platform_fee.is_positive() {
                lines.push(PostingLine::credit(AccountCode::PlatformFeeRevenue, f.platform_fee));
                revenue = revenue - f.platform_fee;
            }
            if f.gateway_fee_passed.is_positive() {
                lines.push(PostingLine::credit(AccountCode::ProcessingFees, f.gateway_fee_passed));
                revenue = revenue - f.gateway_fee_passed;
            }
        }
        lines.push(PostingLine::credit(AccountCode::GuestRevenue, revenue));

        let now = Utc::now();
        let group = PostingGroup::new(fact_key, now, lines)?.with_reservation(reservation_id);

        let (total, paid) = balance_of(&model);
        let projected = balance::project(total, paid, paid_delta, self.policy);

        let payment = self
            .payments
            .insert(
                &txn,
                NewPayment {
                    tenant_id,
                    reservation_id,
                    direction: PaymentDirection::Charge,
                    method,
                    state: PaymentState::Succeeded,
                    amount: charge_total,
                    gateway_reference_id: None,
                    charge_reference_id: None,
                    occurred_at: now,
                },
            )
            .await?;

        self.postings.post_group(&txn, tenant_id, &group).await?;
        let reservation = self
            .reservations
            .apply_balance(&txn, model, &projected)
            .await?;

        txn.commit().await?;

        info!(
            tenant_id = %tenant_id,
            reservation_id = %reservation_id,
            amount_cents = charge_total.into_inner(),
            method = ?method,
            "Payment recorded"
        );
        self.notifier
            .send_detached(tenant_id, reservation_id, charge_total, NotificationKind::Receipt);

        Ok(PaymentResult {
            payment: Some(payment),
            reservation,
            applied: true,
        })
    }

    /// Records a refund against a reservation.
    ///
    /// Validates `amount <= paid_amount_cents` under the row lock before any
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `Ledger(InsufficientFundsForRefund)` when the amount exceeds
    /// the recorded paid amount, other `Ledger` errors for rule rejections,
    /// and `Database` (retryable) on persistence failure.
    pub async fn record_refund(
        &self,
        tenant_id: TenantId,
        reservation_id: ReservationId,
        amount: Cents,
        destination: PaymentMethod,
    ) -> Result<PaymentResult, ProcessorError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeAmount.into());
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount.into());
        }

        let txn = self.db.begin().await?;

        let model = self
            .reservations
            .find_for_update(&txn, tenant_id, reservation_id)
            .await?
            .ok_or(ProcessorError::ReservationNotFound(reservation_id))?;

        let (total, paid) = balance_of(&model);
        balance::validate_refundable(paid, amount)?;

        let now = Utc::now();
        let payment = self
            .payments
            .insert(
                &txn,
                NewPayment {
                    tenant_id,
                    reservation_id,
                    direction: PaymentDirection::Refund,
                    method: destination,
                    state: PaymentState::Succeeded,
                    amount,
                    gateway_reference_id: None,
                    charge_reference_id: None,
                    occurred_at: now,
                },
            )
            .await?;

        let credit_account = if destination.settles_via_gateway() {
            AccountCode::BankClearing
        } else {
            AccountCode::CashOnHand
        };
        let group = PostingGroup::new(
            format!("api-refund:{}", payment.id),
            now,
            vec![
                PostingLine::debit(AccountCode::GuestRevenue, amount),
                PostingLine::credit(credit_account, amount),
            ],
        )?
        .with_reservation(reservation_id);

        let projected = balance::project(total, paid, -amount, self.policy);

        self.postings.post_group(&txn, tenant_id, &group).await?;
        let reservation = self
            .reservations
            .apply_balance(&txn, model, &projected)
            .await?;

        txn.commit().await?;

        info!(
            tenant_id = %tenant_id,
            reservation_id = %reservation_id,
            amount_cents = amount.into_inner(),
            destination = ?destination,
            "Refund recorded"
        );
        self.notifier
            .send_detached(tenant_id, reservation_id, amount, NotificationKind::RefundNotice);

        Ok(PaymentResult {
            payment: Some(payment),
            reservation,
            applied: true,
        })
    }

    // ========================================================================
    // Webhook ingestion
    // ========================================================================

    /// Processes one gateway webhook envelope.
    ///
    /// Safe under at-least-once delivery: every fact is applied exactly once,
    /// and a redelivered envelope reports its facts as skipped. Events that
    /// cannot be mapped to a tenant (or are malformed) are quarantined and
    /// acknowledged rather than crashing the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `Database` (retryable) when persistence fails mid-application;
    /// the aborted fact transaction leaves no partial state behind.
    pub async fn process_envelope(
        &self,
        envelope: &GatewayEventEnvelope,
    ) -> Result<ProcessOutcome, ProcessorError> {
        let normalized = match normalize(envelope) {
            Ok(n) => n,
            Err(e) => {
                warn!(event_id = %envelope.id, error = %e, "Malformed gateway event, quarantining");
                self.events
                    .quarantine(
                        &self.db,
                        &envelope.id,
                        &envelope.event_type,
                        envelope.data.object.clone(),
                        &e.to_string(),
                    )
                    .await?;
                return Ok(ProcessOutcome {
                    event_id: envelope.id.clone(),
                    event_type: envelope.event_type.clone(),
                    applied: 0,
                    skipped: 0,
                    quarantined: true,
                });
            }
        };

        if normalized.facts.is_empty() {
            debug!(
                event_id = %normalized.event_id,
                event_type = %normalized.event_type,
                "Ignoring untracked gateway event type"
            );
            return Ok(ProcessOutcome {
                event_id: normalized.event_id,
                event_type: normalized.event_type,
                applied: 0,
                skipped: 0,
                quarantined: false,
            });
        }

        let Some(tenant_id) = self.resolve_tenant(&normalized).await? else {
            warn!(
                event_id = %normalized.event_id,
                event_type = %normalized.event_type,
                "Gateway event has no tenant mapping, quarantining"
            );
            self.events
                .quarantine(
                    &self.db,
                    &normalized.event_id,
                    &normalized.event_type,
                    envelope.data.object.clone(),
                    "no tenant mapping",
                )
                .await?;
            return Ok(ProcessOutcome {
                event_id: normalized.event_id,
                event_type: normalized.event_type,
                applied: 0,
                skipped: 0,
                quarantined: true,
            });
        };

        let mut applied = 0;
        let mut skipped = 0;
        for fact in &normalized.facts {
            match self.apply_fact(tenant_id, &normalized, fact).await? {
                FactDisposition::Applied => applied += 1,
                FactDisposition::Skipped => skipped += 1,
                FactDisposition::Quarantined(reason) => {
                    self.events
                        .quarantine(
                            &self.db,
                            &normalized.event_id,
                            &normalized.event_type,
                            envelope.data.object.clone(),
                            &reason,
                        )
                        .await?;
                    return Ok(ProcessOutcome {
                        event_id: normalized.event_id,
                        event_type: normalized.event_type,
                        applied,
                        skipped,
                        quarantined: true,
                    });
                }
            }
        }

        info!(
            event_id = %normalized.event_id,
            event_type = %normalized.event_type,
            tenant_id = %tenant_id,
            applied,
            skipped,
            "Gateway event processed"
        );
        Ok(ProcessOutcome {
            event_id: normalized.event_id,
            event_type: normalized.event_type,
            applied,
            skipped,
            quarantined: false,
        })
    }

    /// Maps an event to its tenant: resource metadata first, then recorded
    /// payment facts by gateway reference.
    async fn resolve_tenant(
        &self,
        event: &NormalizedEvent,
    ) -> Result<Option<TenantId>, ProcessorError> {
        if let Some(tenant) = event.tenant_hint {
            return Ok(Some(tenant));
        }

        for fact in &event.facts {
            let reference = match fact {
                PaymentFact::ChargeSucceeded { intent_ref, .. }
                | PaymentFact::ChargeAuthorized { intent_ref, .. }
                | PaymentFact::ChargeFailed { intent_ref } => Some(intent_ref.as_str()),
                PaymentFact::RefundRecorded { charge_ref, .. }
                | PaymentFact::RefundCumulative { charge_ref, .. }
                | PaymentFact::DisputeOpened { charge_ref, .. }
                | PaymentFact::DisputeClosed { charge_ref, .. } => Some(charge_ref.as_str()),
                PaymentFact::PayoutPaid { .. } => None,
            };
            if let Some(reference) = reference {
                if let Some(tenant) = self.payments.resolve_tenant(&self.db, reference).await? {
                    return Ok(Some(tenant));
                }
            }
        }

        Ok(None)
    }

    /// Applies one fact in its own transaction.
    async fn apply_fact(
        &self,
        tenant_id: TenantId,
        event: &NormalizedEvent,
        fact: &PaymentFact,
    ) -> Result<FactDisposition, ProcessorError> {
        let fact_key = fact.fact_key();
        let txn = self.db.begin().await?;

        let newly_claimed = self
            .events
            .try_record_fact(&txn, tenant_id, &event.event_id, &event.event_type, &fact_key)
            .await?;
        if !newly_claimed {
            txn.rollback().await?;
            debug!(
                tenant_id = %tenant_id,
                fact_key = %fact_key,
                "Fact already processed, skipping re-application"
            );
            return Ok(FactDisposition::Skipped);
        }

        let step = match fact {
            PaymentFact::ChargeSucceeded {
                intent_ref,
                charge_ref,
                amount,
            } => {
                self.apply_charge_succeeded(
                    &txn,
                    tenant_id,
                    event,
                    &fact_key,
                    intent_ref,
                    charge_ref.as_deref(),
                    *amount,
                )
                .await?
            }
            PaymentFact::ChargeAuthorized { intent_ref, amount } => {
                self.apply_charge_authorized(&txn, tenant_id, event, intent_ref, *amount)
                    .await?
            }
            PaymentFact::ChargeFailed { intent_ref } => {
                self.apply_charge_failed(&txn, tenant_id, intent_ref).await?
            }
            PaymentFact::RefundRecorded {
                charge_ref,
                refund_id,
                amount,
            } => {
                self.apply_refund(&txn, tenant_id, &fact_key, charge_ref, refund_id, *amount)
                    .await?
            }
            PaymentFact::RefundCumulative {
                charge_ref,
                cumulative,
            } => {
                let recorded = self
                    .payments
                    .refunded_total_for_charge(&txn, tenant_id, charge_ref)
                    .await?;
                let delta = refund_delta(*cumulative, recorded);
                if delta.is_zero() {
                    debug!(
                        tenant_id = %tenant_id,
                        charge_ref = %charge_ref,
                        cumulative_cents = cumulative.into_inner(),
                        "Cumulative refund report already covered by recorded refunds"
                    );
                    Step::Applied(None)
                } else {
                    self.apply_refund(&txn, tenant_id, &fact_key, charge_ref, &fact_key, delta)
                        .await?
                }
            }
            PaymentFact::DisputeOpened {
                charge_ref,
                dispute_id,
                amount,
            } => {
                self.apply_dispute_opened(&txn, tenant_id, &fact_key, charge_ref, dispute_id, *amount)
                    .await?
            }
            PaymentFact::DisputeClosed {
                charge_ref,
                dispute_id,
                amount,
                won,
            } => {
                self.apply_dispute_closed(
                    &txn, tenant_id, &fact_key, charge_ref, dispute_id, *amount, *won,
                )
                .await?
            }
            PaymentFact::PayoutPaid { payout_ref, amount } => {
                info!(
                    tenant_id = %tenant_id,
                    payout_ref = %payout_ref,
                    amount_cents = amount.into_inner(),
                    "Payout paid; reconciliation runs on schedule"
                );
                Step::Applied(None)
            }
        };

        match step {
            Step::Applied(notice) => {
                txn.commit().await?;
                if let Some((reservation_id, amount, kind)) = notice {
                    self.notifier.send_detached(tenant_id, reservation_id, amount, kind);
                }
                Ok(FactDisposition::Applied)
            }
            Step::Quarantine(reason) => {
                txn.rollback().await?;
                Ok(FactDisposition::Quarantined(reason))
            }
        }
    }

    async fn apply_charge_succeeded(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        event: &NormalizedEvent,
        fact_key: &str,
        intent_ref: &str,
        charge_ref: Option<&str>,
        amount: Cents,
    ) -> Result<Step, ProcessorError> {
        let existing = self
            .payments
            .find_by_gateway_ref(txn, tenant_id, intent_ref)
            .await?;

        let reservation_id = existing
            .as_ref()
            .map(|p| ReservationId::from_uuid(p.reservation_id))
            .or(event.reservation_hint);
        let Some(reservation_id) = reservation_id else {
            return Ok(Step::Quarantine(format!(
                "charge {intent_ref} has no reservation mapping"
            )));
        };

        let Some(model) = self
            .reservations
            .find_for_update(txn, tenant_id, reservation_id)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "reservation {reservation_id} not found for charge {intent_ref}"
            )));
        };

        match existing {
            Some(row) => {
                let current: PaymentState = row.state.into();
                if current.can_transition(PaymentState::Succeeded) {
                    self.payments
                        .set_state(txn, row, PaymentState::Succeeded)
                        .await?;
                } else {
                    warn!(
                        tenant_id = %tenant_id,
                        intent_ref,
                        state = %current,
                        "Charge succeeded for a payment not awaiting capture"
                    );
                }
            }
            None => {
                self.payments
                    .insert(
                        txn,
                        NewPayment {
                            tenant_id,
                            reservation_id,
                            direction: PaymentDirection::Charge,
                            method: PaymentMethod::Card,
                            state: PaymentState::Succeeded,
                            amount,
                            gateway_reference_id: Some(intent_ref.to_string()),
                            charge_reference_id: charge_ref.map(ToString::to_string),
                            occurred_at: Utc::now(),
                        },
                    )
                    .await?;
            }
        }

        let now = Utc::now();
        let group = PostingGroup::new(
            fact_key,
            now,
            vec![
                PostingLine::debit(AccountCode::BankClearing, amount),
                PostingLine::credit(AccountCode::GuestRevenue, amount),
            ],
        )?
        .with_reservation(reservation_id)
        .with_reference(intent_ref);

        let (total, paid) = balance_of(&model);
        let projected = balance::project(total, paid, amount, self.policy);

        self.postings.post_group(txn, tenant_id, &group).await?;
        self.reservations.apply_balance(txn, model, &projected).await?;

        Ok(Step::Applied(Some((
            reservation_id,
            amount,
            NotificationKind::Receipt,
        ))))
    }

    async fn apply_charge_authorized(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        event: &NormalizedEvent,
        intent_ref: &str,
        amount: Cents,
    ) -> Result<Step, ProcessorError> {
        let existing = self
            .payments
            .find_by_gateway_ref(txn, tenant_id, intent_ref)
            .await?;
        if existing.is_some() {
            // Authorization arriving after the intent is already tracked
            // (commonly after capture) records nothing new.
            return Ok(Step::Applied(None));
        }

        let Some(reservation_id) = event.reservation_hint else {
            return Ok(Step::Quarantine(format!(
                "authorization {intent_ref} has no reservation mapping"
            )));
        };

        // Authorized only: a payment fact is recorded, but paid amounts,
        // balance, and status are untouched until capture.
        self.payments
            .insert(
                txn,
                NewPayment {
                    tenant_id,
                    reservation_id,
                    direction: PaymentDirection::Charge,
                    method: PaymentMethod::Card,
                    state: PaymentState::Authorized,
                    amount,
                    gateway_reference_id: Some(intent_ref.to_string()),
                    charge_reference_id: None,
                    occurred_at: Utc::now(),
                },
            )
            .await?;

        Ok(Step::Applied(None))
    }

    async fn apply_charge_failed(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        intent_ref: &str,
    ) -> Result<Step, ProcessorError> {
        if let Some(row) = self
            .payments
            .find_by_gateway_ref(txn, tenant_id, intent_ref)
            .await?
        {
            let current: PaymentState = row.state.into();
            if current.can_transition(PaymentState::Failed) {
                self.payments.set_state(txn, row, PaymentState::Failed).await?;
            }
        }
        Ok(Step::Applied(None))
    }

    async fn apply_refund(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        fact_key: &str,
        charge_ref: &str,
        refund_identity: &str,
        amount: Cents,
    ) -> Result<Step, ProcessorError> {
        let Some(charge) = self
            .payments
            .find_charge_by_reference(txn, tenant_id, charge_ref)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "refund {refund_identity} references unknown charge {charge_ref}"
            )));
        };

        let reservation_id = ReservationId::from_uuid(charge.reservation_id);
        let Some(model) = self
            .reservations
            .find_for_update(txn, tenant_id, reservation_id)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "reservation {reservation_id} not found for refund {refund_identity}"
            )));
        };

        let method: PaymentMethod = charge.method.into();
        let now = Utc::now();
        self.payments
            .insert(
                txn,
                NewPayment {
                    tenant_id,
                    reservation_id,
                    direction: PaymentDirection::Refund,
                    method,
                    state: PaymentState::Succeeded,
                    amount,
                    gateway_reference_id: Some(refund_identity.to_string()),
                    charge_reference_id: Some(charge_ref.to_string()),
                    occurred_at: now,
                },
            )
            .await?;

        // Running total including the row just inserted.
        let refunded_total = self
            .payments
            .refunded_total_for_charge(txn, tenant_id, charge_ref)
            .await?;
        let charge_amount = Cents::new(charge.amount_cents);
        let current: PaymentState = charge.state.into();
        let next = PaymentState::after_refund(charge_amount, refunded_total);
        if current.can_transition(next) {
            self.payments.set_state(txn, charge, next).await?;
        }

        let credit_account = if method.settles_via_gateway() {
            AccountCode::BankClearing
        } else {
            AccountCode::CashOnHand
        };
        let group = PostingGroup::new(
            fact_key,
            now,
            vec![
                PostingLine::debit(AccountCode::GuestRevenue, amount),
                PostingLine::credit(credit_account, amount),
            ],
        )?
        .with_reservation(reservation_id)
        .with_reference(refund_identity);

        let (total, paid) = balance_of(&model);
        let projected = balance::project(total, paid, -amount, self.policy);

        self.postings.post_group(txn, tenant_id, &group).await?;
        self.reservations.apply_balance(txn, model, &projected).await?;

        Ok(Step::Applied(Some((
            reservation_id,
            amount,
            NotificationKind::RefundNotice,
        ))))
    }

    async fn apply_dispute_opened(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        fact_key: &str,
        charge_ref: &str,
        dispute_id: &str,
        amount: Cents,
    ) -> Result<Step, ProcessorError> {
        let Some(charge) = self
            .payments
            .find_charge_by_reference(txn, tenant_id, charge_ref)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "dispute {dispute_id} references unknown charge {charge_ref}"
            )));
        };

        let reservation_id = ReservationId::from_uuid(charge.reservation_id);
        let Some(model) = self
            .reservations
            .find_for_update(txn, tenant_id, reservation_id)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "reservation {reservation_id} not found for dispute {dispute_id}"
            )));
        };

        let now = Utc::now();
        self.payments
            .insert(
                txn,
                NewPayment {
                    tenant_id,
                    reservation_id,
                    direction: PaymentDirection::Refund,
                    method: charge.method.into(),
                    state: PaymentState::Succeeded,
                    amount,
                    gateway_reference_id: Some(dispute_id.to_string()),
                    charge_reference_id: Some(charge_ref.to_string()),
                    occurred_at: now,
                },
            )
            .await?;

        let current: PaymentState = charge.state.into();
        if current.can_transition(PaymentState::Disputed) {
            self.payments.set_state(txn, charge, PaymentState::Disputed).await?;
        }

        let group = PostingGroup::new(
            fact_key,
            now,
            vec![
                PostingLine::debit(AccountCode::Chargebacks, amount),
                PostingLine::credit(AccountCode::BankClearing, amount),
            ],
        )?
        .with_reservation(reservation_id)
        .with_reference(dispute_id);

        let (total, paid) = balance_of(&model);
        let projected = balance::project(total, paid, -amount, self.policy);

        self.postings.post_group(txn, tenant_id, &group).await?;
        self.reservations.apply_balance(txn, model, &projected).await?;

        Ok(Step::Applied(None))
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_dispute_closed(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        fact_key: &str,
        charge_ref: &str,
        dispute_id: &str,
        amount: Cents,
        won: bool,
    ) -> Result<Step, ProcessorError> {
        let Some(charge) = self
            .payments
            .find_charge_by_reference(txn, tenant_id, charge_ref)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "dispute {dispute_id} references unknown charge {charge_ref}"
            )));
        };

        let reservation_id = ReservationId::from_uuid(charge.reservation_id);
        let Some(model) = self
            .reservations
            .find_for_update(txn, tenant_id, reservation_id)
            .await?
        else {
            return Ok(Step::Quarantine(format!(
                "reservation {reservation_id} not found for dispute {dispute_id}"
            )));
        };

        let recorded = self.payments.dispute_total(txn, tenant_id, dispute_id).await?;
        // Won: everything withheld comes back. Lost: the withheld total must
        // land exactly on the final dispute amount.
        let target = if won { Cents::ZERO } else { amount };
        let adjust = dispute_delta(target, recorded);

        let now = Utc::now();
        if !adjust.is_zero() {
            let magnitude = adjust.abs();
            let (direction, lines) = if adjust.is_positive() {
                (
                    PaymentDirection::Refund,
                    vec![
                        PostingLine::debit(AccountCode::Chargebacks, magnitude),
                        PostingLine::credit(AccountCode::BankClearing, magnitude),
                    ],
                )
            } else {
                (
                    PaymentDirection::Charge,
                    vec![
                        PostingLine::debit(AccountCode::BankClearing, magnitude),
                        PostingLine::credit(AccountCode::Chargebacks, magnitude),
                    ],
                )
            };

            self.payments
                .insert(
                    txn,
                    NewPayment {
                        tenant_id,
                        reservation_id,
                        direction,
                        method: charge.method.into(),
                        state: PaymentState::Succeeded,
                        amount: magnitude,
                        gateway_reference_id: Some(dispute_id.to_string()),
                        charge_reference_id: Some(charge_ref.to_string()),
                        occurred_at: now,
                    },
                )
                .await?;

            let group = PostingGroup::new(fact_key, now, lines)?
                .with_reservation(reservation_id)
                .with_reference(dispute_id);

            let (total, paid) = balance_of(&model);
            let delta = -adjust;
            let projected = balance::project(total, paid, delta, self.policy);

            self.postings.post_group(txn, tenant_id, &group).await?;
            self.reservations.apply_balance(txn, model, &projected).await?;
        }

        let current: PaymentState = charge.state.into();
        let next = if won {
            PaymentState::Succeeded
        } else {
            PaymentState::ChargedBack
        };
        if current.can_transition(next) {
            self.payments.set_state(txn, charge, next).await?;
        }

        Ok(Step::Applied(None))
    }
}

/// Per-fact disposition reported back to the envelope loop.
enum FactDisposition {
    Applied,
    Skipped,
    Quarantined(String),
}
