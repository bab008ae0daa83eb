//! Gateway webhook event normalization.
//!
//! Raw webhook payloads are normalized into `PaymentFact`s, each carrying its
//! own identity key (the *fact key*). The fact key is the idempotency unit:
//! a second partial refund on the same charge has a different refund id and
//! therefore a different fact key, while a redelivered event maps onto the
//! same keys and becomes a no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pinewood_shared::types::{Cents, ReservationId, TenantId};

/// A parsed gateway webhook envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEventEnvelope {
    /// Gateway-assigned event id (`evt_...`).
    pub id: String,
    /// Event type string (e.g. `payment_intent.succeeded`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload: `data.object` is the affected resource.
    pub data: EventData,
}

/// The `data` member of a webhook envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The affected gateway resource.
    pub object: Value,
}

/// Errors produced while normalizing a webhook payload.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A required field is missing or has the wrong type.
    #[error("Malformed event payload: missing or invalid field `{0}`")]
    MissingField(&'static str),
}

/// One normalized financial fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFact {
    /// Funds captured for a payment intent.
    ChargeSucceeded {
        /// Payment intent reference (`pi_...`).
        intent_ref: String,
        /// Charge reference (`ch_...`), when reported.
        charge_ref: Option<String>,
        /// Captured amount in cents.
        amount: Cents,
    },
    /// Funds authorized but not captured. Records an authorized fact only;
    /// never touches paid amounts.
    ChargeAuthorized {
        /// Payment intent reference.
        intent_ref: String,
        /// Authorized amount in cents.
        amount: Cents,
    },
    /// The charge failed.
    ChargeFailed {
        /// Payment intent reference.
        intent_ref: String,
    },
    /// One individual refund, identified by its refund id.
    RefundRecorded {
        /// Charge the refund belongs to.
        charge_ref: String,
        /// Refund id (`re_...`) - the idempotency unit.
        refund_id: String,
        /// This refund's amount in cents.
        amount: Cents,
    },
    /// A cumulative refund report with no itemized refunds; applied as a
    /// delta against the recorded refund total.
    RefundCumulative {
        /// Charge the report belongs to.
        charge_ref: String,
        /// Cumulative refunded cents reported by the gateway.
        cumulative: Cents,
    },
    /// A dispute was opened; funds are withheld.
    DisputeOpened {
        /// Disputed charge.
        charge_ref: String,
        /// Dispute id (`dp_...`).
        dispute_id: String,
        /// Withheld amount in cents.
        amount: Cents,
    },
    /// A dispute was closed.
    DisputeClosed {
        /// Disputed charge.
        charge_ref: String,
        /// Dispute id.
        dispute_id: String,
        /// Final dispute amount in cents.
        amount: Cents,
        /// True when the platform won (funds restored).
        won: bool,
    },
    /// A payout was paid; reconciliation runs separately.
    PayoutPaid {
        /// Payout reference (`po_...`).
        payout_ref: String,
        /// Net payout amount in cents (can be negative).
        amount: Cents,
    },
}

impl PaymentFact {
    /// The tenant-scoped idempotency key for this fact.
    ///
    /// Keys are per financial fact, not per event: two partial refunds on the
    /// same charge have distinct keys, while redelivery of the same refund
    /// collapses onto one.
    #[must_use]
    pub fn fact_key(&self) -> String {
        match self {
            Self::ChargeSucceeded { intent_ref, .. } => format!("charge:{intent_ref}:succeeded"),
            Self::ChargeAuthorized { intent_ref, .. } => format!("charge:{intent_ref}:authorized"),
            Self::ChargeFailed { intent_ref } => format!("charge:{intent_ref}:failed"),
            Self::RefundRecorded { refund_id, .. } => format!("refund:{refund_id}"),
            Self::RefundCumulative { charge_ref, cumulative } => {
                format!("refund-cumulative:{charge_ref}:{}", cumulative.into_inner())
            }
            Self::DisputeOpened { dispute_id, .. } => format!("dispute:{dispute_id}:opened"),
            Self::DisputeClosed { dispute_id, won, .. } => {
                format!("dispute:{dispute_id}:closed:{}", if *won { "won" } else { "lost" })
            }
            Self::PayoutPaid { payout_ref, .. } => format!("payout:{payout_ref}:paid"),
        }
    }
}

/// A normalized webhook event: routing hints plus the facts it asserts.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    /// Gateway event id.
    pub event_id: String,
    /// Original event type string.
    pub event_type: String,
    /// Tenant extracted from resource metadata, when present.
    pub tenant_hint: Option<TenantId>,
    /// Reservation extracted from resource metadata, when present.
    pub reservation_hint: Option<ReservationId>,
    /// The financial facts asserted by this event. Empty for event types the
    /// core does not track (acknowledged and skipped).
    pub facts: Vec<PaymentFact>,
}

fn str_field<'a>(object: &'a Value, key: &'static str) -> Result<&'a str, NormalizeError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or(NormalizeError::MissingField(key))
}

fn cents_field(object: &Value, key: &'static str) -> Result<Cents, NormalizeError> {
    object
        .get(key)
        .and_then(Value::as_i64)
        .map(Cents::new)
        .ok_or(NormalizeError::MissingField(key))
}

fn metadata_id<T: From<uuid::Uuid>>(object: &Value, key: &str) -> Option<T> {
    object
        .get("metadata")
        .and_then(|m| m.get(key))
        .and_then(Value::as_str)
        .and_then(|s| uuid::Uuid::parse_str(s).ok())
        .map(T::from)
}

/// Normalizes a webhook envelope into facts.
///
/// Event types the core does not track normalize to an empty fact list so
/// the caller can acknowledge them without special-casing.
///
/// # Errors
///
/// Returns `MissingField` if a tracked event type lacks a required field.
pub fn normalize(envelope: &GatewayEventEnvelope) -> Result<NormalizedEvent, NormalizeError> {
    let object = &envelope.data.object;
    let tenant_hint: Option<TenantId> = metadata_id(object, "tenant_id");
    let reservation_hint: Option<ReservationId> = metadata_id(object, "reservation_id");

    let facts = match envelope.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent_ref = str_field(object, "id")?.to_string();
            let amount = object
                .get("amount_received")
                .and_then(Value::as_i64)
                .map(Cents::new)
                .map_or_else(|| cents_field(object, "amount"), Ok)?;
            let charge_ref = object
                .get("latest_charge")
                .and_then(Value::as_str)
                .map(ToString::to_string);
            vec![PaymentFact::ChargeSucceeded {
                intent_ref,
                charge_ref,
                amount,
            }]
        }
        "payment_intent.amount_capturable_updated" => {
            let intent_ref = str_field(object, "id")?.to_string();
            let amount = cents_field(object, "amount_capturable")?;
            vec![PaymentFact::ChargeAuthorized { intent_ref, amount }]
        }
        "payment_intent.payment_failed" => {
            let intent_ref = str_field(object, "id")?.to_string();
            vec![PaymentFact::ChargeFailed { intent_ref }]
        }
        "charge.refunded" => {
            let charge_ref = str_field(object, "id")?.to_string();
            let itemized: Vec<PaymentFact> = object
                .get("refunds")
                .and_then(|r| r.get("data"))
                .and_then(Value::as_array)
                .map(|refunds| {
                    refunds
                        .iter()
                        .filter_map(|refund| {
                            let refund_id = refund.get("id")?.as_str()?.to_string();
                            let amount = Cents::new(refund.get("amount")?.as_i64()?);
                            Some(PaymentFact::RefundRecorded {
                                charge_ref: charge_ref.clone(),
                                refund_id,
                                amount,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            if itemized.is_empty() {
                let cumulative = cents_field(object, "amount_refunded")?;
                vec![PaymentFact::RefundCumulative {
                    charge_ref,
                    cumulative,
                }]
            } else {
                itemized
            }
        }
        "charge.dispute.created" => {
            let dispute_id = str_field(object, "id")?.to_string();
            let charge_ref = str_field(object, "charge")?.to_string();
            let amount = cents_field(object, "amount")?;
            vec![PaymentFact::DisputeOpened {
                charge_ref,
                dispute_id,
                amount,
            }]
        }
        "charge.dispute.closed" => {
            let dispute_id = str_field(object, "id")?.to_string();
            let charge_ref = str_field(object, "charge")?.to_string();
            let amount = cents_field(object, "amount")?;
            let won = str_field(object, "status")? == "won";
            vec![PaymentFact::DisputeClosed {
                charge_ref,
                dispute_id,
                amount,
                won,
            }]
        }
        "payout.paid" => {
            let payout_ref = str_field(object, "id")?.to_string();
            let amount = cents_field(object, "amount")?;
            vec![PaymentFact::PayoutPaid { payout_ref, amount }]
        }
        _ => vec![],
    };

    Ok(NormalizedEvent {
        event_id: envelope.id.clone(),
        event_type: envelope.event_type.clone(),
        tenant_hint,
        reservation_hint,
        facts,
    })
}
