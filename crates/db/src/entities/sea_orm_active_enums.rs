//! Database-side enums mirroring the core domain enums.
//!
//! The core crate has no `SeaORM` dependency, so each Postgres enum gets a
//! database twin here with lossless conversions in both directions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use pinewood_core::balance::ReservationPaymentStatus;
use pinewood_core::ledger::types::EntryDirection as CoreEntryDirection;
use pinewood_core::payment::{PaymentDirection as CorePaymentDirection, PaymentMethod as CorePaymentMethod, PaymentState as CorePaymentState};
use pinewood_core::period::PeriodStatus as CorePeriodStatus;
use pinewood_core::reconciliation::SettlementLineType as CoreSettlementLineType;

/// Ledger entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_direction")]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// Debit entry.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Credit entry.
    #[sea_orm(string_value = "credit")]
    Credit,
}

impl From<CoreEntryDirection> for EntryDirection {
    fn from(value: CoreEntryDirection) -> Self {
        match value {
            CoreEntryDirection::Debit => Self::Debit,
            CoreEntryDirection::Credit => Self::Credit,
        }
    }
}

impl From<EntryDirection> for CoreEntryDirection {
    fn from(value: EntryDirection) -> Self {
        match value {
            EntryDirection::Debit => Self::Debit,
            EntryDirection::Credit => Self::Credit,
        }
    }
}

/// Payment direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_direction")]
#[serde(rename_all = "lowercase")]
pub enum PaymentDirection {
    /// Money in.
    #[sea_orm(string_value = "charge")]
    Charge,
    /// Money out.
    #[sea_orm(string_value = "refund")]
    Refund,
}

impl From<CorePaymentDirection> for PaymentDirection {
    fn from(value: CorePaymentDirection) -> Self {
        match value {
            CorePaymentDirection::Charge => Self::Charge,
            CorePaymentDirection::Refund => Self::Refund,
        }
    }
}

impl From<PaymentDirection> for CorePaymentDirection {
    fn from(value: PaymentDirection) -> Self {
        match value {
            PaymentDirection::Charge => Self::Charge,
            PaymentDirection::Refund => Self::Refund,
        }
    }
}

/// Payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the gateway.
    #[sea_orm(string_value = "card")]
    Card,
    /// Cash at the property.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Digital wallet.
    #[sea_orm(string_value = "wallet")]
    Wallet,
    /// Paper check.
    #[sea_orm(string_value = "check")]
    Check,
    /// Point-of-sale terminal tender.
    #[sea_orm(string_value = "pos_terminal")]
    PosTerminal,
}

impl From<CorePaymentMethod> for PaymentMethod {
    fn from(value: CorePaymentMethod) -> Self {
        match value {
            CorePaymentMethod::Card => Self::Card,
            CorePaymentMethod::Cash => Self::Cash,
            CorePaymentMethod::Wallet => Self::Wallet,
            CorePaymentMethod::Check => Self::Check,
            CorePaymentMethod::PosTerminal => Self::PosTerminal,
        }
    }
}

impl From<PaymentMethod> for CorePaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Card => Self::Card,
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Wallet => Self::Wallet,
            PaymentMethod::Check => Self::Check,
            PaymentMethod::PosTerminal => Self::PosTerminal,
        }
    }
}

/// Payment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_state")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Intent created, no money movement.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Authorized, not captured.
    #[sea_orm(string_value = "authorized")]
    Authorized,
    /// Captured.
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    /// Partially refunded.
    #[sea_orm(string_value = "partially_refunded")]
    PartiallyRefunded,
    /// Fully refunded.
    #[sea_orm(string_value = "refunded")]
    Refunded,
    /// Dispute open.
    #[sea_orm(string_value = "disputed")]
    Disputed,
    /// Dispute lost.
    #[sea_orm(string_value = "charged_back")]
    ChargedBack,
    /// Charge failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<CorePaymentState> for PaymentState {
    fn from(value: CorePaymentState) -> Self {
        match value {
            CorePaymentState::Pending => Self::Pending,
            CorePaymentState::Authorized => Self::Authorized,
            CorePaymentState::Succeeded => Self::Succeeded,
            CorePaymentState::PartiallyRefunded => Self::PartiallyRefunded,
            CorePaymentState::Refunded => Self::Refunded,
            CorePaymentState::Disputed => Self::Disputed,
            CorePaymentState::ChargedBack => Self::ChargedBack,
            CorePaymentState::Failed => Self::Failed,
        }
    }
}

impl From<PaymentState> for CorePaymentState {
    fn from(value: PaymentState) -> Self {
        match value {
            PaymentState::Pending => Self::Pending,
            PaymentState::Authorized => Self::Authorized,
            PaymentState::Succeeded => Self::Succeeded,
            PaymentState::PartiallyRefunded => Self::PartiallyRefunded,
            PaymentState::Refunded => Self::Refunded,
            PaymentState::Disputed => Self::Disputed,
            PaymentState::ChargedBack => Self::ChargedBack,
            PaymentState::Failed => Self::Failed,
        }
    }
}

/// Reservation payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reservation_payment_status")]
#[serde(rename_all = "lowercase")]
pub enum ReservationPaymentStatusDb {
    /// Nothing paid.
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Partially paid.
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Paid in full.
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl From<ReservationPaymentStatus> for ReservationPaymentStatusDb {
    fn from(value: ReservationPaymentStatus) -> Self {
        match value {
            ReservationPaymentStatus::Unpaid => Self::Unpaid,
            ReservationPaymentStatus::Partial => Self::Partial,
            ReservationPaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<ReservationPaymentStatusDb> for ReservationPaymentStatus {
    fn from(value: ReservationPaymentStatusDb) -> Self {
        match value {
            ReservationPaymentStatusDb::Unpaid => Self::Unpaid,
            ReservationPaymentStatusDb::Partial => Self::Partial,
            ReservationPaymentStatusDb::Paid => Self::Paid,
        }
    }
}

/// GL period status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "gl_period_status")]
#[serde(rename_all = "lowercase")]
pub enum GlPeriodStatus {
    /// Open for posting.
    #[sea_orm(string_value = "open")]
    Open,
    /// Closed, no new postings.
    #[sea_orm(string_value = "closed")]
    Closed,
    /// Locked, no postings or changes.
    #[sea_orm(string_value = "locked")]
    Locked,
}

impl From<CorePeriodStatus> for GlPeriodStatus {
    fn from(value: CorePeriodStatus) -> Self {
        match value {
            CorePeriodStatus::Open => Self::Open,
            CorePeriodStatus::Closed => Self::Closed,
            CorePeriodStatus::Locked => Self::Locked,
        }
    }
}

impl From<GlPeriodStatus> for CorePeriodStatus {
    fn from(value: GlPeriodStatus) -> Self {
        match value {
            GlPeriodStatus::Open => Self::Open,
            GlPeriodStatus::Closed => Self::Closed,
            GlPeriodStatus::Locked => Self::Locked,
        }
    }
}

/// Settlement line classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "settlement_line_type")]
#[serde(rename_all = "snake_case")]
pub enum SettlementLineTypeDb {
    /// A captured charge.
    #[sea_orm(string_value = "charge")]
    Charge,
    /// A refund.
    #[sea_orm(string_value = "refund")]
    Refund,
    /// A gateway fee line.
    #[sea_orm(string_value = "fee")]
    Fee,
    /// A chargeback withdrawal.
    #[sea_orm(string_value = "chargeback")]
    Chargeback,
    /// A manual gateway adjustment.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl From<CoreSettlementLineType> for SettlementLineTypeDb {
    fn from(value: CoreSettlementLineType) -> Self {
        match value {
            CoreSettlementLineType::Charge => Self::Charge,
            CoreSettlementLineType::Refund => Self::Refund,
            CoreSettlementLineType::Fee => Self::Fee,
            CoreSettlementLineType::Chargeback => Self::Chargeback,
            CoreSettlementLineType::Adjustment => Self::Adjustment,
        }
    }
}

impl From<SettlementLineTypeDb> for CoreSettlementLineType {
    fn from(value: SettlementLineTypeDb) -> Self {
        match value {
            SettlementLineTypeDb::Charge => Self::Charge,
            SettlementLineTypeDb::Refund => Self::Refund,
            SettlementLineTypeDb::Fee => Self::Fee,
            SettlementLineTypeDb::Chargeback => Self::Chargeback,
            SettlementLineTypeDb::Adjustment => Self::Adjustment,
        }
    }
}
