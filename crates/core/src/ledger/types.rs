//! Ledger domain types for posting creation and validation.

use serde::{Deserialize, Serialize};

use pinewood_shared::types::Cents;

/// Entry direction: either Debit or Credit.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

impl EntryDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// GL account codes used by the platform's chart of accounts.
///
/// The financial core posts against a fixed chart: guest money flows through
/// clearing into the operating bank account, revenue and fee accounts absorb
/// the income side, and expense accounts carry processing costs and
/// chargebacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCode {
    /// Physical cash collected at the property (POS drawers).
    CashOnHand,
    /// Card money captured by the gateway but not yet paid out.
    BankClearing,
    /// The platform's operating bank account (payout destination).
    BankOperating,
    /// Lodging/guest revenue.
    GuestRevenue,
    /// Platform fee revenue.
    PlatformFeeRevenue,
    /// Gateway processing fee expense.
    ProcessingFees,
    /// Chargeback/dispute expense.
    Chargebacks,
}

impl AccountCode {
    /// Stable string code persisted in ledger rows and used in export filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnHand => "cash_on_hand",
            Self::BankClearing => "bank_clearing",
            Self::BankOperating => "bank_operating",
            Self::GuestRevenue => "guest_revenue",
            Self::PlatformFeeRevenue => "platform_fee_revenue",
            Self::ProcessingFees => "processing_fees",
            Self::Chargebacks => "chargebacks",
        }
    }

    /// All account codes, for iteration and validation.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::CashOnHand,
            Self::BankClearing,
            Self::BankOperating,
            Self::GuestRevenue,
            Self::PlatformFeeRevenue,
            Self::ProcessingFees,
            Self::Chargebacks,
        ]
    }
}

impl std::fmt::Display for AccountCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountCode {
    type Err = super::error::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountCode::all()
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| super::error::LedgerError::UnknownAccountCode(s.to_string()))
    }
}

/// A single debit or credit line within a posting group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// The GL account posted against.
    pub account: AccountCode,
    /// Debit or credit.
    pub direction: EntryDirection,
    /// The line amount in cents (must be strictly positive).
    pub amount: Cents,
}

impl PostingLine {
    /// Creates a debit line.
    #[must_use]
    pub const fn debit(account: AccountCode, amount: Cents) -> Self {
        Self {
            account,
            direction: EntryDirection::Debit,
            amount,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub const fn credit(account: AccountCode, amount: Cents) -> Self {
        Self {
            account,
            direction: EntryDirection::Credit,
            amount,
        }
    }
}
