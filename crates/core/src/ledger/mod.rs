//! Balanced posting groups for the append-only general ledger.
//!
//! This module implements the core ledger functionality:
//! - GL account codes and debit/credit directions
//! - Posting lines and balanced posting groups
//! - Business rule validation (balance, positive amounts)
//! - Error types for ledger operations
//!
//! A posting group is the only shape in which ledger rows are ever created:
//! a set of debit/credit lines that sums to zero net, identified by a
//! tenant-scoped dedupe key.

pub mod error;
pub mod posting;
pub mod types;

#[cfg(test)]
mod posting_props;

pub use error::LedgerError;
pub use posting::{PostingGroup, PostingTotals};
pub use types::{AccountCode, EntryDirection, PostingLine};
