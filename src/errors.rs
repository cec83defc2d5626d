//! Unified error types for `BillBuddy`.
//!
//! Validation variants are raised before anything is written; store errors
//! wrap `SeaORM` failures and are propagated as-is (no retries). Best-effort
//! paths (ledger sync, the auto-archive sweep) never surface here - they
//! report through outcome values and `tracing::warn!` instead.

use crate::core::period::Period;
use thiserror::Error;

/// All errors that can be returned by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or parsing failed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    /// User input rejected before any write
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the invalid input
        message: String,
    },

    /// Amount is zero, negative where positive is required, or non-finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: f64,
    },

    /// Due day outside the accepted 1-31 range
    #[error("Invalid due day: {day} (expected 1-31)")]
    InvalidDueDay {
        /// The offending day value
        day: i32,
    },

    /// No expense with this id visible to the requesting user
    #[error("Expense {id} not found")]
    ExpenseNotFound {
        /// The expense id that was looked up
        id: i64,
    },

    /// No wallet ledger entry with this id visible to the requesting user
    #[error("Wallet entry {id} not found")]
    WalletEntryNotFound {
        /// The ledger entry id that was looked up
        id: i64,
    },

    /// Settlement attempted for a period outside the expense's window
    #[error("Expense {id} is not applicable to period {period}")]
    NotApplicable {
        /// The expense id
        id: i64,
        /// The rejected target period
        period: Period,
    },

    /// The backing store rejected a read or write
    #[error("Database error: {0}")]
    Store(#[from] sea_orm::DbErr),

    /// I/O error (configuration file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
