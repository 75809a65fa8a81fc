//! Error types for the account ledger
//!
//! This module defines the failures that can occur while serving requests.
//! Business outcomes (unknown account, bad amount, duplicate account) are NOT
//! errors: they travel as result codes inside the response types.
//!
//! # Error Categories
//!
//! - **Storage Errors**: The backend failed to answer a call
//! - **Invariant Violations**: The backend contradicted the locking discipline
//!   (compare-and-set mismatch, duplicate insert). These are never retried.
//! - **Lifecycle Errors**: A completion was dropped before it was resolved
//! - **Replay Errors**: File I/O, CSV parsing and configuration problems

use super::account::{AccountId, Amount};
use thiserror::Error;

/// Main error type for the ledger
///
/// Every variant that can reach a caller through a completion handle is
/// reported to the transport layer as INTERNAL_ERROR.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The storage backend failed to execute a call
    #[error("Storage failure: {message}")]
    Storage {
        /// Backend-provided description
        message: String,
    },

    /// Compare-and-set found a balance other than the expected one
    ///
    /// With correct locking this cannot happen; it is an invariant violation.
    #[error("Balance mismatch for account {account}: expected {expected}, found {actual}")]
    BalanceMismatch {
        /// Account whose row was updated
        account: AccountId,
        /// Balance the caller read under lock
        expected: Amount,
        /// Balance the backend actually holds
        actual: Amount,
    },

    /// Compare-and-set targeted a row that does not exist
    #[error("Account {account} vanished while locked")]
    AccountMissing {
        /// Account whose row was expected
        account: AccountId,
    },

    /// Insert found an existing row for the account
    #[error("Account {account} already has a row")]
    AccountConflict {
        /// Account that was inserted twice
        account: AccountId,
    },

    /// The completion handle was dropped without a result
    ///
    /// Happens when the processor shuts down with queued requests, or when
    /// a handler panicked.
    #[error("Request was abandoned before completion")]
    Abandoned,

    /// I/O error while reading or writing replay files
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A CSV row parsed but does not describe a valid request
    #[error("Invalid request record{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    InvalidRecord {
        /// Line number of the record (if available)
        line: Option<u64>,
        /// What is wrong with it
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },
}

impl LedgerError {
    /// Whether the error means the backend disagreed with the lock table
    ///
    /// Such errors point at a bug in the locking discipline and must never be
    /// retried.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::BalanceMismatch { .. }
                | LedgerError::AccountMissing { .. }
                | LedgerError::AccountConflict { .. }
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        LedgerError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::Config {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage {
            message: message.into(),
        }
    }

    /// Create a BalanceMismatch error
    pub fn balance_mismatch(account: AccountId, expected: Amount, actual: Amount) -> Self {
        LedgerError::BalanceMismatch {
            account,
            expected,
            actual,
        }
    }

    /// Create an AccountMissing error
    pub fn account_missing(account: AccountId) -> Self {
        LedgerError::AccountMissing { account }
    }

    /// Create an AccountConflict error
    pub fn account_conflict(account: AccountId) -> Self {
        LedgerError::AccountConflict { account }
    }

    /// Create an InvalidRecord error
    pub fn invalid_record(line: Option<u64>, message: impl Into<String>) -> Self {
        LedgerError::InvalidRecord {
            line,
            message: message.into(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        LedgerError::Config {
            message: message.into(),
        }
    }
}
