//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifiers, amounts and overflow-checked arithmetic
//! - `request`: The three request kinds
//! - `response`: Result codes and per-kind responses
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod request;
pub mod response;

pub use account::{checked_credit, checked_debit, Account, AccountId, Amount};
pub use error::LedgerError;
pub use request::{BalanceRequest, CreateRequest, Request, RequestKind, TransferRequest};
pub use response::{
    BalanceResponse, CreateResponse, Reply, Response, ResultCode, TransferResponse,
};
