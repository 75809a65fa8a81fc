//! Account Ledger Library
//! # Overview
//!
//! This library provides a request processing engine for account balances:
//! balance lookups, transfers between accounts, and account creation, served
//! by a fixed pool of workers over bounded, retriable queues.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (requests, responses, errors)
//! - [`config`] - Processor sizing
//! - [`core`] - Business logic components:
//!   - [`core::queue`] - Bounded queue with ack/nack settlement
//!   - [`core::locks`] - Per-account advisory locks
//!   - [`core::processor`] - Worker pool and submission API
//!   - [`core::traits`] - Storage abstraction
//!   - [`core::memory_store`] - In-memory storage backend
//! - [`io`] - CSV request parsing and response output
//! - [`replay`] - Replays a CSV file of requests
//! - [`cli`] - CLI arguments parsing
//!
//! # Request Types
//!
//! - **Balance**: Report an account's balance
//! - **Transfer**: Move a positive amount from one account to another
//! - **Create**: Open an account with a positive opening balance
//!
//! # Result Codes
//!
//! Every response carries one of SUCCESS, INTERNAL_ERROR, OVERLOADED,
//! ACC_NOT_EXISTS, WRONG_AMOUNT or ACC_ALREADY_EXISTS. A full queue answers
//! OVERLOADED at once; a caller is never made to wait for queue space.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod types;

pub use config::ProcessorConfig;
pub use crate::core::{Completion, InMemoryStorage, ProcessorStats, RequestProcessor, Storage};
pub use io::write_responses_csv;
pub use types::{
    Account, AccountId, Amount, BalanceRequest, BalanceResponse, CreateRequest, CreateResponse,
    LedgerError, Reply, Request, Response, ResultCode, TransferRequest, TransferResponse,
};
