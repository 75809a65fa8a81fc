//! Request types accepted by the ledger
//!
//! Three kinds of request exist, each served by its own bounded queue:
//! balance lookups, transfers between two accounts, and account creation.

use super::account::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a request
///
/// Determines which queue a request is offered to and which handler
/// protocol serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Read-only balance lookup
    Balance,

    /// Atomic move of funds between two accounts
    Transfer,

    /// Creation of a new account with an opening balance
    Create,
}

impl RequestKind {
    /// Lowercase name as used in CSV files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Balance => "balance",
            RequestKind::Transfer => "transfer",
            RequestKind::Create => "create",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up the balance of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    #[serde(alias = "accId")]
    pub account_id: AccountId,
}

/// Move `amount` from `sender_id` to `recipient_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_id: AccountId,
    pub recipient_id: AccountId,
    pub amount: Amount,
}

/// Create `account_id` with an opening balance of `amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(alias = "accId")]
    pub account_id: AccountId,
    pub amount: Amount,
}

/// Any request, for callers that dispatch on the kind at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Balance(BalanceRequest),
    Transfer(TransferRequest),
    Create(CreateRequest),
}

impl Request {
    /// The kind of this request
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Balance(_) => RequestKind::Balance,
            Request::Transfer(_) => RequestKind::Transfer,
            Request::Create(_) => RequestKind::Create,
        }
    }

    /// The account the request is primarily about
    ///
    /// For transfers this is the sender.
    pub fn account_id(&self) -> AccountId {
        match self {
            Request::Balance(req) => req.account_id,
            Request::Transfer(req) => req.sender_id,
            Request::Create(req) => req.account_id,
        }
    }
}

impl From<BalanceRequest> for Request {
    fn from(req: BalanceRequest) -> Self {
        Request::Balance(req)
    }
}

impl From<TransferRequest> for Request {
    fn from(req: TransferRequest) -> Self {
        Request::Transfer(req)
    }
}

impl From<CreateRequest> for Request {
    fn from(req: CreateRequest) -> Self {
        Request::Create(req)
    }
}
