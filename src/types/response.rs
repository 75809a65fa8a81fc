//! Response types produced by the ledger
//!
//! Every response carries a [`ResultCode`]. Business rejections are ordinary
//! responses with a non-success code; only storage failures travel as errors,
//! and those are rendered as `INTERNAL_ERROR` by [`Reply::internal_error`].

use super::account::{AccountId, Amount};
use super::request::RequestKind;
use serde::Serialize;
use std::fmt;

/// Outcome code of a request
///
/// Maps 1:1 to an HTTP status for the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    InternalError,
    Overloaded,
    AccNotExists,
    WrongAmount,
    AccAlreadyExists,
}

impl ResultCode {
    /// HTTP status the transport layer responds with
    pub fn status_code(&self) -> u16 {
        match self {
            ResultCode::Success => 200,
            ResultCode::InternalError => 500,
            ResultCode::Overloaded => 503,
            ResultCode::AccNotExists | ResultCode::WrongAmount | ResultCode::AccAlreadyExists => {
                400
            }
        }
    }

    /// Wire name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Success => "SUCCESS",
            ResultCode::InternalError => "INTERNAL_ERROR",
            ResultCode::Overloaded => "OVERLOADED",
            ResultCode::AccNotExists => "ACC_NOT_EXISTS",
            ResultCode::WrongAmount => "WRONG_AMOUNT",
            ResultCode::AccAlreadyExists => "ACC_ALREADY_EXISTS",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Responses that the submission path can build without a handler
///
/// Overload is decided synchronously at submission; internal errors are
/// what a failed completion turns into.
pub trait Reply: Send + 'static {
    /// Response for a request rejected because its queue is full
    fn overloaded() -> Self;

    /// Response for a request whose processing failed
    fn internal_error() -> Self;

    /// The result code carried by this response
    fn result(&self) -> ResultCode;
}

/// Result of a balance lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub result: ResultCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Amount>,
}

impl BalanceResponse {
    pub fn success(account_id: AccountId, balance: Amount) -> Self {
        BalanceResponse {
            result: ResultCode::Success,
            account_id: Some(account_id),
            balance: Some(balance),
        }
    }

    pub fn acc_not_exists() -> Self {
        Self::bare(ResultCode::AccNotExists)
    }

    fn bare(result: ResultCode) -> Self {
        BalanceResponse {
            result,
            account_id: None,
            balance: None,
        }
    }
}

impl Reply for BalanceResponse {
    fn overloaded() -> Self {
        Self::bare(ResultCode::Overloaded)
    }

    fn internal_error() -> Self {
        Self::bare(ResultCode::InternalError)
    }

    fn result(&self) -> ResultCode {
        self.result
    }
}

/// Result of a transfer
///
/// On success both post-transfer balances are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub result: ResultCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_balance_after: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_balance_after: Option<Amount>,
}

impl TransferResponse {
    pub fn success(sender_balance_after: Amount, recipient_balance_after: Amount) -> Self {
        TransferResponse {
            result: ResultCode::Success,
            sender_balance_after: Some(sender_balance_after),
            recipient_balance_after: Some(recipient_balance_after),
        }
    }

    pub fn wrong_amount() -> Self {
        Self::bare(ResultCode::WrongAmount)
    }

    pub fn acc_not_exists() -> Self {
        Self::bare(ResultCode::AccNotExists)
    }

    fn bare(result: ResultCode) -> Self {
        TransferResponse {
            result,
            sender_balance_after: None,
            recipient_balance_after: None,
        }
    }
}

impl Reply for TransferResponse {
    fn overloaded() -> Self {
        Self::bare(ResultCode::Overloaded)
    }

    fn internal_error() -> Self {
        Self::bare(ResultCode::InternalError)
    }

    fn result(&self) -> ResultCode {
        self.result
    }
}

/// Result of an account creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreateResponse {
    pub result: ResultCode,
}

impl CreateResponse {
    pub fn success() -> Self {
        CreateResponse {
            result: ResultCode::Success,
        }
    }

    pub fn already_exists() -> Self {
        CreateResponse {
            result: ResultCode::AccAlreadyExists,
        }
    }

    pub fn wrong_amount() -> Self {
        CreateResponse {
            result: ResultCode::WrongAmount,
        }
    }
}

impl Reply for CreateResponse {
    fn overloaded() -> Self {
        CreateResponse {
            result: ResultCode::Overloaded,
        }
    }

    fn internal_error() -> Self {
        CreateResponse {
            result: ResultCode::InternalError,
        }
    }

    fn result(&self) -> ResultCode {
        self.result
    }
}

/// Any response, paired with [`crate::types::Request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Balance(BalanceResponse),
    Transfer(TransferResponse),
    Create(CreateResponse),
}

impl Response {
    /// The kind of request this response answers
    pub fn kind(&self) -> RequestKind {
        match self {
            Response::Balance(_) => RequestKind::Balance,
            Response::Transfer(_) => RequestKind::Transfer,
            Response::Create(_) => RequestKind::Create,
        }
    }

    /// The result code carried by the response
    pub fn result(&self) -> ResultCode {
        match self {
            Response::Balance(resp) => resp.result,
            Response::Transfer(resp) => resp.result,
            Response::Create(resp) => resp.result,
        }
    }
}
