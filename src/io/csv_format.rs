//! CSV format handling for request replay
//!
//! This module centralizes all CSV format concerns, providing:
//! - `RequestRecord` structure for deserialization
//! - Conversion from CSV records to `Request` values
//! - Response output serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input
//!
//! ```text
//! type,account,recipient,amount
//! create,1,,100
//! transfer,1,2,40
//! balance,2,,
//! ```
//!
//! # Output
//!
//! ```text
//! type,account,result,status,balance,sender_balance,recipient_balance
//! ```

use crate::types::{AccountId, Amount, LedgerError, Request, Response};
use crate::types::{BalanceRequest, CreateRequest, TransferRequest};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, account, recipient, amount.
/// `recipient` is only meaningful for transfers; `amount` is required for
/// transfers and creations.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RequestRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub account: AccountId,
    pub recipient: Option<AccountId>,
    pub amount: Option<Amount>,
}

/// Convert a RequestRecord to a Request
///
/// # Arguments
///
/// * `record` - The deserialized CSV record
/// * `line` - Line number of the record, used in error messages
///
/// # Returns
///
/// The request, or `InvalidRecord` if the type is unknown or a required
/// column is empty.
pub fn convert_request_record(
    record: RequestRecord,
    line: Option<u64>,
) -> Result<Request, LedgerError> {
    let request = match record.kind.to_lowercase().as_str() {
        "balance" => Request::Balance(BalanceRequest {
            account_id: record.account,
        }),
        "transfer" => {
            let recipient_id = record.recipient.ok_or_else(|| {
                LedgerError::invalid_record(
                    line,
                    format!("transfer from {} has no recipient", record.account),
                )
            })?;
            Request::Transfer(TransferRequest {
                sender_id: record.account,
                recipient_id,
                amount: required_amount(&record, line)?,
            })
        }
        "create" => Request::Create(CreateRequest {
            account_id: record.account,
            amount: required_amount(&record, line)?,
        }),
        _ => {
            return Err(LedgerError::invalid_record(
                line,
                format!("unknown request type '{}'", record.kind),
            ))
        }
    };

    Ok(request)
}

fn required_amount(record: &RequestRecord, line: Option<u64>) -> Result<Amount, LedgerError> {
    record.amount.ok_or_else(|| {
        LedgerError::invalid_record(
            line,
            format!("{} for account {} has no amount", record.kind, record.account),
        )
    })
}

/// Write request/response pairs to CSV format
///
/// Writes one row per pair, in the given order, with columns: type, account,
/// result, status, balance, sender_balance, recipient_balance. Columns that
/// do not apply to a response are left empty.
///
/// # Arguments
///
/// * `outcomes` - Requests paired with the responses they produced
/// * `output` - Mutable reference to a writer for outputting CSV
pub fn write_responses_csv(
    outcomes: &[(Request, Response)],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer.write_record([
        "type",
        "account",
        "result",
        "status",
        "balance",
        "sender_balance",
        "recipient_balance",
    ])?;

    for (request, response) in outcomes {
        let (balance, sender_balance, recipient_balance) = match response {
            Response::Balance(balance) => (balance.balance, None, None),
            Response::Transfer(transfer) => (
                None,
                transfer.sender_balance_after,
                transfer.recipient_balance_after,
            ),
            Response::Create(_) => (None, None, None),
        };

        writer.write_record(&[
            request.kind().to_string(),
            request.account_id().to_string(),
            response.result().to_string(),
            response.result().status_code().to_string(),
            optional(balance),
            optional(sender_balance),
            optional(recipient_balance),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn optional(value: Option<Amount>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BalanceResponse, CreateResponse, TransferResponse};
    use rstest::rstest;

    fn record(kind: &str, account: AccountId, recipient: Option<AccountId>, amount: Option<Amount>) -> RequestRecord {
        RequestRecord {
            kind: kind.to_string(),
            account,
            recipient,
            amount,
        }
    }

    #[rstest]
    #[case::balance("balance", Request::Balance(BalanceRequest { account_id: 1 }))]
    #[case::uppercase("BALANCE", Request::Balance(BalanceRequest { account_id: 1 }))]
    #[case::transfer(
        "transfer",
        Request::Transfer(TransferRequest { sender_id: 1, recipient_id: 2, amount: 30 })
    )]
    #[case::create("Create", Request::Create(CreateRequest { account_id: 1, amount: 30 }))]
    fn test_convert_valid_records(#[case] kind: &str, #[case] expected: Request) {
        let converted = convert_request_record(record(kind, 1, Some(2), Some(30)), Some(2)).unwrap();
        assert_eq!(converted, expected);
    }

    #[test]
    fn test_convert_balance_ignores_extra_columns() {
        let converted = convert_request_record(record("balance", 4, None, None), None).unwrap();
        assert_eq!(converted, Request::Balance(BalanceRequest { account_id: 4 }));
    }

    #[rstest]
    #[case::unknown_type(record("deposit", 1, None, Some(5)), "unknown request type")]
    #[case::transfer_without_recipient(record("transfer", 1, None, Some(5)), "no recipient")]
    #[case::transfer_without_amount(record("transfer", 1, Some(2), None), "no amount")]
    #[case::create_without_amount(record("create", 1, None, None), "no amount")]
    fn test_convert_invalid_records(#[case] input: RequestRecord, #[case] fragment: &str) {
        match convert_request_record(input, Some(7)) {
            Err(LedgerError::InvalidRecord { line, message }) => {
                assert_eq!(line, Some(7));
                assert!(message.contains(fragment), "unexpected message: {}", message);
            }
            other => panic!("Expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_amount_is_passed_through() {
        // Amount validation is a business rule of the handlers, not of the parser
        let converted =
            convert_request_record(record("create", 1, None, Some(-5)), None).unwrap();
        assert_eq!(
            converted,
            Request::Create(CreateRequest {
                account_id: 1,
                amount: -5
            })
        );
    }

    #[test]
    fn test_write_responses_csv() {
        let outcomes = vec![
            (
                Request::Create(CreateRequest {
                    account_id: 1,
                    amount: 100,
                }),
                Response::Create(CreateResponse::success()),
            ),
            (
                Request::Transfer(TransferRequest {
                    sender_id: 1,
                    recipient_id: 2,
                    amount: 40,
                }),
                Response::Transfer(TransferResponse::success(60, 40)),
            ),
            (
                Request::Balance(BalanceRequest { account_id: 9 }),
                Response::Balance(BalanceResponse::acc_not_exists()),
            ),
        ];

        let mut output = Vec::new();
        write_responses_csv(&outcomes, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "type,account,result,status,balance,sender_balance,recipient_balance",
                "create,1,SUCCESS,200,,,",
                "transfer,1,SUCCESS,200,,60,40",
                "balance,9,ACC_NOT_EXISTS,400,,,",
            ]
        );
    }

    #[test]
    fn test_write_empty_outcomes_has_header_only() {
        let mut output = Vec::new();
        write_responses_csv(&[], &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text.trim(),
            "type,account,result,status,balance,sender_balance,recipient_balance"
        );
    }
}
