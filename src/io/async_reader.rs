//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over request records from a CSV file.
//! Supports batch reading so the replay driver can submit a batch of
//! requests concurrently.
//!
//! # Design
//!
//! The RequestReader uses:
//! - csv-async for streaming CSV parsing
//! - Batch reading for bounded memory use
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → RequestReader → Batches of Requests
//!                  ↓
//!           csv_format module
//!           (RequestRecord, convert_request_record)
//! ```

use crate::io::csv_format::{convert_request_record, RequestRecord};
use crate::types::Request;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
///
/// Provides batch reading interface over request records.
/// Maintains streaming behavior with constant memory usage.
pub struct RequestReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    /// Data rows consumed so far, valid or not
    rows_read: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> RequestReader<R> {
    /// Create a new RequestReader from an async reader
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            rows_read: 0,
        }
    }

    /// Read a batch of requests
    ///
    /// This method reads up to `batch_size` records from the CSV file,
    /// converting them to Requests. Invalid records are logged and skipped.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Maximum number of requests to return
    ///
    /// # Returns
    ///
    /// A vector of successfully converted requests.
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Request> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<RequestRecord>();

        while batch.len() < batch_size {
            let Some(next) = records.next().await else {
                break;
            };

            self.rows_read += 1;
            // Header occupies line 1
            let line = Some(self.rows_read + 1);

            match next {
                Ok(record) => match convert_request_record(record, line) {
                    Ok(request) => batch.push(request),
                    Err(error) => tracing::warn!(%error, "skipping record"),
                },
                Err(error) => tracing::warn!(?line, %error, "skipping unparsable row"),
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BalanceRequest, CreateRequest, TransferRequest};
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_read_batch() {
        let csv_content =
            "type,account,recipient,amount\ncreate,1,,100\ntransfer,1,2,40\nbalance,2,,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut request_reader = RequestReader::new(reader);

        let batch = request_reader.read_batch(2).await;
        assert_eq!(
            batch,
            vec![
                Request::Create(CreateRequest {
                    account_id: 1,
                    amount: 100
                }),
                Request::Transfer(TransferRequest {
                    sender_id: 1,
                    recipient_id: 2,
                    amount: 40
                }),
            ]
        );

        let batch = request_reader.read_batch(2).await;
        assert_eq!(batch, vec![Request::Balance(BalanceRequest { account_id: 2 })]);

        assert!(request_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_csv() {
        let csv_content = "type,account,recipient,amount\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut request_reader = RequestReader::new(reader);

        assert!(request_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_records_are_skipped() {
        let csv_content = "type,account,recipient,amount\n\
            deposit,1,,10\n\
            balance,abc,,\n\
            transfer,1,,5\n\
            balance,3,,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut request_reader = RequestReader::new(reader);

        let batch = request_reader.read_batch(10).await;
        assert_eq!(batch, vec![Request::Balance(BalanceRequest { account_id: 3 })]);
    }

    #[tokio::test]
    async fn test_whitespace_and_case() {
        let csv_content = "type,account,recipient,amount\n  TRANSFER  ,  1 ,  2 ,  7  \n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut request_reader = RequestReader::new(reader);

        let batch = request_reader.read_batch(10).await;
        assert_eq!(
            batch,
            vec![Request::Transfer(TransferRequest {
                sender_id: 1,
                recipient_id: 2,
                amount: 7
            })]
        );
    }

    #[tokio::test]
    async fn test_short_rows_are_accepted() {
        // Flexible parsing: trailing optional columns may be omitted entirely
        let csv_content = "type,account,recipient,amount\nbalance,5\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut request_reader = RequestReader::new(reader);

        let batch = request_reader.read_batch(10).await;
        assert_eq!(batch, vec![Request::Balance(BalanceRequest { account_id: 5 })]);
    }
}
