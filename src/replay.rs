//! CSV replay driver
//!
//! Feeds a file of requests through a `RequestProcessor` backed by
//! `InMemoryStorage` and writes one response row per request.
//!
//! # Architecture
//!
//! ```text
//! Replay
//!     ├── ReplayConfig (processor sizing, batch_size, seeding)
//!     ├── RequestReader (batch CSV reading)
//!     └── RequestProcessor
//!         └── InMemoryStorage (optionally pre-seeded)
//! ```
//!
//! # Ordering
//!
//! Batches run one after another. Every request in a batch is submitted at
//! once and the batch completes when all of them have responded, so requests
//! within a batch race each other while requests in different batches never
//! do. With a batch size of 1 the replay is fully sequential and its output is
//! deterministic.

use crate::config::ProcessorConfig;
use crate::core::{InMemoryStorage, RequestProcessor};
use crate::io::{write_responses_csv, RequestReader};
use crate::types::{Amount, LedgerError, Request, Response};
use futures::future::join_all;
use futures::io::AsyncRead;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Default number of requests submitted together
pub const DEFAULT_BATCH_SIZE: usize = 1;

/// Settings of one replay run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    pub processor: ProcessorConfig,
    /// Number of requests submitted concurrently
    pub batch_size: usize,
    /// Accounts `1..=seed_accounts` exist before the first request
    pub seed_accounts: u32,
    /// Opening balance of every seeded account
    pub initial_balance: Amount,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            seed_accounts: 0,
            initial_balance: 0,
        }
    }
}

impl ReplayConfig {
    /// Create a new ReplayConfig with custom values
    pub fn new(
        processor: ProcessorConfig,
        batch_size: usize,
        seed_accounts: u32,
        initial_balance: Amount,
    ) -> Self {
        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                DEFAULT_BATCH_SIZE
            );
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };

        Self {
            processor,
            batch_size,
            seed_accounts,
            initial_balance,
        }
    }
}

/// What a finished replay left behind
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Requests read and answered
    pub requests: usize,
    /// Accounts in storage after the last request
    pub accounts: usize,
    /// Sum of all balances after the last request
    pub total_balance: i128,
}

/// Replays a request file against a fresh processor
#[derive(Debug, Clone, Default)]
pub struct Replay {
    config: ReplayConfig,
}

impl Replay {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Replay `input_path` and write the responses to `output`
    ///
    /// Builds its own multi-threaded tokio runtime for the handler tasks.
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` once every request has been answered
    /// * `Err(LedgerError)` if the input cannot be opened or the output cannot
    ///   be written. Rejected rows and failed requests are not errors here;
    ///   they are logged or reported in the output.
    pub fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("ledger-handler")
            .build()?;

        runtime.block_on(async {
            let storage = Arc::new(InMemoryStorage::seeded(
                self.config.seed_accounts,
                self.config.initial_balance,
            ));
            let mut processor =
                RequestProcessor::start(self.config.processor.clone(), storage.clone())?;

            let file = tokio::fs::File::open(input_path).await.map_err(|e| LedgerError::Io {
                message: format!("Failed to open file '{}': {}", input_path.display(), e),
            })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = RequestReader::new(compat_file);

            let outcomes = replay(&processor, &mut reader, self.config.batch_size).await;
            processor.shutdown();

            write_responses_csv(&outcomes, output)?;

            let summary = ReplaySummary {
                requests: outcomes.len(),
                accounts: storage.len(),
                total_balance: storage.total_balance(),
            };
            tracing::info!(
                requests = summary.requests,
                accounts = summary.accounts,
                total_balance = %summary.total_balance,
                "replay finished"
            );

            Ok(summary)
        })
    }
}

/// Drive every request from `reader` through `processor`
///
/// Returns each request paired with its response, in input order.
pub async fn replay<R>(
    processor: &RequestProcessor,
    reader: &mut RequestReader<R>,
    batch_size: usize,
) -> Vec<(Request, Response)>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut outcomes = Vec::new();

    loop {
        let batch = reader.read_batch(batch_size).await;
        if batch.is_empty() {
            break;
        }

        let responses = join_all(batch.iter().map(|request| processor.execute(*request))).await;
        outcomes.extend(batch.into_iter().zip(responses));
    }

    outcomes
}
