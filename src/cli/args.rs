use crate::config::ProcessorConfig;
use crate::replay::{ReplayConfig, DEFAULT_BATCH_SIZE};
use crate::types::{Amount, LedgerError};
use clap::Parser;
use std::path::PathBuf;

/// Replay balance, transfer and create requests against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Replay account ledger requests from a CSV file", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing request records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// JSON processor configuration file
    #[arg(
        long = "config",
        value_name = "FILE",
        help = "JSON file with poolSize, balanceQueueSize, transferQueueSize, createQueueSize"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        long = "pool-size",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub pool_size: Option<usize>,

    #[arg(
        long = "balance-queue",
        value_name = "SIZE",
        help = "Capacity of the balance queue (default: 1024)"
    )]
    pub balance_queue_size: Option<usize>,

    #[arg(
        long = "transfer-queue",
        value_name = "SIZE",
        help = "Capacity of the transfer queue (default: 1024)"
    )]
    pub transfer_queue_size: Option<usize>,

    #[arg(
        long = "create-queue",
        value_name = "SIZE",
        help = "Capacity of the create queue (default: 1024)"
    )]
    pub create_queue_size: Option<usize>,

    /// Number of requests submitted concurrently
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        default_value_t = DEFAULT_BATCH_SIZE,
        help = "Requests submitted concurrently per batch (1 replays sequentially)"
    )]
    pub batch_size: usize,

    #[arg(
        long = "seed-accounts",
        value_name = "COUNT",
        default_value_t = 0,
        help = "Create accounts 1..=COUNT before replaying"
    )]
    pub seed_accounts: u32,

    #[arg(
        long = "initial-balance",
        value_name = "AMOUNT",
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Opening balance of every seeded account"
    )]
    pub initial_balance: Amount,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        help = "Log filter when RUST_LOG is unset (error, warn, info, debug, trace)"
    )]
    pub log_level: String,
}

impl CliArgs {
    /// Build the processor configuration
    ///
    /// Starts from the config file when one is given, otherwise from the
    /// defaults, then applies every flag that was passed. Zero values fall
    /// back to defaults with a warning.
    pub fn to_processor_config(&self) -> Result<ProcessorConfig, LedgerError> {
        let base = match &self.config_file {
            Some(path) => ProcessorConfig::from_json_file(path)?,
            None => ProcessorConfig::default(),
        };

        Ok(ProcessorConfig {
            pool_size: self.pool_size.unwrap_or(base.pool_size),
            balance_queue_size: self.balance_queue_size.unwrap_or(base.balance_queue_size),
            transfer_queue_size: self.transfer_queue_size.unwrap_or(base.transfer_queue_size),
            create_queue_size: self.create_queue_size.unwrap_or(base.create_queue_size),
        }
        .validated())
    }

    /// Build the replay configuration
    pub fn to_replay_config(&self) -> Result<ReplayConfig, LedgerError> {
        Ok(ReplayConfig::new(
            self.to_processor_config()?,
            self.batch_size,
            self.seed_accounts,
            self.initial_balance,
        ))
    }
}
