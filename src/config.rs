//! Processor configuration
//!
//! `ProcessorConfig` sizes the worker pool and the three request queues. It can
//! be built from defaults, from explicit values, or from a JSON file whose keys
//! are the camelCase names used by the service's config file:
//!
//! ```json
//! { "poolSize": 8, "balanceQueueSize": 1024, "transferQueueSize": 1024, "createQueueSize": 256 }
//! ```
//!
//! Zero values are invalid everywhere; they are replaced by the default and a
//! warning is logged.

use crate::types::LedgerError;
use serde::Deserialize;
use std::path::Path;

/// Default capacity of each request queue
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Sizing of the request processor
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorConfig {
    /// Number of worker threads draining the queues
    pub pool_size: usize,
    /// Capacity of the balance lookup queue
    pub balance_queue_size: usize,
    /// Capacity of the transfer queue
    pub transfer_queue_size: usize,
    /// Capacity of the account creation queue
    pub create_queue_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get(),
            balance_queue_size: DEFAULT_QUEUE_SIZE,
            transfer_queue_size: DEFAULT_QUEUE_SIZE,
            create_queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

impl ProcessorConfig {
    /// Create a new ProcessorConfig with custom values
    pub fn new(
        pool_size: usize,
        balance_queue_size: usize,
        transfer_queue_size: usize,
        create_queue_size: usize,
    ) -> Self {
        Self {
            pool_size,
            balance_queue_size,
            transfer_queue_size,
            create_queue_size,
        }
        .validated()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing keys take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self, LedgerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, LedgerError> {
        let config: ProcessorConfig = serde_json::from_str(content)?;
        Ok(config.validated())
    }

    /// Replace every zero value with its default
    pub fn validated(self) -> Self {
        let default = Self::default();
        Self {
            pool_size: non_zero("pool_size", self.pool_size, default.pool_size),
            balance_queue_size: non_zero(
                "balance_queue_size",
                self.balance_queue_size,
                default.balance_queue_size,
            ),
            transfer_queue_size: non_zero(
                "transfer_queue_size",
                self.transfer_queue_size,
                default.transfer_queue_size,
            ),
            create_queue_size: non_zero(
                "create_queue_size",
                self.create_queue_size,
                default.create_queue_size,
            ),
        }
    }
}

fn non_zero(name: &str, value: usize, default: usize) -> usize {
    if value == 0 {
        tracing::warn!("Invalid {} ({}), using default ({})", name, value, default);
        default
    } else {
        value
    }
}
