//! Account ledger CLI
//!
//! Replays balance, transfer and create requests from a CSV file through the
//! request processor and prints one response row per request.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- requests.csv > responses.csv
//! cargo run -- --seed-accounts 1000 --initial-balance 100 requests.csv
//! cargo run -- --config ledger.json --batch-size 64 --log-level info requests.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, unreadable config, output not writable, etc.)

use account_ledger::cli;
use account_ledger::logging;
use account_ledger::replay::Replay;
use std::process;

fn main() {
    let args = cli::parse_args();
    logging::init_logging(&args.log_level);

    let config = match args.to_replay_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    };

    // Output goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = Replay::new(config).process(&args.input_file, &mut output) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}
