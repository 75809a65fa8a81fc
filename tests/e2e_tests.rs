//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! test fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Replays every request through a fresh processor, one at a time
//! 3. Generates output CSV
//! 4. Compares actual output with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path transfers and lookups
//! - Business rejections (unknown accounts, bad amounts, duplicates)
//! - Self-transfers
//! - Balance overflow on credit
//! - Pre-seeded accounts
//! - Malformed rows
//!
//! Each fixture is replayed with a single worker and with several workers;
//! sequential replay must produce the same output either way.

#[cfg(test)]
mod tests {
    use account_ledger::config::ProcessorConfig;
    use account_ledger::replay::{Replay, ReplayConfig};
    use account_ledger::types::Amount;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Run a test fixture by replaying input.csv and comparing with expected.csv
    ///
    /// # Arguments
    ///
    /// * `fixture_name` - Name of the fixture directory (e.g., "happy_path")
    /// * `seed_accounts` - Accounts created before the replay starts
    /// * `initial_balance` - Opening balance of the seeded accounts
    /// * `pool_size` - Number of processor workers
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Output doesn't match expected
    fn run_test_fixture(
        fixture_name: &str,
        seed_accounts: u32,
        initial_balance: Amount,
        pool_size: usize,
    ) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let config = ReplayConfig::new(
            ProcessorConfig::new(pool_size, 64, 64, 64),
            1,
            seed_accounts,
            initial_balance,
        );
        let replay = Replay::new(config);

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        replay
            .process(Path::new(&input_path), &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay requests: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (pool size: {})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, pool_size, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with one and several workers
    #[rstest]
    #[case("happy_path", 0, 0)]
    #[case("business_rejections", 0, 0)]
    #[case("self_transfer", 0, 0)]
    #[case("overflow", 0, 0)]
    #[case("seeded_accounts", 3, 100)]
    #[case("malformed_data", 0, 0)]
    fn test_fixtures(
        #[case] fixture: &str,
        #[case] seed_accounts: u32,
        #[case] initial_balance: Amount,
        #[values(1, 4)] pool_size: usize,
    ) {
        run_test_fixture(fixture, seed_accounts, initial_balance, pool_size);
    }
}
