//! Storage abstraction consumed by the request processor
//!
//! The processor never talks to a database directly. It depends on this trait,
//! which any backend (SQL, in-memory, test doubles) can implement. All calls are
//! asynchronous so that a worker never parks its thread while a call is
//! outstanding.

use crate::types::{Account, AccountId, Amount, LedgerError};
use async_trait::async_trait;

/// Balance store
///
/// Business conditions are expressed in return values (`None` for an absent
/// account). `Err` is reserved for backend failures and for contract
/// violations, which the processor treats as fatal.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Current balance of `id`, or `None` if the account does not exist
    async fn balance(&self, id: AccountId) -> Result<Option<Amount>, LedgerError>;

    /// Set the balance of `id` to `new` if it currently equals `expected`
    ///
    /// Fails with `BalanceMismatch` if the row holds another balance and with
    /// `AccountMissing` if there is no row.
    async fn compare_and_set_balance(
        &self,
        id: AccountId,
        expected: Amount,
        new: Amount,
    ) -> Result<(), LedgerError>;

    /// Insert `id` with `initial_balance`
    ///
    /// Fails with `AccountConflict` if a row already exists.
    async fn create_account(&self, id: AccountId, initial_balance: Amount)
        -> Result<(), LedgerError>;

    /// Every account, sorted by ID
    ///
    /// Used for reporting only; not part of any request protocol.
    async fn accounts(&self) -> Result<Vec<Account>, LedgerError>;
}
