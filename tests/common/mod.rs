//! Storage doubles shared by the integration tests

#![allow(dead_code)]

use account_ledger::core::{InMemoryStorage, Storage};
use account_ledger::types::{Account, AccountId, Amount, LedgerError};
use account_ledger::ProcessorStats;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Whether every slot is free and nothing is parked or locked
pub fn is_idle(stats: &ProcessorStats, balance: usize, transfer: usize, create: usize) -> bool {
    stats.balance.free_capacity == balance
        && stats.transfer.free_capacity == transfer
        && stats.create.free_capacity == create
        && stats.balance.reserved + stats.transfer.reserved + stats.create.reserved == 0
        && stats.held_locks == 0
}

/// Balance reads wait until the gate is opened
pub struct GatedStorage {
    pub inner: InMemoryStorage,
    gate: Semaphore,
}

impl GatedStorage {
    pub fn new(inner: InMemoryStorage) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl Storage for GatedStorage {
    async fn balance(&self, id: AccountId) -> Result<Option<Amount>, LedgerError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| LedgerError::storage("gate closed"))?;
        self.inner.balance(id).await
    }

    async fn compare_and_set_balance(
        &self,
        id: AccountId,
        expected: Amount,
        new: Amount,
    ) -> Result<(), LedgerError> {
        self.inner.compare_and_set_balance(id, expected, new).await
    }

    async fn create_account(&self, id: AccountId, initial_balance: Amount) -> Result<(), LedgerError> {
        self.inner.create_account(id, initial_balance).await
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.inner.accounts().await
    }
}

/// Every call fails as if the backend were unreachable
#[derive(Default)]
pub struct FailingStorage {
    pub calls: AtomicUsize,
}

impl FailingStorage {
    fn fail<T>(&self) -> Result<T, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LedgerError::storage("backend unreachable"))
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn balance(&self, _id: AccountId) -> Result<Option<Amount>, LedgerError> {
        self.fail()
    }

    async fn compare_and_set_balance(
        &self,
        _id: AccountId,
        _expected: Amount,
        _new: Amount,
    ) -> Result<(), LedgerError> {
        self.fail()
    }

    async fn create_account(&self, _id: AccountId, _initial_balance: Amount) -> Result<(), LedgerError> {
        self.fail()
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.fail()
    }
}

/// Reads work, but every compare-and-set reports a foreign write
pub struct MismatchStorage {
    pub inner: InMemoryStorage,
    pub cas_calls: AtomicUsize,
}

impl MismatchStorage {
    pub fn new(inner: InMemoryStorage) -> Self {
        Self {
            inner,
            cas_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Storage for MismatchStorage {
    async fn balance(&self, id: AccountId) -> Result<Option<Amount>, LedgerError> {
        self.inner.balance(id).await
    }

    async fn compare_and_set_balance(
        &self,
        id: AccountId,
        expected: Amount,
        _new: Amount,
    ) -> Result<(), LedgerError> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);
        Err(LedgerError::balance_mismatch(id, expected, expected + 1))
    }

    async fn create_account(&self, id: AccountId, initial_balance: Amount) -> Result<(), LedgerError> {
        self.inner.create_account(id, initial_balance).await
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.inner.accounts().await
    }
}

/// Panics when asked for the balance of `poisoned`
pub struct PanickingStorage {
    pub inner: InMemoryStorage,
    pub poisoned: AccountId,
}

#[async_trait]
impl Storage for PanickingStorage {
    async fn balance(&self, id: AccountId) -> Result<Option<Amount>, LedgerError> {
        if id == self.poisoned {
            panic!("corrupt row for account {}", id);
        }
        self.inner.balance(id).await
    }

    async fn compare_and_set_balance(
        &self,
        id: AccountId,
        expected: Amount,
        new: Amount,
    ) -> Result<(), LedgerError> {
        self.inner.compare_and_set_balance(id, expected, new).await
    }

    async fn create_account(&self, id: AccountId, initial_balance: Amount) -> Result<(), LedgerError> {
        self.inner.create_account(id, initial_balance).await
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.inner.accounts().await
    }
}
