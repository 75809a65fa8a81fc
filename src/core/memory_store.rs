//! Thread-safe in-memory storage backend
//!
//! This module provides the `InMemoryStorage` struct, a `Storage` implementation
//! that keeps balances in a concurrent map. It is the backend used by the CLI
//! and by tests; a SQL backend would implement the same trait.
//!
//! # Design
//!
//! `InMemoryStorage` uses `DashMap` (a concurrent HashMap) to provide thread-safe
//! balance storage with fine-grained locking. Compare-and-set and
//! insert-if-absent are each performed while holding the entry's shard lock,
//! so they are atomic with respect to each other.
//!
//! # Contract Enforcement
//!
//! The backend enforces exactly the contract the processor relies on:
//! - a compare-and-set against a stale balance fails with `BalanceMismatch`
//! - a compare-and-set against a missing row fails with `AccountMissing`
//! - a second insert of the same ID fails with `AccountConflict`
//!
//! With correct locking in the processor none of these can happen.

use crate::core::traits::Storage;
use crate::types::{Account, AccountId, Amount, LedgerError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe balance store backed by `DashMap`
///
/// Multiple tasks can read and update different accounts concurrently; updates
/// to the same account are serialized by the map's internal sharding locks.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Balance per account ID
    balances: DashMap<AccountId, Amount>,
}

impl InMemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Create a store holding accounts `1..=count`, each with `initial_balance`
    pub fn seeded(count: u32, initial_balance: Amount) -> Self {
        let storage = Self::new();
        for id in 1..=count {
            storage.balances.insert(id, initial_balance);
        }
        storage
    }

    /// All accounts, sorted by ID
    ///
    /// The returned vector is a snapshot; concurrent updates may not be
    /// reflected in it.
    pub fn snapshot(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .balances
            .iter()
            .map(|entry| Account::new(*entry.key(), *entry.value()))
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Sum of every balance
    ///
    /// Widened to `i128` so the sum itself cannot overflow.
    pub fn total_balance(&self) -> i128 {
        self.balances
            .iter()
            .map(|entry| i128::from(*entry.value()))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn balance(&self, id: AccountId) -> Result<Option<Amount>, LedgerError> {
        Ok(self.balances.get(&id).map(|entry| *entry.value()))
    }

    async fn compare_and_set_balance(
        &self,
        id: AccountId,
        expected: Amount,
        new: Amount,
    ) -> Result<(), LedgerError> {
        let mut entry = self
            .balances
            .get_mut(&id)
            .ok_or_else(|| LedgerError::account_missing(id))?;

        let actual = *entry.value();
        if actual != expected {
            return Err(LedgerError::balance_mismatch(id, expected, actual));
        }

        *entry.value_mut() = new;
        Ok(())
    }

    async fn create_account(
        &self,
        id: AccountId,
        initial_balance: Amount,
    ) -> Result<(), LedgerError> {
        match self.balances.entry(id) {
            Entry::Occupied(_) => Err(LedgerError::account_conflict(id)),
            Entry::Vacant(vacant) => {
                vacant.insert(initial_balance);
                Ok(())
            }
        }
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_balance_of_missing_account_is_none() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.balance(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_then_balance() {
        let storage = InMemoryStorage::new();

        storage.create_account(1, 100).await.unwrap();

        assert_eq!(storage.balance(1).await.unwrap(), Some(100));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let storage = InMemoryStorage::new();
        storage.create_account(1, 100).await.unwrap();

        let result = storage.create_account(1, 5).await;

        assert_eq!(result, Err(LedgerError::account_conflict(1)));
        assert_eq!(storage.balance(1).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn test_compare_and_set_updates_on_match() {
        let storage = InMemoryStorage::seeded(1, 100);

        storage.compare_and_set_balance(1, 100, 60).await.unwrap();

        assert_eq!(storage.balance(1).await.unwrap(), Some(60));
    }

    #[tokio::test]
    async fn test_compare_and_set_rejects_stale_expectation() {
        let storage = InMemoryStorage::seeded(1, 100);

        let result = storage.compare_and_set_balance(1, 90, 60).await;

        assert_eq!(result, Err(LedgerError::balance_mismatch(1, 90, 100)));
        assert_eq!(storage.balance(1).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn test_compare_and_set_on_missing_row() {
        let storage = InMemoryStorage::new();

        let result = storage.compare_and_set_balance(3, 0, 10).await;

        assert_eq!(result, Err(LedgerError::account_missing(3)));
    }

    #[tokio::test]
    async fn test_seeded_snapshot_and_total() {
        let storage = InMemoryStorage::seeded(3, 50);

        let accounts = storage.accounts().await.unwrap();
        assert_eq!(
            accounts,
            vec![
                Account::new(1, 50),
                Account::new(2, 50),
                Account::new(3, 50)
            ]
        );
        assert_eq!(storage.total_balance(), 150);
    }

    #[tokio::test]
    async fn test_total_balance_does_not_overflow() {
        let storage = InMemoryStorage::seeded(2, Amount::MAX);
        assert_eq!(storage.total_balance(), 2 * i128::from(Amount::MAX));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_single_winner() {
        let storage = Arc::new(InMemoryStorage::new());

        let mut tasks = Vec::new();
        for amount in 1..=8 {
            let storage = Arc::clone(&storage);
            tasks.push(tokio::spawn(async move {
                storage.create_account(1, amount).await.is_ok()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(storage.len(), 1);
    }
}
