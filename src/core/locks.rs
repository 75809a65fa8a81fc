//! Per-account advisory locks
//!
//! This module provides `AccountLocks`, a table mapping an account ID to the
//! fencing stamp of the handler that currently reserves it.
//!
//! # Design
//!
//! The table uses `DashMap` so that lock attempts on different accounts never
//! contend on a global mutex. Acquisition is insert-if-absent: the first stamp
//! to land wins, and a failed attempt returns immediately. Nothing here ever
//! blocks or waits; contention is resolved by the queue's nack/retry protocol.
//!
//! # Fencing
//!
//! Release only removes an entry still owned by the caller's stamp, so a stale
//! handler can never free a lock that has since been handed to someone else.
//! Retrying `try_lock` with the same stamp is idempotent.

use crate::core::queue::Stamp;
use crate::types::AccountId;
use dashmap::DashMap;

/// Advisory lock table keyed by account ID
#[derive(Debug, Default)]
pub struct AccountLocks {
    /// Owning stamp per reserved account; absent means free
    held: DashMap<AccountId, Stamp>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self {
            held: DashMap::new(),
        }
    }

    /// Reserve `id` for `stamp`
    ///
    /// Returns true if the entry now belongs to `stamp`, whether it was just
    /// inserted or already held by the same stamp. Returns false if a
    /// different stamp holds it.
    pub fn try_lock(&self, id: AccountId, stamp: Stamp) -> bool {
        *self.held.entry(id).or_insert(stamp) == stamp
    }

    /// Free `id` if and only if `stamp` still owns it
    ///
    /// Returns whether an entry was removed.
    pub fn release(&self, id: AccountId, stamp: Stamp) -> bool {
        self.held
            .remove_if(&id, |_, owner| *owner == stamp)
            .is_some()
    }

    /// Reserve every id in `ids`, in the given order, under one stamp
    ///
    /// On the first failure every id already taken by this call is released
    /// and `None` is returned. Callers wanting deadlock freedom pass the ids in
    /// a global order. Duplicate ids are taken once.
    pub fn try_lock_all(&self, ids: &[AccountId], stamp: Stamp) -> Option<HeldLocks<'_>> {
        let mut taken: Vec<AccountId> = Vec::with_capacity(ids.len());

        for &id in ids {
            if taken.contains(&id) {
                continue;
            }
            if !self.try_lock(id, stamp) {
                for &acquired in taken.iter().rev() {
                    self.release(acquired, stamp);
                }
                return None;
            }
            taken.push(id);
        }

        Some(HeldLocks {
            table: self,
            ids: taken,
            stamp,
        })
    }

    /// Stamp currently holding `id`, if any
    pub fn holder(&self, id: AccountId) -> Option<Stamp> {
        self.held.get(&id).map(|entry| *entry.value())
    }

    /// Number of accounts currently reserved
    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// Locks taken by one handler attempt
///
/// Dropping the guard releases every id in reverse acquisition order, using
/// the owning stamp.
#[derive(Debug)]
pub struct HeldLocks<'a> {
    table: &'a AccountLocks,
    ids: Vec<AccountId>,
    stamp: Stamp,
}

impl HeldLocks<'_> {
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    pub fn ids(&self) -> &[AccountId] {
        &self.ids
    }
}

impl Drop for HeldLocks<'_> {
    fn drop(&mut self) {
        for &id in self.ids.iter().rev() {
            if !self.table.release(id, self.stamp) {
                tracing::error!(account = id, stamp = self.stamp, "lock lost while held");
            }
        }
    }
}
