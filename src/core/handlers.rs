//! Handler protocols for the three request kinds
//!
//! Each handler resolves its job's completion and reports `Handled`, or gives
//! the job back as `Contended` when a lock it needs belongs to another stamp.
//! A contended attempt has made no storage writes and holds no locks.
//!
//! # Locking
//!
//! ```text
//! balance   no locks
//! transfer  min(sender, recipient), then max(sender, recipient)
//! create    the new account's id
//! ```
//!
//! Every lock attempt draws a fresh fencing stamp and takes its ids in
//! ascending order, so two transfers can never each hold the lock the other
//! one needs. Locks are released through `HeldLocks` before the completion is
//! resolved, which means a caller that sees a response can immediately issue
//! a dependent request without running into its own previous lock.

use crate::core::processor::{BalanceJob, CreateJob, Handling, Shared, TransferJob};
use crate::types::{
    checked_credit, checked_debit, AccountId, Amount, BalanceResponse, CreateRequest,
    CreateResponse, LedgerError, TransferRequest, TransferResponse,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

impl Shared {
    pub(super) fn handle_balance(
        self: Arc<Self>,
        job: BalanceJob,
    ) -> BoxFuture<'static, Handling<BalanceJob>> {
        async move {
            let account_id = job.request.account_id;
            let outcome = self
                .storage
                .balance(account_id)
                .await
                .map(|balance| match balance {
                    Some(balance) => BalanceResponse::success(account_id, balance),
                    None => BalanceResponse::acc_not_exists(),
                });

            job.complete(outcome);
            Handling::Handled
        }
        .boxed()
    }

    pub(super) fn handle_transfer(
        self: Arc<Self>,
        job: TransferJob,
    ) -> BoxFuture<'static, Handling<TransferJob>> {
        async move {
            let TransferRequest {
                sender_id,
                recipient_id,
                amount,
            } = job.request;

            if amount <= 0 {
                job.complete(Ok(TransferResponse::wrong_amount()));
                return Handling::Handled;
            }

            // A self-transfer changes nothing; it only reports the balance.
            if sender_id == recipient_id {
                let outcome = self
                    .storage
                    .balance(sender_id)
                    .await
                    .map(|balance| match balance {
                        Some(balance) => TransferResponse::success(balance, balance),
                        None => TransferResponse::acc_not_exists(),
                    });
                job.complete(outcome);
                return Handling::Handled;
            }

            let stamp = self.next_fencing_stamp();
            let ordered = [sender_id.min(recipient_id), sender_id.max(recipient_id)];
            let Some(held) = self.locks.try_lock_all(&ordered, stamp) else {
                tracing::trace!(
                    sender = sender_id,
                    recipient = recipient_id,
                    stamp,
                    "transfer contended"
                );
                return Handling::Contended(job);
            };

            let outcome = self.transfer_locked(sender_id, recipient_id, amount).await;
            drop(held);

            job.complete(outcome);
            Handling::Handled
        }
        .boxed()
    }

    /// Move `amount` while both accounts are reserved
    async fn transfer_locked(
        &self,
        sender_id: AccountId,
        recipient_id: AccountId,
        amount: Amount,
    ) -> Result<TransferResponse, LedgerError> {
        let (sender_before, recipient_before) = futures::try_join!(
            self.storage.balance(sender_id),
            self.storage.balance(recipient_id)
        )?;

        let (Some(sender_before), Some(recipient_before)) = (sender_before, recipient_before)
        else {
            return Ok(TransferResponse::acc_not_exists());
        };

        let Some(sender_after) = checked_debit(sender_before, amount) else {
            return Ok(TransferResponse::wrong_amount());
        };
        let Some(recipient_after) = checked_credit(recipient_before, amount) else {
            return Ok(TransferResponse::wrong_amount());
        };

        self.storage
            .compare_and_set_balance(sender_id, sender_before, sender_after)
            .await?;
        self.storage
            .compare_and_set_balance(recipient_id, recipient_before, recipient_after)
            .await?;

        tracing::debug!(
            sender = sender_id,
            recipient = recipient_id,
            amount,
            "transfer applied"
        );
        Ok(TransferResponse::success(sender_after, recipient_after))
    }

    pub(super) fn handle_create(
        self: Arc<Self>,
        job: CreateJob,
    ) -> BoxFuture<'static, Handling<CreateJob>> {
        async move {
            let CreateRequest { account_id, amount } = job.request;

            if amount <= 0 {
                job.complete(Ok(CreateResponse::wrong_amount()));
                return Handling::Handled;
            }

            let stamp = self.next_fencing_stamp();
            let Some(held) = self.locks.try_lock_all(&[account_id], stamp) else {
                tracing::trace!(account = account_id, stamp, "create contended");
                return Handling::Contended(job);
            };

            let outcome = self.create_locked(account_id, amount).await;
            drop(held);

            job.complete(outcome);
            Handling::Handled
        }
        .boxed()
    }

    async fn create_locked(
        &self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<CreateResponse, LedgerError> {
        if self.storage.balance(account_id).await?.is_some() {
            return Ok(CreateResponse::already_exists());
        }

        self.storage.create_account(account_id, amount).await?;
        tracing::debug!(account = account_id, amount, "account created");
        Ok(CreateResponse::success())
    }
}
