//! Request processing engine
//!
//! This module provides `RequestProcessor`, which accepts balance, transfer and
//! create requests, queues them, and serves them with a fixed pool of worker
//! threads.
//!
//! # Architecture
//!
//! ```text
//! RequestProcessor
//!     ├── Arc<Shared>
//!     │     ├── RetriableBoundedQueue<BalanceJob>   (balance lookups)
//!     │     ├── RetriableBoundedQueue<TransferJob>  (transfers)
//!     │     ├── RetriableBoundedQueue<CreateJob>    (account creation)
//!     │     ├── AccountLocks                        (per-account reservation)
//!     │     ├── Arc<dyn Storage>                    (balance backend)
//!     │     └── parking Mutex + Condvar             (idle workers)
//!     └── worker threads (ledger-worker-N)
//! ```
//!
//! # Flow
//!
//! 1. `submit_*` offers the request to its queue. A full queue resolves the
//!    completion as OVERLOADED on the spot; nothing waits.
//! 2. A worker drains the balance queue, then the transfer queue, then the
//!    create queue, and hands each item to the tokio runtime. Storage calls
//!    therefore never occupy a worker thread.
//! 3. When the handler finishes, the item is acked (slot freed, every queue's
//!    reserve released, idle workers woken) or, on lock contention, nacked.
//!
//! # Parking
//!
//! A worker with nothing to poll counts itself as sleeping, re-checks the
//! queues under the parking mutex and only then waits on the condition
//! variable. Every event that can create work (submission, ack, requeue)
//! broadcasts under the same mutex when anyone is sleeping, so a wake-up can
//! not slip between the re-check and the wait.
//!
//! # Panicking handlers
//!
//! Contention hands the item back to its queue through `nack`. A handler
//! that panics cannot do that: the job, including the caller's reply
//! channel, is dropped while unwinding. Such an item is acked instead, which
//! frees its slot and every lock it held, and the caller's completion
//! resolves as `Abandoned`. Retrying it would replay the same panic anyway.

use crate::config::ProcessorConfig;
use crate::core::locks::AccountLocks;
use crate::core::queue::{NackOutcome, QueueStats, RetriableBoundedQueue, Stamp, Stamped};
use crate::core::traits::Storage;
use crate::types::{
    BalanceRequest, BalanceResponse, CreateRequest, CreateResponse, LedgerError, Reply, Request,
    Response, TransferRequest, TransferResponse,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{fence, AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// A queued request and the channel its caller waits on
pub(crate) struct Job<Q, R> {
    pub(crate) request: Q,
    reply: oneshot::Sender<Result<R, LedgerError>>,
}

pub(crate) type BalanceJob = Job<BalanceRequest, BalanceResponse>;
pub(crate) type TransferJob = Job<TransferRequest, TransferResponse>;
pub(crate) type CreateJob = Job<CreateRequest, CreateResponse>;

impl<Q, R> Job<Q, R> {
    fn new(request: Q) -> (Self, oneshot::Receiver<Result<R, LedgerError>>) {
        let (reply, receiver) = oneshot::channel();
        (Self { request, reply }, receiver)
    }

    /// Resolve the caller's completion; consumes the job
    pub(crate) fn complete(self, outcome: Result<R, LedgerError>) {
        if let Err(error) = &outcome {
            if error.is_invariant_violation() {
                tracing::error!(%error, "storage contradicted the lock table");
            } else {
                tracing::warn!(%error, "request failed");
            }
        }

        if self.reply.send(outcome).is_err() {
            tracing::debug!("caller dropped its completion before it resolved");
        }
    }
}

/// What a handler did with the item it was given
pub(crate) enum Handling<J> {
    /// The caller's completion was resolved; ack the item
    Handled,

    /// A lock was held by someone else; the item comes back for a nack
    Contended(J),
}

type Handler<J> = fn(Arc<Shared>, J) -> BoxFuture<'static, Handling<J>>;
type QueueSelector<J> = fn(&Shared) -> &RetriableBoundedQueue<J>;

/// Caller-side handle on a submitted request
///
/// Resolved immediately for overloaded submissions, otherwise once a worker
/// has served the request.
#[derive(Debug)]
pub struct Completion<R> {
    state: CompletionState<R>,
}

#[derive(Debug)]
enum CompletionState<R> {
    Ready(Result<R, LedgerError>),
    Pending(oneshot::Receiver<Result<R, LedgerError>>),
}

impl<R: Reply> Completion<R> {
    fn ready(outcome: Result<R, LedgerError>) -> Self {
        Self {
            state: CompletionState::Ready(outcome),
        }
    }

    fn pending(receiver: oneshot::Receiver<Result<R, LedgerError>>) -> Self {
        Self {
            state: CompletionState::Pending(receiver),
        }
    }

    /// Whether the outcome was decided at submission time
    pub fn is_ready(&self) -> bool {
        matches!(self.state, CompletionState::Ready(_))
    }

    /// Wait for the outcome
    ///
    /// Business rejections arrive as `Ok` responses; `Err` means the request
    /// failed or was abandoned.
    pub async fn wait(self) -> Result<R, LedgerError> {
        match self.state {
            CompletionState::Ready(outcome) => outcome,
            CompletionState::Pending(receiver) => {
                receiver.await.unwrap_or_else(|_| Err(LedgerError::Abandoned))
            }
        }
    }

    /// Wait for the outcome, rendering failures as an internal-error response
    pub async fn resolve(self) -> R {
        self.wait().await.unwrap_or_else(|_| R::internal_error())
    }
}

/// Occupancy of the processor at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorStats {
    pub balance: QueueStats,
    pub transfer: QueueStats,
    pub create: QueueStats,
    /// Accounts currently reserved by a handler
    pub held_locks: usize,
    /// Workers parked on the wake condition
    pub sleeping_workers: usize,
}

/// State shared by the submission API, the workers and the handler tasks
pub(crate) struct Shared {
    pub(super) balance_queue: RetriableBoundedQueue<BalanceJob>,
    pub(super) transfer_queue: RetriableBoundedQueue<TransferJob>,
    pub(super) create_queue: RetriableBoundedQueue<CreateJob>,
    pub(super) locks: AccountLocks,
    pub(super) storage: Arc<dyn Storage>,

    /// Fencing stamps for lock attempts, shared by every handler
    fencing: AtomicU64,

    runtime: Handle,
    parking: Mutex<()>,
    wakeup: Condvar,
    sleeping: AtomicUsize,
    stopping: AtomicBool,
}

impl Shared {
    pub(super) fn next_fencing_stamp(&self) -> Stamp {
        self.fencing.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn balance_queue(&self) -> &RetriableBoundedQueue<BalanceJob> {
        &self.balance_queue
    }

    fn transfer_queue(&self) -> &RetriableBoundedQueue<TransferJob> {
        &self.transfer_queue
    }

    fn create_queue(&self) -> &RetriableBoundedQueue<CreateJob> {
        &self.create_queue
    }

    fn queues_empty(&self) -> bool {
        self.balance_queue.is_empty() && self.transfer_queue.is_empty() && self.create_queue.is_empty()
    }

    fn submit<Q, R: Reply>(
        &self,
        queue: &RetriableBoundedQueue<Job<Q, R>>,
        request: Q,
    ) -> Completion<R> {
        if self.stopping.load(Ordering::SeqCst) {
            return Completion::ready(Err(LedgerError::Abandoned));
        }

        self.wake_parked();

        let (job, receiver) = Job::new(request);
        if queue.offer(job).is_err() {
            tracing::debug!(capacity = queue.capacity(), "queue full, request rejected");
            return Completion::ready(Ok(R::overloaded()));
        }

        self.wake_parked();
        Completion::pending(receiver)
    }

    /// Broadcast to parked workers, if there are any
    fn wake_parked(&self) {
        // Pairs with the sleeping increment in `park`: either the worker's
        // re-check sees our enqueue, or we see its increment.
        fence(Ordering::SeqCst);
        if self.sleeping.load(Ordering::SeqCst) > 0 {
            self.wake_all();
        }
    }

    fn wake_all(&self) {
        let _guard = self.parking.lock().unwrap_or_else(PoisonError::into_inner);
        self.wakeup.notify_all();
    }

    fn park(&self) {
        self.sleeping.fetch_add(1, Ordering::SeqCst);
        // Pairs with the fence in `wake_parked`
        fence(Ordering::SeqCst);
        {
            let guard = self.parking.lock().unwrap_or_else(PoisonError::into_inner);
            if self.queues_empty() && !self.stopping.load(Ordering::SeqCst) {
                let _guard = self
                    .wakeup
                    .wait(guard)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        self.sleeping.fetch_sub(1, Ordering::SeqCst);
    }

    fn run_worker(self: Arc<Self>, index: usize) {
        tracing::debug!(worker = index, "worker started");

        while !self.stopping.load(Ordering::SeqCst) {
            if self.queues_empty() {
                self.park();
            }

            self.drain(Shared::balance_queue, Shared::handle_balance);
            self.drain(Shared::transfer_queue, Shared::handle_transfer);
            self.drain(Shared::create_queue, Shared::handle_create);
        }

        tracing::debug!(worker = index, "worker stopped");
    }

    /// Poll one queue until it is empty, spawning a handler task per item
    fn drain<J: Send + 'static>(self: &Arc<Self>, select: QueueSelector<J>, handler: Handler<J>) {
        while let Some(Stamped { stamp, item }) = select(self).poll() {
            let shared = Arc::clone(self);
            self.runtime.spawn(async move {
                let outcome = AssertUnwindSafe(handler(Arc::clone(&shared), item))
                    .catch_unwind()
                    .await;
                shared.settle(select, stamp, outcome);
            });
        }
    }

    fn settle<J>(
        &self,
        select: QueueSelector<J>,
        stamp: Stamp,
        outcome: std::thread::Result<Handling<J>>,
    ) {
        let queue = select(self);
        match outcome {
            Ok(Handling::Handled) => self.acknowledge(queue, stamp),
            Ok(Handling::Contended(item)) => match queue.nack(stamp, item) {
                NackOutcome::Requeued => self.wake_parked(),
                NackOutcome::Reserved => tracing::trace!(stamp, "item parked in reserve"),
            },
            Err(_) => {
                // The payload went down with the handler, so there is nothing
                // to nack. Free the slot; the caller sees an abandoned request.
                tracing::error!(stamp, "request handler panicked");
                self.acknowledge(queue, stamp);
            }
        }
    }

    fn acknowledge<J>(&self, queue: &RetriableBoundedQueue<J>, stamp: Stamp) {
        queue.ack(stamp);
        self.release_mutually_reserved();
        self.wake_parked();
    }

    /// Advance the watermark and release the reserve of every queue
    ///
    /// All queues share one lock table, so an item parked in one queue may be
    /// waiting on a lock released by a handler from another queue. Advancing
    /// the watermark as well covers an item that is still in flight: when it
    /// is nacked later it is requeued instead of parked with no ack to come.
    fn release_mutually_reserved(&self) {
        self.balance_queue.examine();
        self.transfer_queue.examine();
        self.create_queue.examine();
    }

    fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            balance: self.balance_queue.stats(),
            transfer: self.transfer_queue.stats(),
            create: self.create_queue.stats(),
            held_locks: self.locks.len(),
            sleeping_workers: self.sleeping.load(Ordering::SeqCst),
        }
    }
}

/// The request processing engine
///
/// Owns the worker threads. Dropping the processor stops them; requests still
/// queued at that point resolve as `Abandoned`.
pub struct RequestProcessor {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl RequestProcessor {
    /// Start a processor whose handlers run on the current tokio runtime
    pub fn start(config: ProcessorConfig, storage: Arc<dyn Storage>) -> Result<Self, LedgerError> {
        let runtime = Handle::try_current()
            .map_err(|e| LedgerError::config(format!("No tokio runtime available: {}", e)))?;
        Self::start_with_handle(config, storage, runtime)
    }

    /// Start a processor whose handlers run on `runtime`
    pub fn start_with_handle(
        config: ProcessorConfig,
        storage: Arc<dyn Storage>,
        runtime: Handle,
    ) -> Result<Self, LedgerError> {
        let config = config.validated();

        let shared = Arc::new(Shared {
            balance_queue: RetriableBoundedQueue::new(config.balance_queue_size),
            transfer_queue: RetriableBoundedQueue::new(config.transfer_queue_size),
            create_queue: RetriableBoundedQueue::new(config.create_queue_size),
            locks: AccountLocks::new(),
            storage,
            fencing: AtomicU64::new(0),
            runtime,
            parking: Mutex::new(()),
            wakeup: Condvar::new(),
            sleeping: AtomicUsize::new(0),
            stopping: AtomicBool::new(false),
        });

        let mut processor = Self {
            shared,
            workers: Vec::with_capacity(config.pool_size),
        };

        for index in 0..config.pool_size {
            let shared = Arc::clone(&processor.shared);
            let worker = std::thread::Builder::new()
                .name(format!("ledger-worker-{}", index))
                .spawn(move || shared.run_worker(index))?;
            processor.workers.push(worker);
        }

        tracing::info!(
            pool_size = config.pool_size,
            balance_queue = config.balance_queue_size,
            transfer_queue = config.transfer_queue_size,
            create_queue = config.create_queue_size,
            "request processor started"
        );

        Ok(processor)
    }

    /// Queue a balance lookup
    pub fn submit_balance(&self, request: BalanceRequest) -> Completion<BalanceResponse> {
        self.shared.submit(&self.shared.balance_queue, request)
    }

    /// Queue a transfer
    pub fn submit_transfer(&self, request: TransferRequest) -> Completion<TransferResponse> {
        self.shared.submit(&self.shared.transfer_queue, request)
    }

    /// Queue an account creation
    pub fn submit_create(&self, request: CreateRequest) -> Completion<CreateResponse> {
        self.shared.submit(&self.shared.create_queue, request)
    }

    /// Submit any request and wait for its response
    ///
    /// Failures are rendered as INTERNAL_ERROR responses.
    pub async fn execute(&self, request: Request) -> Response {
        match request {
            Request::Balance(req) => Response::Balance(self.submit_balance(req).resolve().await),
            Request::Transfer(req) => {
                Response::Transfer(self.submit_transfer(req).resolve().await)
            }
            Request::Create(req) => Response::Create(self.submit_create(req).resolve().await),
        }
    }

    pub fn stats(&self) -> ProcessorStats {
        self.shared.stats()
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.shared.storage
    }

    /// Stop and join every worker
    ///
    /// Handler tasks already running on the runtime finish normally. Later
    /// submissions resolve as `Abandoned`.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.shared.stopping.store(true, Ordering::SeqCst);
        self.shared.wake_all();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }

        tracing::info!("request processor stopped");
    }
}

impl Drop for RequestProcessor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
