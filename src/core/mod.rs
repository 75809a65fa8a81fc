//! Core business logic module
//!
//! This module contains the request processing components:
//! - `queue` - Bounded queue with ack/nack settlement and a reserve area
//! - `locks` - Per-account advisory locks with fencing stamps
//! - `traits` - The storage abstraction the processor depends on
//! - `memory_store` - In-memory storage backend
//! - `processor` - Worker pool, submission API and queue settlement
//! - `handlers` - Balance, transfer and create protocols

mod handlers;
pub mod locks;
pub mod memory_store;
pub mod processor;
pub mod queue;
pub mod traits;

pub use locks::{AccountLocks, HeldLocks};
pub use memory_store::InMemoryStorage;
pub use processor::{Completion, ProcessorStats, RequestProcessor};
pub use queue::{NackOutcome, QueueStats, RetriableBoundedQueue, Stamp, Stamped};
pub use traits::Storage;
