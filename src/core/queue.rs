//! Bounded work queue with an ack/nack protocol and a reserve area
//!
//! This module provides `RetriableBoundedQueue`, the queue each request kind is
//! offered to. It behaves like a plain bounded FIFO for producers, but
//! consumers must settle every polled item:
//!
//! - `ack` confirms the item was processed. It frees one unit of capacity and
//!   moves every reserved item back to the pollable end.
//! - `nack` returns an item that could not make progress. If anything was
//!   acked since the item was stamped, conditions may have changed and it is
//!   requeued immediately. Otherwise it is parked in the reserve area, where it
//!   cannot be polled until the next ack releases it.
//!
//! # Capacity Accounting
//!
//! ```text
//! offer ──▶ [ pollable ] ──poll──▶ in flight ──ack──▶ slot freed
//!               ▲                     │
//!               │◀──── nack (retry) ──┤
//!               │                     ▼
//!               └── ack / release ── [ reserve ]
//! ```
//!
//! A slot is taken by `offer` and only returned by `ack`; polling and nacking
//! never touch it, so pollable + reserved + in-flight never exceeds capacity.
//!
//! # Ordering
//!
//! Items are polled in the order they reached the pollable end. Items released
//! from the reserve return to the pollable end in no guaranteed order.

use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Sequence number assigned to a queue item at enqueue or requeue time
///
/// Also used by the processor as a lock fencing token.
pub type Stamp = u64;

/// An item together with the stamp it was (re)enqueued under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<T> {
    pub stamp: Stamp,
    pub item: T,
}

/// Where a nacked item ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NackOutcome {
    /// Back at the pollable end; a consumer may pick it up right away
    Requeued,

    /// Parked in the reserve area until the next ack
    Reserved,
}

/// Point-in-time view of a queue's occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Items that `poll` can return
    pub pollable: usize,

    /// Items parked after a nack
    pub reserved: usize,

    /// Offers that would currently be accepted
    pub free_capacity: usize,
}

/// Bounded FIFO with ack/nack settlement and a reserve area
///
/// All operations are non-blocking and safe to call from any number of
/// threads through a shared reference.
#[derive(Debug)]
pub struct RetriableBoundedQueue<T> {
    capacity: usize,

    /// Slots not taken by a pollable, reserved or in-flight item
    free: AtomicUsize,

    /// Source of item stamps and ack watermarks
    stamper: AtomicU64,

    /// Stamp drawn by the most recent ack
    last_examined: AtomicU64,

    pollable: SegQueue<Stamped<T>>,
    reserve: SegQueue<Stamped<T>>,
}

impl<T> RetriableBoundedQueue<T> {
    /// Create a queue that holds at most `capacity` unsettled items
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: AtomicUsize::new(capacity),
            stamper: AtomicU64::new(0),
            last_examined: AtomicU64::new(0),
            pollable: SegQueue::new(),
            reserve: SegQueue::new(),
        }
    }

    fn next_stamp(&self) -> Stamp {
        self.stamper.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Enqueue an item if a slot is free
    ///
    /// Never blocks. A full queue hands the item back so the caller can reject
    /// it immediately.
    pub fn offer(&self, item: T) -> Result<(), T> {
        let reserved_slot = self
            .free
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |free| free.checked_sub(1));

        if reserved_slot.is_err() {
            return Err(item);
        }

        self.pollable.push(Stamped {
            stamp: self.next_stamp(),
            item,
        });
        Ok(())
    }

    /// Take the next pollable item, if any
    ///
    /// The item keeps its slot until it is acked.
    pub fn poll(&self) -> Option<Stamped<T>> {
        self.pollable.pop()
    }

    /// Settle a polled item as processed
    ///
    /// Advances the watermark past every stamp issued so far, releases the
    /// reserve area and frees the item's slot.
    pub fn ack(&self, stamp: Stamp) {
        let released = self.examine();

        let previous = self.free.fetch_add(1, Ordering::SeqCst);
        debug_assert!(previous < self.capacity, "ack without a matching offer");

        tracing::trace!(stamp, released, "queue item acked");
    }

    /// Return a polled item that could not make progress
    ///
    /// The item is restamped either way; its slot stays taken.
    pub fn nack(&self, stamp: Stamp, item: T) -> NackOutcome {
        if self.last_examined.load(Ordering::SeqCst) > stamp {
            self.pollable.push(Stamped {
                stamp: self.next_stamp(),
                item,
            });
            return NackOutcome::Requeued;
        }

        self.reserve.push(Stamped {
            stamp: self.next_stamp(),
            item,
        });

        // An ack may have landed between the check above and the push; its
        // release could have missed the item.
        if self.last_examined.load(Ordering::SeqCst) > stamp {
            self.release_reserved();
            return NackOutcome::Requeued;
        }

        NackOutcome::Reserved
    }

    /// Advance the watermark and release the reserve, as an ack does, without
    /// freeing a slot
    ///
    /// Used when progress elsewhere (an ack on a queue sharing the same
    /// resources) may have unblocked items of this queue. Any item stamped
    /// before this call that is nacked afterwards is requeued rather than
    /// parked. Returns the number of items released.
    pub fn examine(&self) -> usize {
        let watermark = self.next_stamp();
        self.last_examined.fetch_max(watermark, Ordering::SeqCst);
        self.release_reserved()
    }

    /// Move every reserved item back to the pollable end
    ///
    /// Returns the number of items moved.
    pub fn release_reserved(&self) -> usize {
        let mut moved = 0;
        while let Some(entry) = self.reserve.pop() {
            self.pollable.push(entry);
            moved += 1;
        }
        moved
    }

    /// Number of pollable items (reserved and in-flight items excluded)
    pub fn size(&self) -> usize {
        self.pollable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollable.is_empty()
    }

    /// Number of parked items
    pub fn reserved(&self) -> usize {
        self.reserve.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pollable: self.pollable.len(),
            reserved: self.reserve.len(),
            free_capacity: self.free.load(Ordering::SeqCst),
        }
    }
}
