//! Expiry Index and Monotonic Clock
//!
//! Keys with a TTL are expired in two ways:
//! 1. **Lazy**: When a key is accessed, we check if it's expired
//! 2. **Active**: The event loop calls [`StorageEngine::sweep`] on every tick,
//!    which pops due deadlines off the [`ExpiryIndex`]
//!
//! ## Why Do We Need the Index?
//!
//! Lazy expiry is cheap but a key that is never accessed again would stay in
//! memory forever. Scanning the whole map on every tick is too expensive, so
//! deadlines are kept in a min-heap and the sweep only looks at the ones that
//! are already due.
//!
//! ## Stale Pairs
//!
//! The index is append-only: every EXPIRE pushes a new `(deadline, key)` pair,
//! even if the key already has one. Deletes and overwrites do not touch the
//! heap either. A popped pair is therefore only honoured if the key's current
//! deadline is exactly the popped one; everything else is discarded.
//!
//! [`StorageEngine::sweep`]: crate::storage::StorageEngine::sweep

use bytes::Bytes;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Source of monotonic milliseconds used for every deadline.
///
/// Deadlines are only meaningful within one process; the clock starts at zero
/// when it is created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock was created.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    /// Whole seconds elapsed since the clock was created.
    pub fn uptime_secs(&self) -> u64 {
        self.origin.elapsed().as_secs()
    }
}

/// Min-ordered collection of `(deadline, key)` pairs.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    heap: BinaryHeap<Reverse<(u64, Bytes)>>,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `key` for `deadline`. Earlier pairs for the same key are kept.
    pub fn push(&mut self, deadline: u64, key: Bytes) {
        self.heap.push(Reverse((deadline, key)));
    }

    /// The smallest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Removes and returns the pair with the smallest deadline if it is due.
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, Bytes)> {
        match self.next_deadline() {
            Some(deadline) if deadline <= now => self.heap.pop().map(|Reverse(pair)| pair),
            _ => None,
        }
    }

    /// Number of pairs, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Outcome of one proactive sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Keys actually removed (each one consumed a unit of budget)
    pub evicted: u64,
    /// Stale pairs thrown away without touching the keyspace
    pub discarded: u64,
}
