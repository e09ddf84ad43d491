//! Single-Threaded Storage Engine with Expiry Support
//!
//! This module implements the core storage engine for driftkv: a HashMap of
//! binary keys to binary values, each with an optional absolute deadline.
//!
//! ## Design Decisions
//!
//! 1. **No Locks**: The engine is owned by the command handler and only ever
//!    touched from the event loop thread, so every method takes `&mut self`.
//! 2. **Explicit Time**: Every operation receives `now` in monotonic
//!    milliseconds. The caller owns the clock, which keeps the engine
//!    deterministic under test.
//! 3. **Lazy + Active Expiry**: Keys are checked on access, and
//!    [`StorageEngine::sweep`] removes due keys from the [`ExpiryIndex`].
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌──────────────────────────┐  ┌─────────────────────────┐  │
//! │  │ HashMap<Bytes, Entry>    │  │ ExpiryIndex (min-heap)  │  │
//! │  │  value + Option<deadline>│  │  (deadline, key) pairs  │  │
//! │  └──────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::storage::expiry::{ExpiryIndex, SweepStats};
use bytes::Bytes;
use std::collections::HashMap;

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// Absolute deadline in monotonic milliseconds (None = never expires)
    pub expires_at: Option<u64>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Checks if this entry has expired at `now`.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    /// Returns the remaining TTL in milliseconds, or None if no expiry.
    pub fn ttl_ms(&self, now: u64) -> Option<u64> {
        self.expires_at
            .map(|deadline| deadline.saturating_sub(now))
    }
}

/// The main storage engine for driftkv.
///
/// # Example
///
/// ```
/// use driftkv::storage::StorageEngine;
/// use bytes::Bytes;
///
/// let mut engine = StorageEngine::new();
///
/// // Set a key
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"));
///
/// // Get the value
/// assert_eq!(engine.get(b"name", 0), Some(Bytes::from("Ariz")));
///
/// // Give it a deadline 60s from t=0 and sweep at t=60s
/// assert!(engine.expire_at(b"name", 60_000, 0));
/// assert_eq!(engine.sweep(60_000, 10).evicted, 1);
/// assert!(engine.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct StorageEngine {
    /// Key → entry map
    data: HashMap<Bytes, Entry>,

    /// Pending deadlines, possibly stale
    expiry: ExpiryIndex,

    /// Statistics: number of keys evicted because they expired
    expired_count: u64,
}

impl StorageEngine {
    /// Creates an empty storage engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evicts `key` if its deadline has passed.
    ///
    /// Returns `true` if the key was expired and removed.
    fn expire_if_due(&mut self, key: &[u8], now: u64) -> bool {
        let due = self
            .data
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));

        if due {
            self.data.remove(key);
            self.expired_count += 1;
        }
        due
    }

    /// Sets a key-value pair without expiry.
    ///
    /// If the key already exists, its value is overwritten and any deadline is
    /// cleared. Pending index pairs for the key become stale.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new key was created, `false` if an existing key was updated.
    pub fn set(&mut self, key: Bytes, value: Bytes) -> bool {
        self.data.insert(key, Entry::new(value)).is_none()
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub fn get(&mut self, key: &[u8], now: u64) -> Option<Bytes> {
        self.expire_if_due(key, now);
        self.data.get(key).map(|entry| entry.value.clone())
    }

    /// Gets the full entry for a key (including its deadline).
    pub fn get_entry(&mut self, key: &[u8], now: u64) -> Option<&Entry> {
        self.expire_if_due(key, now);
        self.data.get(key)
    }

    /// Deletes a key from the database.
    ///
    /// An already expired key is evicted as expired and not reported as deleted.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live key was deleted.
    pub fn delete(&mut self, key: &[u8], now: u64) -> bool {
        self.expire_if_due(key, now);
        self.data.remove(key).is_some()
    }

    /// Deletes multiple keys from the database.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were deleted.
    pub fn delete_many<K: AsRef<[u8]>>(&mut self, keys: &[K], now: u64) -> u64 {
        let mut deleted = 0;
        for key in keys {
            if self.delete(key.as_ref(), now) {
                deleted += 1;
            }
        }
        deleted
    }

    /// Checks if a key exists (and is not expired).
    pub fn exists(&mut self, key: &[u8], now: u64) -> bool {
        self.expire_if_due(key, now);
        self.data.contains_key(key)
    }

    /// Counts how many of the given keys exist. Duplicates count every time.
    pub fn exists_many<K: AsRef<[u8]>>(&mut self, keys: &[K], now: u64) -> u64 {
        let mut found = 0;
        for key in keys {
            if self.exists(key.as_ref(), now) {
                found += 1;
            }
        }
        found
    }

    /// Sets an absolute deadline on an existing key.
    ///
    /// A deadline at or before `now` makes the key disappear on the next access.
    ///
    /// # Returns
    ///
    /// Returns `true` if the deadline was set, `false` if the key doesn't exist.
    pub fn expire_at(&mut self, key: &[u8], deadline: u64, now: u64) -> bool {
        if self.expire_if_due(key, now) {
            return false;
        }

        let stored_key = match self.data.get_key_value(key) {
            Some((stored_key, _)) => stored_key.clone(),
            None => return false,
        };

        if let Some(entry) = self.data.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        self.expiry.push(deadline, stored_key);
        true
    }

    /// Removes the deadline from a key (makes it persistent).
    ///
    /// # Returns
    ///
    /// Returns `true` if a deadline was removed, `false` if the key doesn't
    /// exist or didn't have one.
    pub fn persist(&mut self, key: &[u8], now: u64) -> bool {
        self.expire_if_due(key, now);
        match self.data.get_mut(key) {
            Some(entry) => entry.expires_at.take().is_some(),
            None => false,
        }
    }

    /// Gets the remaining TTL for a key in milliseconds.
    ///
    /// # Returns
    ///
    /// - `Some(ms)` if the key exists and has an expiry
    /// - `Some(-1)` if the key exists but has no expiry
    /// - `None` if the key doesn't exist
    pub fn pttl(&mut self, key: &[u8], now: u64) -> Option<i64> {
        self.get_entry(key, now).map(|entry| {
            entry
                .ttl_ms(now)
                .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX))
                .unwrap_or(-1)
        })
    }

    /// Gets the remaining TTL for a key in whole seconds, rounded down.
    ///
    /// Same conventions as [`StorageEngine::pttl`].
    pub fn ttl(&mut self, key: &[u8], now: u64) -> Option<i64> {
        self.pttl(key, now)
            .map(|ms| if ms < 0 { ms } else { ms / 1000 })
    }

    /// Removes keys whose deadline has passed, oldest deadline first.
    ///
    /// Every true eviction consumes one unit of `budget`. Stale pairs (key
    /// gone, overwritten, or given a different deadline) are discarded for
    /// free, so one call may discard any number of them.
    pub fn sweep(&mut self, now: u64, budget: usize) -> SweepStats {
        let mut stats = SweepStats::default();
        let mut budget = budget;

        while budget > 0 {
            let Some((deadline, key)) = self.expiry.pop_due(now) else {
                break;
            };

            let live = self
                .data
                .get(&key)
                .is_some_and(|entry| entry.is_expired(now) && entry.expires_at == Some(deadline));

            if live {
                self.data.remove(&key);
                self.expired_count += 1;
                stats.evicted += 1;
                budget -= 1;
            } else {
                stats.discarded += 1;
            }
        }

        stats
    }

    /// Returns the number of keys in the database, including expired keys
    /// that have not been evicted yet.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns true if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns database statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len(),
            expired: self.expired_count,
            pending_expiries: self.expiry.len() as u64,
        }
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total keys evicted because their deadline passed
    pub expired: u64,
    /// Pairs in the expiry index, stale ones included
    pub pending_expiries: u64,
}
