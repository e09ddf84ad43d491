//! Storage Engine Module
//!
//! This module provides the keyspace for driftkv: a single-threaded map of
//! binary keys to binary values with per-key deadlines, plus the ordered
//! expiry index used by the proactive sweep.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │          HashMap<Bytes, Entry>  +  ExpiryIndex              │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ sweep(now, budget) every tick
//!              ┌─────────────┴─────────────┐
//!              │        Event loop         │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Lazy Expiry**: Expired keys are evicted on access
//! - **Active Expiry**: Due deadlines are popped from a min-heap each tick
//! - **Budgeted Sweep**: At most `budget` real evictions per tick
//!
//! ## Example
//!
//! ```
//! use driftkv::storage::{MonotonicClock, StorageEngine};
//! use bytes::Bytes;
//!
//! let clock = MonotonicClock::new();
//! let mut engine = StorageEngine::new();
//!
//! engine.set(Bytes::from("session"), Bytes::from("token123"));
//! let now = clock.now_ms();
//! engine.expire_at(b"session", now + 3_600_000, now);
//! assert!(engine.ttl(b"session", now).unwrap() > 3_500);
//! ```

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{Entry, StorageEngine, StorageStats};
pub use expiry::{ExpiryIndex, MonotonicClock, SweepStats};
