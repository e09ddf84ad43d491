//! Persistence Module
//!
//! Durability for driftkv is an append-only file of write commands, replayed
//! on startup to rebuild the keyspace.
//!
//! ## Modules
//!
//! - `aof`: The buffered log, its flush/fsync schedule and the replay loop

pub mod aof;

pub use aof::{
    drain_into, replay_frames, AofConfig, AofError, AppendOnlyLog, FsyncPolicy, ReplaySummary,
};
