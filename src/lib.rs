//! # driftkv - A Single-Threaded In-Memory Key-Value Store
//!
//! driftkv is a Redis-compatible (RESP subset), in-memory key-value store
//! written in Rust. One thread drives every socket through a readiness
//! multiplexer, keys can expire, and writes survive restarts through an
//! append-only command log.
//!
//! ## Features
//!
//! - **Redis-Compatible**: Speaks RESP request arrays and the common key commands
//! - **Single-Threaded**: No locks; commands run in the order their bytes arrive
//! - **TTL Support**: Lazy expiry on access plus a budgeted sweep every tick
//! - **Durable**: Buffered append-only file with a configurable fsync policy
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               driftkv                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ Event loop  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (mio Poll)  │    │ (buffers)   │    │  Handler    │                  │
//! │  └──────┬──────┘    └─────────────┘    └──┬───────┬──┘                  │
//! │         │ every tick                      │       │                     │
//! │         │                                 ▼       ▼                     │
//! │         │        ┌─────────────────────────────┐ ┌───────────────────┐  │
//! │         ├──────> │ StorageEngine + ExpiryIndex │ │  AppendOnlyLog    │  │
//! │         │ sweep  └─────────────────────────────┘ │ pending → file    │  │
//! │         └──────────────────────────────────────> └───────────────────┘  │
//! │                          tick (flush / fsync)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use driftkv::commands::CommandHandler;
//! use driftkv::persistence::{AofConfig, AppendOnlyLog};
//! use driftkv::server::{Server, ServerConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     // Open the log and rebuild the keyspace from it
//!     let aof = AppendOnlyLog::open("data.aof", AofConfig::default())?;
//!     let mut handler = CommandHandler::with_aof(aof);
//!     handler.replay_aof()?;
//!
//!     // Serve clients until the shutdown handle fires
//!     let server = Server::bind(ServerConfig::default(), handler)?;
//!     server.run()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET key value`
//! - `GET key`
//! - `DEL key [key ...]`
//! - `EXISTS key [key ...]`
//! - `EXPIRE key seconds`
//! - `TTL key` / `PTTL key`
//! - `PERSIST key`
//!
//! ### Server Commands
//! - `PING [message]`
//! - `ECHO message`
//! - `INFO`
//! - `DBSIZE`
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP request parser and reply types
//! - [`storage`]: Keyspace with lazy and active expiry
//! - [`commands`]: Command dispatch and execution
//! - [`persistence`]: Append-only file and replay
//! - [`connection`]: Per-client buffers and state machine
//! - [`server`]: The readiness event loop
//! - [`metrics`]: Counters reported by INFO
//!
//! ## Design Highlights
//!
//! ### Zero-Copy Parsing
//!
//! The RESP parser splits complete frames off the inbound `BytesMut` and hands
//! out `Bytes` slices of it, so keys and values are never copied on the way
//! into the keyspace.
//!
//! ### Generation-Tagged Tokens
//!
//! Connections live in a slot map. The reactor token of each connection is
//! its slot key including the generation, so a late event for a closed client
//! can never reach the client that reused its slot.

pub mod commands;
pub mod connection;
pub mod metrics;
pub mod persistence;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use connection::{Connection, ConnectionError};
pub use metrics::ServerStats;
pub use persistence::{AofConfig, AofError, AppendOnlyLog, FsyncPolicy};
pub use protocol::{Frame, ParseError, RespParser, RespValue};
pub use server::{Server, ServerConfig, ShutdownHandle};
pub use storage::StorageEngine;

/// The default port driftkv listens on
pub const DEFAULT_PORT: u16 = 6380;

/// The default host driftkv binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// The default append-only file path
pub const DEFAULT_AOF_PATH: &str = "data.aof";

/// Version of driftkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
