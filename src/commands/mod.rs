//! Command Handler Module
//!
//! This module implements the command processing layer for driftkv.
//! It receives parsed request frames, executes them against the storage engine,
//! logs successful writes and returns the reply to encode.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │ Frame
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └───┬─────────┬───┘
//!     │         │
//!     ▼         ▼
//! Storage   AppendOnlyLog
//! ```
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET`, `GET`, `DEL`, `EXISTS`
//! - `EXPIRE`, `TTL`, `PTTL`, `PERSIST`
//!
//! ### Server Commands
//! - `PING`, `ECHO`, `INFO`, `DBSIZE`

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
