//! Connection Handler Module
//!
//! This module manages individual client connections to driftkv.
//! Connections do not own a task or a thread: the event loop drives each one
//! through its readiness callbacks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Event loop (server module)                  │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ readable / writable
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Connection                              │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Parse RESP  │───>│ Execute cmd │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────────┐    │
//! │                                      │ Outbound buffer │    │
//! │                                      └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Non-blocking I/O**: Reads and writes stop at `WouldBlock`
//! - **Buffer Management**: BytesMut buffers for both directions
//! - **Pipelining**: Supports multiple commands in a single TCP packet
//! - **Strict Framing**: A malformed request is answered and the connection closed

pub mod handler;

// Re-export commonly used types
pub use handler::{Connection, ConnectionError, ConnectionState, READ_CHUNK_SIZE};
