//! Server Module
//!
//! The single-threaded readiness loop that owns the listening socket, every
//! client [`Connection`](crate::connection::Connection) and the
//! [`CommandHandler`](crate::commands::CommandHandler).
//!
//! ## Example
//!
//! ```no_run
//! use driftkv::commands::CommandHandler;
//! use driftkv::server::{Server, ServerConfig};
//!
//! let server = Server::bind(ServerConfig::default(), CommandHandler::new())?;
//! let shutdown = server.shutdown_handle();
//!
//! let thread = std::thread::spawn(move || server.run());
//! // ... later, from any thread
//! shutdown.trigger();
//! thread.join().expect("event loop panicked")?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod event_loop;

pub use event_loop::{ConnectionKey, Server, ServerConfig, ShutdownHandle};
