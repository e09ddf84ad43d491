//! Readiness Event Loop
//!
//! One thread, one `mio::Poll`, no locks. Every iteration waits for readiness
//! (bounded by `poll_timeout`), services the ready sockets, then runs the
//! expiry sweep and the append-only file tick whether or not anything
//! happened.
//!
//! ## Iteration
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ poll(timeout = 50ms)                                         │
//! │   LISTENER  → accept until WouldBlock, register READABLE     │
//! │   WAKER     → nothing (shutdown flag checked below)          │
//! │   client    → on_readable / on_writable, fix interest, reap  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ handler.sweep(budget)                                        │
//! │ handler.tick_aof(now)                                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tokens
//!
//! Client tokens carry the FFI encoding of the connection's slot key, which
//! includes the slot generation. An event for a connection that was closed
//! earlier in the same batch (or whose slot was reused) resolves to a missing
//! key and is dropped.

use crate::commands::CommandHandler;
use crate::connection::Connection;
use crate::DEFAULT_PORT;
use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

const LISTENER: Token = Token(usize::MAX);
const WAKER: Token = Token(usize::MAX - 1);

new_key_type! {
    /// Generation-tagged handle to a live connection.
    pub struct ConnectionKey;
}

/// Event loop configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
    /// Upper bound on a single readiness wait
    pub poll_timeout: Duration,
    /// Maximum keys evicted by one proactive sweep
    pub sweep_budget: usize,
    /// Capacity of the readiness event buffer
    pub max_events: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            poll_timeout: Duration::from_millis(50),
            sweep_budget: 200,
            max_events: 128,
        }
    }
}

/// Asks a running [`Server`] to stop from any thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Sets the stop flag and wakes the poll so the loop notices promptly.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Err(e) = self.waker.wake() {
            warn!(error = %e, "Failed to wake event loop");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The single-threaded server: listener, connections and command handler.
pub struct Server {
    config: ServerConfig,
    poll: Poll,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    connections: SlotMap<ConnectionKey, Connection>,
    handler: CommandHandler,
}

impl Server {
    /// Binds the listener and prepares the poll. No connection is accepted
    /// until [`Server::run`].
    pub fn bind(config: ServerConfig, handler: CommandHandler) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(config.addr)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Waker::new(poll.registry(), WAKER)?;

        Ok(Self {
            config,
            poll,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
                waker: Arc::new(waker),
            },
            connections: SlotMap::with_key(),
            handler,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Runs the event loop until shutdown is triggered.
    ///
    /// Returns an error only if the poll itself fails.
    pub fn run(mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(self.config.max_events);
        info!(addr = %self.local_addr()?, "Event loop started");

        while !self.shutdown.is_triggered() {
            match self.poll.poll(&mut events, Some(self.config.poll_timeout)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_connections(),
                    WAKER => {}
                    token => self.connection_event(token, event),
                }
            }

            let swept = self.handler.sweep(self.config.sweep_budget);
            if swept.evicted > 0 {
                trace!(
                    evicted = swept.evicted,
                    discarded = swept.discarded,
                    "Expired keys swept"
                );
            }
            self.handler.tick_aof(Instant::now());
        }

        info!(clients = self.connections.len(), "Event loop stopping");
        self.handler.tick_aof(Instant::now());
        for (_, mut conn) in self.connections.drain() {
            if let Err(e) = self.poll.registry().deregister(conn.stream_mut()) {
                debug!(client = %conn.addr(), error = %e, "Deregister failed");
            }
            self.handler.stats_mut().connection_closed();
        }
        Ok(())
    }

    /// Accepts every pending connection.
    fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let key = self.connections.insert(Connection::new(stream, addr));
                    let conn = &mut self.connections[key];

                    if let Err(e) = self.poll.registry().register(
                        conn.stream_mut(),
                        token_for(key),
                        Interest::READABLE,
                    ) {
                        warn!(client = %addr, error = %e, "Failed to register client");
                        self.connections.remove(key);
                        continue;
                    }

                    self.handler.stats_mut().connection_opened();
                    debug!(client = %addr, "Client connected");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    break;
                }
            }
        }
    }

    /// Dispatches one readiness event to its connection.
    fn connection_event(&mut self, token: Token, event: &Event) {
        let key = key_for(token);
        let Some(conn) = self.connections.get_mut(key) else {
            trace!(token = token.0, "Event for stale token ignored");
            return;
        };

        let mut result = Ok(());
        if event.is_readable() || event.is_read_closed() || event.is_error() {
            result = conn.on_readable(&mut self.handler);
        }
        if result.is_ok() && event.is_writable() {
            result = conn.on_writable(self.handler.stats_mut());
        }
        if let Err(e) = result {
            debug!(client = %conn.addr(), error = %e, "Connection error");
        }

        if conn.is_closed() {
            self.close_connection(key);
            return;
        }

        let wants_write = conn.wants_write();
        if wants_write != conn.write_interest() {
            let interest = if wants_write {
                Interest::READABLE | Interest::WRITABLE
            } else {
                Interest::READABLE
            };
            match self
                .poll
                .registry()
                .reregister(conn.stream_mut(), token, interest)
            {
                Ok(()) => conn.set_write_interest(wants_write),
                Err(e) => {
                    warn!(client = %conn.addr(), error = %e, "Failed to update interest");
                    self.close_connection(key);
                }
            }
        }
    }

    /// Deregisters and drops a connection.
    fn close_connection(&mut self, key: ConnectionKey) {
        if let Some(mut conn) = self.connections.remove(key) {
            if let Err(e) = self.poll.registry().deregister(conn.stream_mut()) {
                debug!(client = %conn.addr(), error = %e, "Deregister failed");
            }
            self.handler.stats_mut().connection_closed();

            match conn.close_reason() {
                Some(reason) => debug!(client = %conn.addr(), reason = %reason, "Client closed"),
                None => debug!(client = %conn.addr(), "Client closed"),
            }
        }
    }
}

fn token_for(key: ConnectionKey) -> Token {
    Token(key.data().as_ffi() as usize)
}

fn key_for(token: Token) -> ConnectionKey {
    KeyData::from_ffi(token.0 as u64).into()
}
