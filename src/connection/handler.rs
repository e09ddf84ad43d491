//! Connection Handler Module
//!
//! This module holds the per-client state machine. A [`Connection`] owns the
//! socket plus an inbound and an outbound buffer; the event loop calls
//! [`Connection::on_readable`] and [`Connection::on_writable`] when the
//! reactor reports readiness and looks at [`Connection::wants_write`] and
//! [`Connection::is_closed`] afterwards.
//!
//! ## Connection Lifecycle
//!
//! ```text
//!            accept()
//!               │
//!               ▼
//!        ┌────────────┐   read → parse → execute → queue reply
//!        │   Active   │ ◄──────────────────────────────────┐
//!        └─────┬──────┘ ───────────────────────────────────┘
//!              │
//!              │ EOF, or malformed frame (error reply queued)
//!              ▼
//!        ┌────────────┐   no more reads, outbound drained
//!        │  Draining  │ ──────────────────────┐
//!        └─────┬──────┘                       │
//!              │ outbound empty               │ hard I/O error
//!              ▼                              ▼
//!        ┌─────────────────────────────────────────┐
//!        │                 Closed                  │
//!        └─────────────────────────────────────────┘
//! ```
//!
//! ## Buffer Management
//!
//! Sockets are non-blocking and edge-triggered, so every readiness event
//! drains the socket until it reports `WouldBlock`. TCP is a stream protocol:
//! one read may carry half a command or several pipelined ones, so complete
//! frames are parsed and executed after every chunk and the remainder stays in
//! the inbound buffer.

use crate::commands::CommandHandler;
use crate::metrics::ServerStats;
use crate::protocol::{ParseError, RespParser, RespValue};
use bytes::{Buf, BytesMut};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use tracing::{debug, trace, warn};

/// Size of a single socket read
pub const READ_CHUNK_SIZE: usize = 4096;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Reading requests and queueing replies
    Active,
    /// No more reads; queued replies are still being sent
    Draining,
    /// Ready to be dropped
    Closed,
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed request
    #[error("Protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// Client closed its side of the connection
    #[error("Client disconnected")]
    ClientDisconnected,
}

/// A single client connection.
///
/// Generic over the stream so the state machine can be driven without a
/// reactor; the server uses `mio::net::TcpStream`.
#[derive(Debug)]
pub struct Connection<S = mio::net::TcpStream> {
    /// The non-blocking stream for this connection
    stream: S,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes received but not yet parsed into frames
    inbound: BytesMut,

    /// Encoded replies not yet accepted by the socket
    outbound: BytesMut,

    /// RESP parser
    parser: RespParser,

    state: ConnectionState,

    /// Why the connection stopped reading, if it did
    close_reason: Option<ConnectionError>,

    /// Whether the reactor currently watches this stream for writability
    write_interest: bool,
}

impl<S: Read + Write> Connection<S> {
    /// Wraps an accepted stream.
    pub fn new(stream: S, addr: SocketAddr) -> Self {
        Self {
            stream,
            addr,
            inbound: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            outbound: BytesMut::new(),
            parser: RespParser::new(),
            state: ConnectionState::Active,
            close_reason: None,
            write_interest: false,
        }
    }

    /// Handles read readiness.
    ///
    /// Reads until the socket would block, executing every complete frame as
    /// it arrives, then tries to send the queued replies.
    ///
    /// # Returns
    ///
    /// An error only for unrecoverable socket failures; the connection is
    /// already marked closed when that happens.
    pub fn on_readable(&mut self, handler: &mut CommandHandler) -> Result<(), ConnectionError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while self.state == ConnectionState::Active {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    trace!(client = %self.addr, buffered = self.inbound.len(), "EOF from client");
                    self.stop_reading(ConnectionError::ClientDisconnected);
                }
                Ok(n) => {
                    handler.stats_mut().bytes_read(n);
                    trace!(client = %self.addr, bytes = n, "Read data");
                    self.inbound.extend_from_slice(&chunk[..n]);
                    self.process_inbound(handler);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.fail(e)),
            }
        }

        self.on_writable(handler.stats_mut())
    }

    /// Handles write readiness: sends queued replies until the buffer is
    /// empty or the socket would block.
    pub fn on_writable(&mut self, stats: &mut ServerStats) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }

        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => {
                    let e = io::Error::new(io::ErrorKind::WriteZero, "socket accepted no bytes");
                    return Err(self.fail(e));
                }
                Ok(n) => {
                    self.outbound.advance(n);
                    stats.bytes_written(n);
                    trace!(client = %self.addr, bytes = n, "Sent response");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.fail(e)),
            }
        }

        if self.state == ConnectionState::Draining && self.outbound.is_empty() {
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    /// Parses and executes every complete frame in the inbound buffer.
    fn process_inbound(&mut self, handler: &mut CommandHandler) {
        loop {
            match self.parser.parse_frame(&mut self.inbound) {
                Ok(Some(frame)) => {
                    let response = handler.execute(frame);
                    response.serialize_into(&mut self.outbound);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(client = %self.addr, error = %e, "Parse error");
                    handler.stats_mut().protocol_error();
                    RespValue::error(format!("Protocol error: {}", e))
                        .serialize_into(&mut self.outbound);
                    self.inbound.clear();
                    self.stop_reading(ConnectionError::Protocol(e));
                    break;
                }
            }
        }
    }

    fn stop_reading(&mut self, reason: ConnectionError) {
        self.state = ConnectionState::Draining;
        self.close_reason = Some(reason);
    }

    fn fail(&mut self, e: io::Error) -> ConnectionError {
        debug!(client = %self.addr, error = %e, "Connection error");
        self.state = ConnectionState::Closed;
        self.outbound.clear();
        ConnectionError::Io(e)
    }

    /// True while replies are queued for a connection that is not closed.
    pub fn wants_write(&self) -> bool {
        self.state != ConnectionState::Closed && !self.outbound.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Why the connection stopped reading (EOF or protocol error), if it did.
    pub fn close_reason(&self) -> Option<&ConnectionError> {
        self.close_reason.as_ref()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn write_interest(&self) -> bool {
        self.write_interest
    }

    pub fn set_write_interest(&mut self, enabled: bool) {
        self.write_interest = enabled;
    }

    /// Bytes received but not yet forming a complete frame.
    pub fn buffered_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Encoded reply bytes waiting for the socket.
    pub fn buffered_outbound(&self) -> usize {
        self.outbound.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// One scripted outcome of a `read` call.
    enum ReadStep {
        Data(Vec<u8>),
        WouldBlock,
        Interrupted,
        Eof,
        Fail,
    }

    /// In-memory stream with scripted reads and a bounded write window.
    struct MockStream {
        reads: VecDeque<ReadStep>,
        written: Vec<u8>,
        /// Bytes accepted before writes start to block
        write_window: usize,
        fail_writes: bool,
    }

    impl MockStream {
        fn new(reads: Vec<ReadStep>) -> Self {
            Self {
                reads: reads.into(),
                written: Vec::new(),
                write_window: usize::MAX,
                fail_writes: false,
            }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(ReadStep::Data(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.reads.push_front(ReadStep::Data(data[n..].to_vec()));
                    }
                    Ok(n)
                }
                Some(ReadStep::WouldBlock) | None => Err(io::ErrorKind::WouldBlock.into()),
                Some(ReadStep::Interrupted) => Err(io::ErrorKind::Interrupted.into()),
                Some(ReadStep::Eof) => Ok(0),
                Some(ReadStep::Fail) => Err(io::ErrorKind::ConnectionReset.into()),
            }
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            if self.write_window == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(self.write_window);
            self.written.extend_from_slice(&buf[..n]);
            self.write_window -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn connection(reads: Vec<ReadStep>) -> Connection<MockStream> {
        let addr = "127.0.0.1:40000".parse().unwrap();
        Connection::new(MockStream::new(reads), addr)
    }

    fn data(bytes: &[u8]) -> ReadStep {
        ReadStep::Data(bytes.to_vec())
    }

    #[test]
    fn test_ping_pong() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![data(b"*1\r\n$4\r\nPING\r\n")]);

        conn.on_readable(&mut handler).unwrap();

        assert_eq!(conn.stream_mut().written, b"+PONG\r\n");
        assert_eq!(conn.state(), ConnectionState::Active);
        assert!(!conn.wants_write());
        assert_eq!(handler.stats().bytes_read, 14);
        assert_eq!(handler.stats().bytes_written, 7);
    }

    #[test]
    fn test_pipelined_commands_in_order() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![data(
            b"*3\r\n$3\r\nSET\r\n$2\r\nk1\r\n$2\r\nv1\r\n*2\r\n$3\r\nGET\r\n$2\r\nk1\r\n*2\r\n$3\r\nDEL\r\n$2\r\nk1\r\n",
        )]);

        conn.on_readable(&mut handler).unwrap();

        assert_eq!(conn.stream_mut().written, b"+OK\r\n$2\r\nv1\r\n:1\r\n");
        assert_eq!(handler.stats().commands_processed, 3);
    }

    #[test]
    fn test_frame_split_across_reads() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![
            data(b"*2\r\n$4\r\nEC"),
            ReadStep::Interrupted,
            data(b"HO\r\n$5\r\nhel"),
            ReadStep::WouldBlock,
            data(b"lo\r\n"),
        ]);

        conn.on_readable(&mut handler).unwrap();
        assert!(conn.stream_mut().written.is_empty());
        assert_eq!(conn.buffered_inbound(), 21);

        conn.on_readable(&mut handler).unwrap();
        assert_eq!(conn.stream_mut().written, b"$5\r\nhello\r\n");
        assert_eq!(conn.buffered_inbound(), 0);
    }

    #[test]
    fn test_replies_wait_for_write_readiness() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![data(b"*1\r\n$4\r\nPING\r\n")]);
        conn.stream_mut().write_window = 3;

        conn.on_readable(&mut handler).unwrap();
        assert_eq!(conn.stream_mut().written, b"+PO");
        assert!(conn.wants_write());

        conn.stream_mut().write_window = usize::MAX;
        conn.on_writable(handler.stats_mut()).unwrap();
        assert_eq!(conn.stream_mut().written, b"+PONG\r\n");
        assert!(!conn.wants_write());
    }

    #[test]
    fn test_eof_drains_then_closes() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![data(b"*1\r\n$4\r\nPING\r\n"), ReadStep::Eof]);
        conn.stream_mut().write_window = 0;

        conn.on_readable(&mut handler).unwrap();
        assert_eq!(conn.state(), ConnectionState::Draining);
        assert!(matches!(
            conn.close_reason(),
            Some(ConnectionError::ClientDisconnected)
        ));
        assert!(conn.wants_write());

        conn.stream_mut().write_window = usize::MAX;
        conn.on_writable(handler.stats_mut()).unwrap();
        assert!(conn.is_closed());
        assert_eq!(conn.stream_mut().written, b"+PONG\r\n");
    }

    #[test]
    fn test_eof_with_nothing_pending_closes_immediately() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![ReadStep::Eof]);

        conn.on_readable(&mut handler).unwrap();
        assert!(conn.is_closed());
    }

    #[test]
    fn test_protocol_error_replies_and_closes() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![
            data(b"*1\r\n$4\r\nPING\r\n"),
            data(b"+PING\r\n"),
            data(b"*1\r\n$4\r\nPING\r\n"),
        ]);

        conn.on_readable(&mut handler).unwrap();

        let written = String::from_utf8(conn.stream_mut().written.clone()).unwrap();
        assert!(written.starts_with("+PONG\r\n-ERR Protocol error: "));
        assert_eq!(written.matches("PONG").count(), 1);
        assert!(conn.is_closed());
        assert!(matches!(
            conn.close_reason(),
            Some(ConnectionError::Protocol(ParseError::InvalidPrefix { .. }))
        ));
        assert_eq!(handler.stats().protocol_errors, 1);
    }

    #[test]
    fn test_read_error_closes() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![data(b"*1\r\n$4\r\nPI"), ReadStep::Fail]);

        let err = conn.on_readable(&mut handler).unwrap_err();
        assert!(matches!(err, ConnectionError::Io(_)));
        assert!(conn.is_closed());
        assert!(!conn.wants_write());
    }

    #[test]
    fn test_write_error_closes() {
        let mut handler = CommandHandler::new();
        let mut conn = connection(vec![data(b"*1\r\n$4\r\nPING\r\n")]);
        conn.stream_mut().fail_writes = true;

        assert!(conn.on_readable(&mut handler).is_err());
        assert!(conn.is_closed());
        assert_eq!(conn.buffered_outbound(), 0);
    }
}
