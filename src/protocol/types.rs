//! RESP (Redis Serialization Protocol) Data Types
//!
//! This module defines the two halves of the wire format that driftkv speaks:
//!
//! - [`Frame`]: an inbound request, always an array of bulk strings.
//!   The append-only log stores frames in exactly the same encoding.
//! - [`RespValue`]: an outbound reply, one of five scalar kinds.
//!
//! ## Protocol Format
//!
//! Each RESP type starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! All types are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-ERR unknown command 'FOO'\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Request: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`
//! Null Bulk String: `$-1\r\n`

use bytes::{BufMut, Bytes};
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// Tag written in front of every error reply
pub const ERROR_TAG: &[u8] = b"ERR ";

/// Literal form of the null bulk string
pub const NULL_BULK: &[u8] = b"$-1\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A reply sent back to a client.
///
/// Every variant encodes to a fixed wire form and encoding can never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Status line without binary payload.
    /// Format: `+<string>\r\n`
    SimpleString(String),

    /// Error message. The `ERR ` tag is added on the wire, not stored here.
    /// Format: `-ERR <message>\r\n`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe payload.
    /// Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Missing value.
    /// Format: `$-1\r\n`
    Null,
}

impl RespValue {
    /// Creates a new simple string response.
    ///
    /// # Example
    /// ```
    /// use driftkv::protocol::types::RespValue;
    /// let ok = RespValue::simple_string("OK");
    /// assert_eq!(ok.serialize(), b"+OK\r\n");
    /// ```
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates a new error response.
    ///
    /// # Example
    /// ```
    /// use driftkv::protocol::types::RespValue;
    /// let err = RespValue::error("usage: GET key");
    /// assert_eq!(err.serialize(), b"-ERR usage: GET key\r\n");
    /// ```
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates a new integer response.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a new bulk string response.
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Creates a null response.
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Common response for successful operations
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Common response for PONG
    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes the RESP value to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the RESP value into an existing buffer.
    ///
    /// Connections call this with their outbound `BytesMut` so replies are
    /// written straight into the send queue.
    pub fn serialize_into<B: BufMut>(&self, buf: &mut B) {
        match self {
            RespValue::SimpleString(s) => {
                buf.put_u8(prefix::SIMPLE_STRING);
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.put_u8(prefix::ERROR);
                buf.put_slice(ERROR_TAG);
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.put_u8(prefix::INTEGER);
                buf.put_slice(n.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(data) => put_bulk(buf, data),
            RespValue::Null => buf.put_slice(NULL_BULK),
        }
    }

    /// Returns true if this value is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Attempts to extract the inner integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract the inner bytes from BulkString.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) ERR {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            RespValue::Null => write!(f, "(nil)"),
        }
    }
}

/// One complete request: the ordered arguments of a command.
///
/// The first argument is the command name. Arguments are arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    args: Vec<Bytes>,
}

impl Frame {
    /// Wraps already-split arguments into a frame.
    pub fn new(args: Vec<Bytes>) -> Self {
        Self { args }
    }

    /// Builds a frame from string arguments. Mostly useful in tests and benches.
    ///
    /// # Example
    /// ```
    /// use driftkv::protocol::Frame;
    /// let frame = Frame::from_strs(&["GET", "name"]);
    /// assert_eq!(frame.encode(), b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
    /// ```
    pub fn from_strs(args: &[&str]) -> Self {
        Self {
            args: args
                .iter()
                .map(|s| Bytes::copy_from_slice(s.as_bytes()))
                .collect(),
        }
    }

    /// All arguments, command name included.
    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// Number of arguments, command name included.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if the frame carries no arguments at all (`*0\r\n`).
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The command name as sent by the client.
    pub fn name(&self) -> Option<&Bytes> {
        self.args.first()
    }

    /// Number of bytes [`Frame::encode_into`] will write.
    pub fn encoded_len(&self) -> usize {
        let header = 1 + decimal_len(self.args.len()) + 2;
        self.args.iter().fold(header, |acc, arg| {
            acc + 1 + decimal_len(arg.len()) + 2 + arg.len() + 2
        })
    }

    /// Encodes the frame in request form: `*<N>\r\n` followed by N bulk strings.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Encodes the frame in request form into an existing buffer.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(prefix::ARRAY);
        buf.put_slice(self.args.len().to_string().as_bytes());
        buf.put_slice(CRLF);
        for arg in &self.args {
            put_bulk(buf, arg);
        }
    }
}

fn put_bulk<B: BufMut>(buf: &mut B, data: &[u8]) {
    buf.put_u8(prefix::BULK_STRING);
    buf.put_slice(data.len().to_string().as_bytes());
    buf.put_slice(CRLF);
    buf.put_slice(data);
    buf.put_slice(CRLF);
}

#[inline]
fn decimal_len(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
