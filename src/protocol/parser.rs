//! Zero-Copy Request Parser
//!
//! This module decodes client requests (and log records, which share the same
//! encoding) from a byte buffer. A request is always an array of bulk strings:
//!
//! ```text
//! *<N>\r\n
//! $<len>\r\n<len raw bytes>\r\n      (repeated N times)
//! ```
//!
//! ## How the Parser Works
//!
//! Parsing happens in two steps. First the buffer is scanned and the byte
//! range of every argument is recorded, without copying anything. Then, once
//! a complete frame is known to be present, the frame's bytes are split off
//! the front of the buffer and every argument becomes a cheap `Bytes` slice
//! of that one allocation.
//!
//! The parser returns either:
//! - `Ok(Some(frame))` - A complete frame was consumed from the buffer
//! - `Ok(None)` - The frame is incomplete, the buffer is left untouched
//! - `Err(ParseError)` - The input can never become a valid frame
//!
//! Malformed input is reported as soon as it is detectable, so a connection
//! that sends garbage gets an error instead of waiting forever for bytes
//! that will never make the frame valid.

use crate::protocol::types::{prefix, Frame, CRLF};
use bytes::{Bytes, BytesMut};
use std::ops::Range;
use thiserror::Error;

/// Errors that can occur during request parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A byte other than the expected type marker was found
    #[error("expected '{expected}', got {found:#04x}")]
    InvalidPrefix { expected: char, found: u8 },

    /// A length line is not a non-negative decimal number
    #[error("invalid {kind} length")]
    InvalidLength { kind: &'static str },

    /// A bulk payload is not followed by CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingCrlf,

    /// A bulk string exceeds the maximum allowed size
    #[error("bulk string too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The argument count exceeds the maximum allowed
    #[error("too many arguments: {count} (max: {max})")]
    TooManyArguments { count: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in one request
pub const MAX_ARGS: usize = 1024 * 1024;

/// Longest length line we wait for before declaring it malformed.
/// Twenty digits cover every `u64`.
const MAX_LENGTH_DIGITS: usize = 20;

/// Upper bound on the argument vector capacity reserved up front, so a
/// hostile `*1000000\r\n` header does not allocate before any data arrives.
const PREALLOC_ARGS: usize = 16;

/// Byte layout of a complete frame found at the front of a buffer.
#[derive(Debug)]
struct Layout {
    /// Total bytes the frame occupies
    consumed: usize,
    /// Position of every argument payload
    args: Vec<Range<usize>>,
}

/// Request parser with configurable size limits.
///
/// # Example
///
/// ```
/// use driftkv::protocol::RespParser;
/// use bytes::BytesMut;
///
/// let parser = RespParser::new();
/// let mut buffer = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n*1\r\n"[..]);
///
/// let frame = parser.parse_frame(&mut buffer).unwrap().unwrap();
/// assert_eq!(frame.args()[1].as_ref(), b"name");
///
/// // The second request is still incomplete and stays in the buffer
/// assert!(parser.parse_frame(&mut buffer).unwrap().is_none());
/// assert_eq!(&buffer[..], b"*1\r\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RespParser {
    max_bulk_size: usize,
    max_args: usize,
}

impl Default for RespParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RespParser {
    /// Creates a parser with the default limits.
    pub fn new() -> Self {
        Self {
            max_bulk_size: MAX_BULK_SIZE,
            max_args: MAX_ARGS,
        }
    }

    /// Creates a parser with custom limits.
    pub fn with_limits(max_bulk_size: usize, max_args: usize) -> Self {
        Self {
            max_bulk_size,
            max_args,
        }
    }

    /// Attempts to take one complete frame off the front of `buf`.
    ///
    /// On success exactly the frame's bytes are removed from `buf`.
    /// If the frame is incomplete or malformed, `buf` is not modified.
    pub fn parse_frame(&self, buf: &mut BytesMut) -> ParseResult<Option<Frame>> {
        let layout = match self.scan(buf)? {
            Some(layout) => layout,
            None => return Ok(None),
        };

        let raw = buf.split_to(layout.consumed).freeze();
        let args = layout.args.into_iter().map(|r| raw.slice(r)).collect();

        Ok(Some(Frame::new(args)))
    }

    /// Attempts to parse a frame from a borrowed slice.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((frame, consumed)))` - Parsed a frame occupying `consumed` bytes
    /// - `Ok(None)` - Incomplete data, need more bytes
    /// - `Err(e)` - Malformed data
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
        Ok(self.scan(buf)?.map(|layout| {
            let args = layout
                .args
                .into_iter()
                .map(|r| Bytes::copy_from_slice(&buf[r]))
                .collect();
            (Frame::new(args), layout.consumed)
        }))
    }

    /// Walks the buffer and records where every argument lives.
    fn scan(&self, buf: &[u8]) -> ParseResult<Option<Layout>> {
        let (count, mut pos) = match read_length(buf, 0, prefix::ARRAY, "array")? {
            Some(header) => header,
            None => return Ok(None),
        };

        if count > self.max_args {
            return Err(ParseError::TooManyArguments {
                count,
                max: self.max_args,
            });
        }

        let mut args = Vec::with_capacity(count.min(PREALLOC_ARGS));

        for _ in 0..count {
            let (len, data_start) = match read_length(buf, pos, prefix::BULK_STRING, "bulk")? {
                Some(header) => header,
                None => return Ok(None),
            };

            if len > self.max_bulk_size {
                return Err(ParseError::MessageTooLarge {
                    size: len,
                    max: self.max_bulk_size,
                });
            }

            let data_end = data_start + len;
            if buf.len() < data_end + CRLF.len() {
                return Ok(None);
            }
            if &buf[data_end..data_end + CRLF.len()] != CRLF {
                return Err(ParseError::MissingCrlf);
            }

            args.push(data_start..data_end);
            pos = data_end + CRLF.len();
        }

        Ok(Some(Layout {
            consumed: pos,
            args,
        }))
    }
}

/// Reads a `<marker><digits>\r\n` line starting at `pos`.
///
/// Returns the decoded length and the position right after the CRLF.
fn read_length(
    buf: &[u8],
    pos: usize,
    marker: u8,
    kind: &'static str,
) -> ParseResult<Option<(usize, usize)>> {
    let Some(&found) = buf.get(pos) else {
        return Ok(None);
    };
    if found != marker {
        return Err(ParseError::InvalidPrefix {
            expected: marker as char,
            found,
        });
    }

    let digits_start = pos + 1;
    let line_end = match find_crlf(&buf[digits_start..]) {
        Some(offset) => digits_start + offset,
        None => {
            // No CRLF yet: everything seen so far must still look like digits
            let pending = &buf[digits_start..];
            let trailing_cr = pending.last() == Some(&b'\r');
            let digits = if trailing_cr {
                &pending[..pending.len() - 1]
            } else {
                pending
            };
            if digits.len() > MAX_LENGTH_DIGITS || !digits.iter().all(u8::is_ascii_digit) {
                return Err(ParseError::InvalidLength { kind });
            }
            return Ok(None);
        }
    };

    let digits = &buf[digits_start..line_end];
    let value = parse_decimal(digits).ok_or(ParseError::InvalidLength { kind })?;

    Ok(Some((value, line_end + CRLF.len())))
}

/// Parses a non-empty run of ASCII digits.
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || digits.len() > MAX_LENGTH_DIGITS {
        return None;
    }
    digits.iter().try_fold(0usize, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add((b - b'0') as usize)
    })
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Helper function to parse a single frame from bytes with default limits.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
    RespParser::new().parse(buf)
}
