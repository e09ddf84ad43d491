//! RESP Protocol Implementation
//!
//! This module implements the subset of the Redis Serialization Protocol (RESP)
//! that driftkv speaks: requests are arrays of bulk strings, replies are one of
//! five scalar kinds.
//!
//! ## Modules
//!
//! - `types`: The `Frame` request type, the `RespValue` reply type and their encoders
//! - `parser`: Zero-copy, strict parser for incoming requests
//!
//! ## Example
//!
//! ```
//! use driftkv::protocol::{parse_message, Frame, RespValue};
//! use bytes::Bytes;
//!
//! // Parsing incoming data
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (frame, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(frame, Frame::from_strs(&["GET", "name"]));
//! assert_eq!(consumed, data.len());
//!
//! // Creating responses
//! let response = RespValue::bulk_string(Bytes::from("Ariz"));
//! assert_eq!(response.serialize(), b"$4\r\nAriz\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::{Frame, RespValue};
