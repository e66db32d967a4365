//! keyscope-protocol: RESP wire codec for the keyscope client.
//!
//! Parses the RESP2 replies a Redis-compatible server sends back and
//! encodes outgoing commands as arrays of bulk strings.
//!
//! # quick start
//!
//! ```
//! use bytes::BytesMut;
//! use keyscope_protocol::{encode_command, parse_frame, Frame};
//!
//! let (frame, consumed) = parse_frame(b"$-1\r\n").unwrap().unwrap();
//! assert_eq!(frame, Frame::Null);
//! assert_eq!(consumed, 5);
//!
//! let mut buf = BytesMut::new();
//! encode_command(&[b"TYPE".as_slice(), b"user:1".as_slice()], &mut buf);
//! assert_eq!(&buf[..], b"*2\r\n$4\r\nTYPE\r\n$6\r\nuser:1\r\n");
//! ```

pub mod error;
pub mod parse;
mod serialize;
pub mod types;

pub use error::ProtocolError;
pub use parse::parse_frame;
pub use serialize::encode_command;
pub use types::Frame;
