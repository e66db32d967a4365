//! Errors raised while decoding server replies.

use thiserror::Error;

/// Ways a reply from the server can fail to decode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer ends before the frame does. Read more and retry.
    #[error("incomplete frame: need more data")]
    Incomplete,

    /// The first byte of a frame is not a known type prefix.
    #[error("invalid type prefix: {0:#04x}")]
    InvalidPrefix(u8),

    /// An integer line held something other than an optional sign and digits.
    #[error("invalid integer encoding")]
    InvalidInteger,

    /// A length header was negative (other than the `-1` null marker)
    /// or the payload was not terminated by `\r\n`.
    #[error("invalid frame length: {0}")]
    InvalidFrameLength(i64),

    /// A simple string or error line was not valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// A bulk string declared more bytes than we are willing to buffer.
    #[error("bulk string too large: {0} bytes")]
    BulkStringTooLarge(usize),

    /// An array or map declared more elements than we are willing to hold.
    #[error("too many elements: {0}")]
    TooManyElements(usize),

    /// Arrays and maps nested past the depth limit.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
}
