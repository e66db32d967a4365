//! Reply frame types.
//!
//! A [`Frame`] is one decoded server reply. Bulk payloads are kept as
//! `Bytes` because key names are binary-safe and may not be UTF-8.

use bytes::Bytes;

/// A single decoded RESP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Status reply, e.g. `+OK\r\n` or `+PONG\r\n`.
    Simple(String),

    /// Error reply, e.g. `-WRONGTYPE Operation against a key\r\n`.
    Error(String),

    /// Integer reply, e.g. `:42\r\n`.
    Integer(i64),

    /// Binary-safe bulk string, e.g. `$5\r\nhello\r\n`.
    Bulk(Bytes),

    /// Array of frames. SCAN replies are a two-element array of
    /// cursor and key batch.
    Array(Vec<Frame>),

    /// Absent value. Decoded from `$-1` and `*-1`.
    Null,
}

impl Frame {
    /// Returns the raw payload of a bulk or simple string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Frame::Bulk(b) => Some(b),
            Frame::Simple(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Returns the payload of a bulk or simple string as text, replacing
    /// invalid UTF-8 sequences.
    pub fn to_text(&self) -> Option<String> {
        self.as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Returns the value of an integer reply.
    ///
    /// Bulk strings holding a decimal integer are accepted too, since
    /// some servers report counters that way.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Frame::Integer(n) => Some(*n),
            Frame::Bulk(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            _ => None,
        }
    }
}
