//! Incremental reply parser.
//!
//! Works on whatever bytes the caller has buffered so far. A frame that
//! is cut off returns `Ok(None)` and leaves the buffer untouched, so the
//! caller reads more from the socket and tries again.
//!
//! Redis answers RESP2 clients with `$-1` for a missing bulk string and
//! `*-1` for a missing array. Both decode to [`Frame::Null`].

use std::io::Cursor;

use bytes::Bytes;

use crate::error::ProtocolError;
use crate::types::Frame;

/// Maximum nesting depth for arrays.
const MAX_NESTING_DEPTH: usize = 64;

/// Maximum number of elements in one array or map.
const MAX_ARRAY_ELEMENTS: usize = 1_048_576;

/// Maximum bulk string length (512 MB, the Redis limit).
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Upper bound on up-front `Vec` capacity for arrays and maps. A SCAN
/// batch may declare thousands of keys; the vector grows past this as
/// elements actually arrive.
const PREALLOC_CAP: usize = 1024;

/// Tries to decode one complete frame from the front of `buf`.
///
/// Returns `Ok(Some((frame, consumed)))` on success, `Ok(None)` when
/// more data is needed, or an error when the bytes are malformed.
pub fn parse_frame(buf: &[u8]) -> Result<Option<(Frame, usize)>, ProtocolError> {
    if buf.is_empty() {
        return Ok(None);
    }

    let mut cursor = Cursor::new(buf);
    match parse_at(&mut cursor, 0) {
        Ok(frame) => Ok(Some((frame, cursor.position() as usize))),
        Err(ProtocolError::Incomplete) => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_at(cursor: &mut Cursor<&[u8]>, depth: usize) -> Result<Frame, ProtocolError> {
    match read_byte(cursor)? {
        b'+' => {
            let line = read_line(cursor)?;
            let s = std::str::from_utf8(line)
                .map_err(|_| ProtocolError::InvalidUtf8("simple string"))?;
            Ok(Frame::Simple(s.to_owned()))
        }
        b'-' => {
            let line = read_line(cursor)?;
            let s = std::str::from_utf8(line)
                .map_err(|_| ProtocolError::InvalidUtf8("error reply"))?;
            Ok(Frame::Error(s.to_owned()))
        }
        b':' => Ok(Frame::Integer(read_integer_line(cursor)?)),
        b'$' => parse_bulk(cursor),
        b'*' => {
            let Some(count) = read_count(cursor, depth)? else {
                return Ok(Frame::Null);
            };
            let mut frames = Vec::with_capacity(count.min(PREALLOC_CAP));
            for _ in 0..count {
                frames.push(parse_at(cursor, depth + 1)?);
            }
            Ok(Frame::Array(frames))
        }
        other => Err(ProtocolError::InvalidPrefix(other)),
    }
}

fn parse_bulk(cursor: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
    let len = read_integer_line(cursor)?;
    if len == -1 {
        return Ok(Frame::Null);
    }
    if len < 0 {
        return Err(ProtocolError::InvalidFrameLength(len));
    }
    if len > MAX_BULK_LEN {
        return Err(ProtocolError::BulkStringTooLarge(len as usize));
    }
    let len = len as usize;

    let pos = cursor.position() as usize;
    let buf = *cursor.get_ref();
    if buf.len().saturating_sub(pos) < len + 2 {
        return Err(ProtocolError::Incomplete);
    }
    if &buf[pos + len..pos + len + 2] != b"\r\n" {
        return Err(ProtocolError::InvalidFrameLength(len as i64));
    }

    cursor.set_position((pos + len + 2) as u64);
    Ok(Frame::Bulk(Bytes::copy_from_slice(&buf[pos..pos + len])))
}

/// Reads an aggregate header. `None` is the RESP2 null aggregate (`-1`).
fn read_count(cursor: &mut Cursor<&[u8]>, depth: usize) -> Result<Option<usize>, ProtocolError> {
    if depth + 1 > MAX_NESTING_DEPTH {
        return Err(ProtocolError::NestingTooDeep(MAX_NESTING_DEPTH));
    }
    let count = read_integer_line(cursor)?;
    if count == -1 {
        return Ok(None);
    }
    if count < 0 {
        return Err(ProtocolError::InvalidFrameLength(count));
    }
    if count as usize > MAX_ARRAY_ELEMENTS {
        return Err(ProtocolError::TooManyElements(count as usize));
    }
    Ok(Some(count as usize))
}

fn read_byte(cursor: &mut Cursor<&[u8]>) -> Result<u8, ProtocolError> {
    let pos = cursor.position() as usize;
    let byte = *cursor.get_ref().get(pos).ok_or(ProtocolError::Incomplete)?;
    cursor.set_position((pos + 1) as u64);
    Ok(byte)
}

/// Returns the bytes up to the next `\r\n` and moves the cursor past it.
fn read_line<'a>(cursor: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let buf = *cursor.get_ref();
    let start = cursor.position() as usize;
    if start >= buf.len() {
        return Err(ProtocolError::Incomplete);
    }

    let mut pos = start;
    while let Some(offset) = memchr::memchr(b'\r', &buf[pos..]) {
        let cr = pos + offset;
        if buf.get(cr + 1) == Some(&b'\n') {
            cursor.set_position((cr + 2) as u64);
            return Ok(&buf[start..cr]);
        }
        pos = cr + 1;
    }

    Err(ProtocolError::Incomplete)
}

fn read_integer_line(cursor: &mut Cursor<&[u8]>) -> Result<i64, ProtocolError> {
    parse_i64_bytes(read_line(cursor)?)
}

/// Parses a decimal i64 from raw bytes. Negative values accumulate
/// downward so that `i64::MIN` does not overflow.
fn parse_i64_bytes(buf: &[u8]) -> Result<i64, ProtocolError> {
    let (negative, digits) = match buf.split_first() {
        Some((&b'-', rest)) => (true, rest),
        Some(_) => (false, buf),
        None => return Err(ProtocolError::InvalidInteger),
    };
    if digits.is_empty() {
        return Err(ProtocolError::InvalidInteger);
    }

    let mut n: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(ProtocolError::InvalidInteger);
        }
        let digit = (b - b'0') as i64;
        let next = n.checked_mul(10).and_then(|n| {
            if negative {
                n.checked_sub(digit)
            } else {
                n.checked_add(digit)
            }
        });
        n = next.ok_or(ProtocolError::InvalidInteger)?;
    }
    Ok(n)
}
