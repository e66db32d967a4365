//! Direct-to-buffer encoding.
//!
//! Commands go out as arrays of bulk strings. `Frame::serialize` covers
//! the reply side and is what test servers use to answer the client.

use bytes::{BufMut, BytesMut};

use crate::types::Frame;

/// Encodes a command as a RESP array of bulk strings.
///
/// Arguments are written straight into `dst` without building an
/// intermediate [`Frame`], so binary key names pass through untouched.
pub fn encode_command<A: AsRef<[u8]>>(args: &[A], dst: &mut BytesMut) {
    dst.put_u8(b'*');
    write_len(args.len(), dst);
    for arg in args {
        let arg = arg.as_ref();
        dst.put_u8(b'$');
        write_len(arg.len(), dst);
        dst.put_slice(arg);
        dst.put_slice(b"\r\n");
    }
}

impl Frame {
    /// Serializes this frame into `dst`.
    ///
    /// `Null` is written in its RESP2 form (`$-1`), which every
    /// Redis-compatible client understands.
    pub fn serialize(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => {
                dst.put_u8(b'+');
                dst.put_slice(s.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Frame::Error(msg) => {
                dst.put_u8(b'-');
                dst.put_slice(msg.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Frame::Integer(n) => {
                dst.put_u8(b':');
                let mut buf = itoa::Buffer::new();
                dst.put_slice(buf.format(*n).as_bytes());
                dst.put_slice(b"\r\n");
            }
            Frame::Bulk(data) => {
                dst.put_u8(b'$');
                write_len(data.len(), dst);
                dst.put_slice(data);
                dst.put_slice(b"\r\n");
            }
            Frame::Array(items) => {
                dst.put_u8(b'*');
                write_len(items.len(), dst);
                for item in items {
                    item.serialize(dst);
                }
            }
            Frame::Null => dst.put_slice(b"$-1\r\n"),
        }
    }
}

/// Writes a length header followed by `\r\n`.
fn write_len(len: usize, dst: &mut BytesMut) {
    let mut buf = itoa::Buffer::new();
    dst.put_slice(buf.format(len).as_bytes());
    dst.put_slice(b"\r\n");
}
