//! RESP2 framing (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`); always go through `get()`.
//! - An incomplete frame decodes to `Ok(None)` and consumes nothing, so the
//!   caller can read more bytes and retry.
//! - Lengths are bounded before any allocation.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::StoreError;

/// Largest bulk string accepted from the wire (512 MiB, the store's own cap).
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Largest array accepted from the wire.
pub const MAX_ARRAY_LEN: i64 = 1024 * 1024;
/// Nesting limit for arrays.
const MAX_DEPTH: usize = 8;

/// One RESP2 value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// Null bulk string or null array.
    Null,
    Array(Vec<Frame>),
}

/// Encode a command as an array of bulk strings (`INCR counter`).
pub fn encode_command(args: &[&[u8]], dst: &mut BytesMut) {
    dst.put_u8(b'*');
    dst.put_slice(args.len().to_string().as_bytes());
    dst.put_slice(b"\r\n");
    for arg in args {
        put_bulk(arg, dst);
    }
}

/// Encode any frame. Store-side replies in tests go through here.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    match frame {
        Frame::Simple(s) => put_line(b'+', s.as_bytes(), dst),
        Frame::Error(s) => put_line(b'-', s.as_bytes(), dst),
        Frame::Integer(n) => put_line(b':', n.to_string().as_bytes(), dst),
        Frame::Bulk(b) => put_bulk(b, dst),
        Frame::Null => dst.put_slice(b"$-1\r\n"),
        Frame::Array(items) => {
            put_line(b'*', items.len().to_string().as_bytes(), dst);
            for item in items {
                encode_frame(item, dst);
            }
        }
    }
}

/// Decode one frame from the front of `src`.
///
/// Returns `Ok(None)` when `src` does not yet hold a whole frame; `src` is
/// only advanced when a frame is returned.
pub fn decode(src: &mut BytesMut) -> Result<Option<Frame>, StoreError> {
    let mut pos = 0;
    match parse(&src[..], &mut pos, 0)? {
        Some(frame) => {
            src.advance(pos);
            Ok(Some(frame))
        }
        None => Ok(None),
    }
}

fn put_line(tag: u8, body: &[u8], dst: &mut BytesMut) {
    dst.put_u8(tag);
    dst.put_slice(body);
    dst.put_slice(b"\r\n");
}

fn put_bulk(data: &[u8], dst: &mut BytesMut) {
    put_line(b'$', data.len().to_string().as_bytes(), dst);
    dst.put_slice(data);
    dst.put_slice(b"\r\n");
}

fn parse(buf: &[u8], pos: &mut usize, depth: usize) -> Result<Option<Frame>, StoreError> {
    let Some(&tag) = buf.get(*pos) else {
        return Ok(None);
    };
    *pos += 1;

    let Some(line) = read_line(buf, pos) else {
        return Ok(None);
    };

    match tag {
        b'+' => Ok(Some(Frame::Simple(utf8(line)?))),
        b'-' => Ok(Some(Frame::Error(utf8(line)?))),
        b':' => Ok(Some(Frame::Integer(int(line)?))),
        b'$' => {
            let len = int(line)?;
            if len == -1 {
                return Ok(Some(Frame::Null));
            }
            if !(0..=MAX_BULK_LEN).contains(&len) {
                return Err(StoreError::Protocol(format!("invalid bulk length {len}")));
            }
            let start = *pos;
            let end = start + len as usize;
            let (Some(data), Some(term)) = (buf.get(start..end), buf.get(end..end + 2)) else {
                return Ok(None);
            };
            if term != b"\r\n" {
                return Err(StoreError::Protocol("bulk string not terminated by CRLF".into()));
            }
            *pos = end + 2;
            Ok(Some(Frame::Bulk(Bytes::copy_from_slice(data))))
        }
        b'*' => {
            let len = int(line)?;
            if len == -1 {
                return Ok(Some(Frame::Null));
            }
            if !(0..=MAX_ARRAY_LEN).contains(&len) {
                return Err(StoreError::Protocol(format!("invalid array length {len}")));
            }
            if depth >= MAX_DEPTH {
                return Err(StoreError::Protocol("arrays nested too deeply".into()));
            }
            let mut items = Vec::with_capacity((len as usize).min(64));
            for _ in 0..len {
                match parse(buf, pos, depth + 1)? {
                    Some(item) => items.push(item),
                    None => return Ok(None),
                }
            }
            Ok(Some(Frame::Array(items)))
        }
        other => Err(StoreError::Protocol(format!("unexpected type byte 0x{other:02x}"))),
    }
}

/// Line up to (not including) the next CRLF; advances past the CRLF.
fn read_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let rest = buf.get(*pos..)?;
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    let line = rest.get(..end)?;
    *pos += end + 2;
    Some(line)
}

fn utf8(line: &[u8]) -> Result<String, StoreError> {
    std::str::from_utf8(line)
        .map(str::to_owned)
        .map_err(|_| StoreError::Protocol("line is not valid utf-8".into()))
}

fn int(line: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            StoreError::Protocol(format!("invalid integer {:?}", String::from_utf8_lossy(line)))
        })
}
