//! RESP2 wire codec.
//!
//! Commands are encoded as arrays of bulk strings; replies are decoded
//! into [`Reply`] frames. The decoder works in two passes: first it scans
//! for a complete frame (returning `None` when the buffer is short),
//! then it materializes the frame and consumes the bytes. Error frames
//! become [`Reply::Error`] values so pipelined replies decode uniformly.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::TransportError;
use crate::reply::Reply;

/// Encode one command (argv of bulk strings) into `buf`.
///
/// Wire form: `*<n>\r\n` followed by `$<len>\r\n<data>\r\n` per argument.
pub fn encode_command(args: &[Bytes], buf: &mut BytesMut) {
    buf.put_u8(b'*');
    buf.put_slice(args.len().to_string().as_bytes());
    buf.put_slice(b"\r\n");
    for a in args {
        buf.put_u8(b'$');
        buf.put_slice(a.len().to_string().as_bytes());
        buf.put_slice(b"\r\n");
        buf.put_slice(a);
        buf.put_slice(b"\r\n");
    }
}

/// Try to decode one complete reply from the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed. On success the consumed
/// bytes are advanced past.
pub fn decode_reply(buf: &mut BytesMut) -> Result<Option<Reply>, TransportError> {
    let Some(end) = frame_end(buf, 0)? else {
        return Ok(None);
    };
    let (reply, consumed) = parse_frame(&buf[..end], 0)?;
    debug_assert_eq!(consumed, end);
    buf.advance(end);
    Ok(Some(reply))
}

/// Scan for the end offset of the frame starting at `pos`.
///
/// `Ok(None)` means the frame is not yet complete.
fn frame_end(buf: &[u8], pos: usize) -> Result<Option<usize>, TransportError> {
    let Some(&tag) = buf.get(pos) else {
        return Ok(None);
    };
    match tag {
        b'+' | b'-' | b':' => Ok(line_end(buf, pos + 1)),
        b'$' => {
            let Some((len, header_end)) = read_length(buf, pos + 1)? else {
                return Ok(None);
            };
            if len < 0 {
                return Ok(Some(header_end));
            }
            let total = header_end + len as usize + 2;
            Ok((buf.len() >= total).then_some(total))
        }
        b'*' => {
            let Some((count, mut at)) = read_length(buf, pos + 1)? else {
                return Ok(None);
            };
            if count < 0 {
                return Ok(Some(at));
            }
            for _ in 0..count {
                match frame_end(buf, at)? {
                    Some(next) => at = next,
                    None => return Ok(None),
                }
            }
            Ok(Some(at))
        }
        other => Err(TransportError::Protocol(format!(
            "unexpected frame tag 0x{:02x}",
            other
        ))),
    }
}

/// Parse the complete frame starting at `pos`; returns (frame, end offset).
fn parse_frame(buf: &[u8], pos: usize) -> Result<(Reply, usize), TransportError> {
    let tag = buf[pos];
    match tag {
        b'+' => {
            let (text, end) = take_line(buf, pos + 1)?;
            Ok((Reply::Simple(text), end))
        }
        b'-' => {
            let (text, end) = take_line(buf, pos + 1)?;
            Ok((Reply::Error(text), end))
        }
        b':' => {
            let (text, end) = take_line(buf, pos + 1)?;
            let n = text
                .parse::<i64>()
                .map_err(|_| TransportError::Protocol(format!("invalid integer: {}", text)))?;
            Ok((Reply::Integer(n), end))
        }
        b'$' => {
            let (len, header_end) = read_length(buf, pos + 1)?
                .expect("frame_end verified completeness");
            if len < 0 {
                return Ok((Reply::Nil, header_end));
            }
            let data_end = header_end + len as usize;
            let data = Bytes::copy_from_slice(&buf[header_end..data_end]);
            Ok((Reply::Bulk(data), data_end + 2))
        }
        b'*' => {
            let (count, mut at) = read_length(buf, pos + 1)?
                .expect("frame_end verified completeness");
            if count < 0 {
                return Ok((Reply::Nil, at));
            }
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (item, next) = parse_frame(buf, at)?;
                items.push(item);
                at = next;
            }
            Ok((Reply::Array(items), at))
        }
        other => Err(TransportError::Protocol(format!(
            "unexpected frame tag 0x{:02x}",
            other
        ))),
    }
}

/// Offset just past the CRLF terminating the line starting at `pos`.
fn line_end(buf: &[u8], pos: usize) -> Option<usize> {
    buf[pos..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| pos + i + 2)
}

/// Read the text of a CRLF-terminated line starting at `pos`.
fn take_line(buf: &[u8], pos: usize) -> Result<(String, usize), TransportError> {
    let end = line_end(buf, pos)
        .ok_or_else(|| TransportError::Protocol("unterminated line".into()))?;
    let text = std::str::from_utf8(&buf[pos..end - 2])
        .map_err(|e| TransportError::Protocol(format!("invalid UTF-8: {}", e)))?;
    Ok((text.to_string(), end))
}

/// Read a `<decimal>\r\n` length header starting at `pos`.
///
/// `Ok(None)` when the line is not yet terminated. Lengths below -1 are
/// malformed.
fn read_length(buf: &[u8], pos: usize) -> Result<Option<(i64, usize)>, TransportError> {
    let Some(end) = line_end(buf, pos) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&buf[pos..end - 2])
        .map_err(|_| TransportError::Protocol("invalid UTF-8 in length".into()))?;
    let len = text
        .parse::<i64>()
        .map_err(|_| TransportError::Protocol(format!("invalid length: {}", text)))?;
    if len < -1 {
        return Err(TransportError::Protocol(format!("negative length: {}", len)));
    }
    Ok(Some((len, end)))
}
