//! Request encoding and reply decoding.

use super::reply::Reply;
use crate::error::{LockError, Result};
use std::io::{BufRead, ErrorKind, Read};

/// Largest bulk payload accepted from the coordinator (the server-side cap).
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Longest status, error, integer or length line accepted, CRLF included.
const MAX_LINE_LEN: usize = 64 * 1024;

/// Encode a command as an array of bulk strings.
pub fn encode<S: AsRef<str>>(args: &[S]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + args.iter().map(|a| a.as_ref().len() + 16).sum::<usize>());
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        let arg = arg.as_ref().as_bytes();
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg);
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Read exactly one reply from `reader`.
///
/// End of stream at any point is reported as [`LockError::Disconnect`];
/// malformed or unsupported frames as [`LockError::Protocol`].
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let line = read_line(reader)?;
    let (&tag, body) = line
        .split_first()
        .ok_or_else(|| LockError::Protocol("empty reply line".to_string()))?;

    match tag {
        b'+' => Ok(Reply::Status(utf8(body)?)),
        b'-' => Ok(Reply::Error(utf8(body)?)),
        b':' => Ok(Reply::Integer(parse_int(body)?)),
        b'$' => read_bulk(reader, parse_int(body)?),
        b'*' => Err(LockError::Protocol(
            "array replies are not supported".to_string(),
        )),
        other => Err(LockError::Protocol(format!(
            "unknown reply type byte 0x{:02x}",
            other
        ))),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> Result<Reply> {
    if len < 0 {
        return Ok(Reply::Bulk(None));
    }

    let len = usize::try_from(len)
        .ok()
        .filter(|&l| l <= MAX_BULK_LEN)
        .ok_or_else(|| LockError::Protocol(format!("bulk length {} too large", len)))?;

    // Payload plus trailing CRLF; the terminator is sent for empty strings too.
    let mut payload = vec![0u8; len + 2];
    reader.read_exact(&mut payload).map_err(io_to_error)?;

    if !payload.ends_with(b"\r\n") {
        return Err(LockError::Protocol(
            "bulk string not terminated by CRLF".to_string(),
        ));
    }
    payload.truncate(len);

    String::from_utf8(payload)
        .map(|s| Reply::Bulk(Some(s)))
        .map_err(|_| LockError::Protocol("bulk string is not valid UTF-8".to_string()))
}

/// Read one CRLF-terminated line, returning it without the terminator.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)
        .map_err(io_to_error)?;

    if n == 0 {
        return Err(LockError::Disconnect(
            "connection closed by coordinator".to_string(),
        ));
    }
    if !line.ends_with(b"\n") && line.len() >= MAX_LINE_LEN {
        return Err(LockError::Protocol(format!(
            "reply line longer than {} bytes",
            MAX_LINE_LEN
        )));
    }
    if !line.ends_with(b"\n") {
        return Err(LockError::Disconnect(
            "connection closed in the middle of a reply".to_string(),
        ));
    }
    if !line.ends_with(b"\r\n") {
        return Err(LockError::Protocol(
            "reply line not terminated by CRLF".to_string(),
        ));
    }

    line.truncate(line.len() - 2);
    Ok(line)
}

fn parse_int(body: &[u8]) -> Result<i64> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            LockError::Protocol(format!(
                "invalid integer '{}'",
                String::from_utf8_lossy(body)
            ))
        })
}

fn utf8(body: &[u8]) -> Result<String> {
    String::from_utf8(body.to_vec())
        .map_err(|_| LockError::Protocol("reply line is not valid UTF-8".to_string()))
}

fn io_to_error(e: std::io::Error) -> LockError {
    match e.kind() {
        ErrorKind::UnexpectedEof => {
            LockError::Disconnect("connection closed in the middle of a reply".to_string())
        }
        ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            LockError::Disconnect(format!("timed out waiting for reply: {}", e))
        }
        _ => LockError::Disconnect(e.to_string()),
    }
}
