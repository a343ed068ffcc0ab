//! Newline-delimited UTF-8 line framing.
//!
//! A frame is everything up to and including `\n`; the terminator (and a
//! preceding `\r`) is stripped on read and appended on write. Frames are
//! capped in length so a peer that never sends `\n` cannot grow the buffer
//! without bound.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::DEFAULT_MAX_LINE_BYTES;
use crate::net::error::NetError;

/// Buffered reader yielding one line per call.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    max_line: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, DEFAULT_MAX_LINE_BYTES)
    }

    /// Reader rejecting frames longer than `max_line` bytes.
    pub fn with_limit(reader: R, max_line: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
            max_line,
        }
    }

    pub fn max_line(&self) -> usize {
        self.max_line
    }

    /// Read the next line.
    ///
    /// Returns `Ok(None)` once the peer has closed its write side (a read
    /// of zero bytes). Invalid UTF-8 and frames over the limit surface as
    /// `InvalidData` errors.
    pub async fn read_line(&mut self) -> Result<Option<String>, NetError> {
        self.buf.clear();
        let cap = self.max_line as u64 + 1;
        let n = AsyncReadExt::take(&mut self.inner, cap)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        if n > self.max_line {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", self.max_line),
            )
            .into());
        }
        let line = std::str::from_utf8(&self.buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(strip_terminator(line).to_string()))
    }

    /// Give back the unbuffered reader. Buffered bytes are discarded.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

/// Write `line` followed by `\n`.
pub async fn write_line<W>(writer: &mut W, line: &str) -> Result<(), NetError>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = Vec::with_capacity(line.len() + 1);
    frame.extend_from_slice(line.as_bytes());
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_on_newlines() {
        let mut reader = LineReader::new(&b"first\r\nsecond\nlast"[..]);
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("second"));
        // trailing bytes without a terminator still form a line
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_input_is_eof() {
        let mut reader = LineReader::new(&b""[..]);
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_error() {
        let mut reader = LineReader::new(&[0xff, 0xfe, b'\n'][..]);
        let err = reader.read_line().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn line_at_limit_is_accepted() {
        let mut reader = LineReader::with_limit(&b"abcd\nnext\n"[..], 5);
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("abcd"));
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn overlong_line_is_an_error() {
        let input = vec![b'a'; 1024];
        let mut reader = LineReader::with_limit(&input[..], 16);
        let err = reader.read_line().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn default_limit_applies() {
        let mut input = vec![b'a'; DEFAULT_MAX_LINE_BYTES + 10];
        input.push(b'\n');
        let mut reader = LineReader::new(&input[..]);
        assert_eq!(reader.max_line(), DEFAULT_MAX_LINE_BYTES);
        assert!(reader.read_line().await.is_err());
    }

    #[tokio::test]
    async fn write_appends_terminator() {
        let mut out = Vec::new();
        write_line(&mut out, "hello").await.unwrap();
        assert_eq!(out, b"hello\n");
    }
}
