//! Lazily pulled byte sequence over an async byte source.
//!
//! [`ChunkedBytes`] is the single-pass view the decoder consumes. Bytes are read
//! from the source only when a pull can't be satisfied from the buffer, and a
//! pull that has to wait suspends the calling task, never the thread.
//!
//! Two access patterns are offered:
//!
//! - [`next_chunk(n)`](ChunkedBytes::next_chunk): exactly `n` bytes
//! - [`next_line(sep)`](ChunkedBytes::next_line) / [`lines(sep)`](ChunkedBytes::lines):
//!   the bytes up to the next separator, separator stripped
//!
//! Consumed bytes can't be replayed. When the source ends while a pull is still
//! unsatisfied the pull fails with [`DecodeError::PrematureEndOfStream`]; nothing
//! is silently truncated.

use std::cmp;
use std::future::poll_fn;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes, BytesMut};
use futures::Stream;
use tokio::io::AsyncRead;
use tokio_util::io::poll_read_buf;
use tracing::trace;

use crate::protocol::DecodeError;

/// Minimum number of bytes reserved before each read from the source.
const READ_CAPACITY: usize = 8 * 1024;

/// A single-pass, pull-based byte sequence.
///
/// The buffer is exclusively owned by the sequence; it is dropped with it.
#[derive(Debug)]
pub struct ChunkedBytes<R> {
    source: R,
    buf: BytesMut,
    /// how much of `buf` was already searched for a separator
    scanned: usize,
    max_line: Option<usize>,
    eof: bool,
}

impl<R> ChunkedBytes<R> {
    pub fn new(source: R) -> Self {
        Self::with_buffered(source, BytesMut::new())
    }

    /// Creates a sequence that yields `buffered` before reading from `source`.
    pub fn with_buffered(source: R, buffered: BytesMut) -> Self {
        Self { source, buf: buffered, scanned: 0, max_line: None, eof: false }
    }

    /// Bounds the length of lines pulled from now on, separator excluded.
    ///
    /// A longer line fails with [`DecodeError::LineTooLong`] as soon as the limit is
    /// passed, without buffering the rest of it. `None` lifts the bound.
    pub fn set_max_line_length(&mut self, limit: Option<usize>) {
        self.max_line = limit;
    }

    pub fn max_line_length(&self) -> Option<usize> {
        self.max_line
    }

    /// Bytes read from the source but not consumed yet.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Returns true once the source reported end-of-stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Gives the source and the unconsumed bytes back.
    pub fn into_parts(self) -> (R, BytesMut) {
        (self.source, self.buf)
    }
}

impl<R> ChunkedBytes<R>
where
    R: AsyncRead + Unpin,
{
    /// Pulls exactly `count` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`DecodeError::PrematureEndOfStream`] if the source ends first.
    pub async fn next_chunk(&mut self, count: usize) -> Result<Bytes, DecodeError> {
        poll_fn(|cx| self.poll_chunk(cx, count)).await
    }

    /// Pulls the bytes up to the next `separator`, which is consumed but not returned.
    ///
    /// # Errors
    ///
    /// Fails with [`DecodeError::PrematureEndOfStream`] if the source ends before a
    /// separator shows up, including when it ends cleanly on a line boundary.
    pub async fn next_line(&mut self, separator: u8) -> Result<Bytes, DecodeError> {
        match poll_fn(|cx| self.poll_line(cx, separator)).await? {
            Some(line) => Ok(line),
            None => Err(DecodeError::premature_end(0)),
        }
    }

    /// Lazy stream of lines.
    ///
    /// The stream ends cleanly when the source ends right after a separator; a
    /// trailing partial line is reported as [`DecodeError::PrematureEndOfStream`].
    pub fn lines(&mut self, separator: u8) -> Lines<'_, R> {
        Lines { bytes: self, separator, done: false }
    }

    pub(crate) fn poll_chunk(&mut self, cx: &mut Context<'_>, count: usize) -> Poll<Result<Bytes, DecodeError>> {
        loop {
            if self.buf.len() >= count {
                self.scanned = 0;
                return Poll::Ready(Ok(self.buf.split_to(count).freeze()));
            }

            let missing = count - self.buf.len();
            if !ready!(self.poll_fill(cx, missing))? {
                return Poll::Ready(Err(DecodeError::premature_end(self.buf.len())));
            }
        }
    }

    /// `Ok(None)` means the source ended with nothing left in the buffer.
    pub(crate) fn poll_line(&mut self, cx: &mut Context<'_>, separator: u8) -> Poll<Result<Option<Bytes>, DecodeError>> {
        loop {
            if let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == separator) {
                let length = self.scanned + offset;
                self.check_line_length(length)?;
                let line = self.buf.split_to(length);
                self.buf.advance(1);
                self.scanned = 0;
                return Poll::Ready(Ok(Some(line.freeze())));
            }
            self.scanned = self.buf.len();
            self.check_line_length(self.scanned)?;

            if !ready!(self.poll_fill(cx, READ_CAPACITY))? {
                return if self.buf.is_empty() {
                    Poll::Ready(Ok(None))
                } else {
                    Poll::Ready(Err(DecodeError::premature_end(self.buf.len())))
                };
            }
        }
    }

    fn check_line_length(&self, length: usize) -> Result<(), DecodeError> {
        match self.max_line {
            Some(limit) if length > limit => {
                trace!(length, limit, "line exceeds limit");
                Err(DecodeError::line_too_long(limit))
            }
            _ => Ok(()),
        }
    }

    /// Reads once from the source; `Ok(false)` means end-of-stream.
    fn poll_fill(&mut self, cx: &mut Context<'_>, wanted: usize) -> Poll<Result<bool, DecodeError>> {
        if self.eof {
            return Poll::Ready(Ok(false));
        }

        self.buf.reserve(cmp::max(wanted, READ_CAPACITY));
        let n = ready!(poll_read_buf(Pin::new(&mut self.source), cx, &mut self.buf)).map_err(DecodeError::io)?;
        if n == 0 {
            trace!(buffered = self.buf.len(), "byte source reached end of stream");
            self.eof = true;
        }
        Poll::Ready(Ok(n > 0))
    }
}

/// Stream returned by [`ChunkedBytes::lines`].
#[derive(Debug)]
pub struct Lines<'a, R> {
    bytes: &'a mut ChunkedBytes<R>,
    separator: u8,
    done: bool,
}

impl<R> Stream for Lines<'_, R>
where
    R: AsyncRead + Unpin,
{
    type Item = Result<Bytes, DecodeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let item = match ready!(this.bytes.poll_line(cx, this.separator)) {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        };
        this.done = !matches!(item, Some(Ok(_)));
        Poll::Ready(item)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn chunks_are_exact() {
        let mut bytes = ChunkedBytes::new(&b"0123456789abcdef"[..]);

        assert_eq!(&bytes.next_chunk(4).await.unwrap()[..], b"0123");
        assert_eq!(&bytes.next_chunk(0).await.unwrap()[..], b"");
        assert_eq!(&bytes.next_chunk(10).await.unwrap()[..], b"456789abcd");

        let err = bytes.next_chunk(3).await.unwrap_err();
        assert!(matches!(err, DecodeError::PrematureEndOfStream { available: 2 }));
    }

    #[tokio::test]
    async fn lines_strip_the_separator() {
        let mut bytes = ChunkedBytes::new(&b"first\nsecond\n\nrest"[..]);

        assert_eq!(&bytes.next_line(b'\n').await.unwrap()[..], b"first");
        assert_eq!(&bytes.next_line(b'\n').await.unwrap()[..], b"second");
        assert_eq!(&bytes.next_line(b'\n').await.unwrap()[..], b"");
        // lines never read past what they return
        assert_eq!(&bytes.next_chunk(4).await.unwrap()[..], b"rest");
        assert!(bytes.next_line(b'\n').await.unwrap_err().is_premature_end());
    }

    #[tokio::test]
    async fn lines_stream_ends_on_boundary() {
        let mut bytes = ChunkedBytes::new(&b"a\nb\n"[..]);
        let lines: Vec<_> = bytes.lines(b'\n').map(|line| line.unwrap()).collect().await;
        assert_eq!(lines, vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);

        let mut bytes = ChunkedBytes::new(&b"a\npartial"[..]);
        let mut lines = bytes.lines(b'\n');
        assert_eq!(&lines.next().await.unwrap().unwrap()[..], b"a");
        assert!(lines.next().await.unwrap().unwrap_err().is_premature_end());
        assert!(lines.next().await.is_none());
    }

    #[tokio::test]
    async fn pulls_suspend_until_more_bytes_arrive() {
        let (reader, mut writer) = tokio::io::duplex(64);
        let mut bytes = ChunkedBytes::new(reader);

        let producer = tokio::spawn(async move {
            writer.write_all(b"Hel").await.unwrap();
            tokio::task::yield_now().await;
            writer.write_all(b"lo\nworld").await.unwrap();
        });

        assert_eq!(&bytes.next_line(b'\n').await.unwrap()[..], b"Hello");
        assert_eq!(&bytes.next_chunk(5).await.unwrap()[..], b"world");
        producer.await.unwrap();
        assert!(bytes.next_chunk(1).await.unwrap_err().is_premature_end());
    }

    #[tokio::test]
    async fn line_length_is_bounded() {
        let mut bytes = ChunkedBytes::new(&b"short\nway too long for the limit\n"[..]);
        bytes.set_max_line_length(Some(8));

        assert_eq!(&bytes.next_line(b'\n').await.unwrap()[..], b"short");
        let err = bytes.next_line(b'\n').await.unwrap_err();
        assert!(matches!(err, DecodeError::LineTooLong { limit: 8 }));
    }

    #[tokio::test]
    async fn endless_line_fails_without_separator() {
        let (reader, mut writer) = tokio::io::duplex(64);
        let mut bytes = ChunkedBytes::new(reader);
        bytes.set_max_line_length(Some(16));

        // the writer never sends a separator and never closes
        let producer = tokio::spawn(async move {
            let _ = writer.write_all(&[b'a'; 32]).await;
            writer
        });

        let err = bytes.next_line(b'\n').await.unwrap_err();
        assert!(matches!(err, DecodeError::LineTooLong { limit: 16 }));
        drop(producer.await.unwrap());
    }

    #[tokio::test]
    async fn buffered_bytes_come_first() {
        let mut bytes = ChunkedBytes::with_buffered(&b"tail"[..], BytesMut::from(&b"head-"[..]));
        assert_eq!(&bytes.next_chunk(9).await.unwrap()[..], b"head-tail");
        assert!(bytes.buffered().is_empty());
    }
}
