use std::cmp;
use std::fmt;
use std::future::poll_fn;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::codec::ChunkedBytes;
use crate::protocol::DecodeError;

/// A body too large to materialize, pulled chunk by chunk from the byte sequence
/// that followed the headers.
///
/// Every chunk holds at most `chunk_size` bytes and the chunks add up to exactly
/// the declared length: nothing past the body is ever pulled.
pub struct StreamedBody<R> {
    bytes: ChunkedBytes<R>,
    length: u64,
    remaining: u64,
    chunk_size: usize,
}

impl<R> StreamedBody<R> {
    pub(crate) fn new(bytes: ChunkedBytes<R>, length: u64, chunk_size: usize) -> Self {
        Self { bytes, length, remaining: length, chunk_size: chunk_size.max(1) }
    }

    /// The declared body length.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes still to be pulled.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<R> StreamedBody<R>
where
    R: AsyncRead + Unpin,
{
    /// Pulls the next chunk, `None` once the declared length was handed out.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, DecodeError>> {
        poll_fn(|cx| self.poll_next_chunk(cx)).await
    }

    pub(crate) fn poll_next_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Bytes, DecodeError>>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }

        // bounded by `chunk_size`, so the cast back can't truncate
        let count = cmp::min(self.remaining, self.chunk_size as u64) as usize;
        match ready!(self.bytes.poll_chunk(cx, count)) {
            Ok(chunk) => {
                self.remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Err(e) => {
                debug!(declared = self.length, remaining = self.remaining, cause = %e, "streamed body ended early");
                // the sequence is unusable after a failed pull
                self.remaining = 0;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

impl<R> fmt::Debug for StreamedBody<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamedBody")
            .field("length", &self.length)
            .field("remaining", &self.remaining)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}
