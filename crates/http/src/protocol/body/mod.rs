//! Decoded message bodies.
//!
//! A body is materialized adaptively, depending on the declared `Content-Length`:
//!
//! - [`Body::Full`]: the whole body, pulled eagerly when it is at most the
//!   materialization threshold (10 MiB by default)
//! - [`Body::Streamed`]: a [`StreamedBody`] that pulls fixed-size chunks from the
//!   remaining byte sequence on demand, never holding the whole body at once
//!
//! Both variants implement `http_body::Body`, so `http_body_util::BodyExt` works on
//! either of them.

mod streamed;

pub use streamed::StreamedBody;

use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Frame, SizeHint};
use http_body_util::BodyExt;
use tokio::io::AsyncRead;

use crate::protocol::DecodeError;

/// Body of a decoded message.
#[derive(Debug)]
pub enum Body<R> {
    /// Fully materialized bytes.
    Full(Bytes),
    /// Lazily pulled chunks with a known total length.
    Streamed(StreamedBody<R>),
}

impl<R> Body<R> {
    pub fn empty() -> Self {
        Body::Full(Bytes::new())
    }

    /// Returns the materialized bytes, or `None` for a streamed body.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Full(bytes) => Some(bytes),
            Body::Streamed(_) => None,
        }
    }

    #[inline]
    pub fn is_streamed(&self) -> bool {
        matches!(self, Body::Streamed(_))
    }

    /// Number of body bytes not handed out yet.
    pub fn remaining(&self) -> u64 {
        match self {
            Body::Full(bytes) => bytes.len() as u64,
            Body::Streamed(streamed) => streamed.remaining(),
        }
    }
}

impl<R> Body<R>
where
    R: AsyncRead + Unpin,
{
    /// Resolves the body into one contiguous block.
    ///
    /// # Errors
    ///
    /// Fails if a streamed body can't be pulled to its declared length.
    pub async fn into_bytes(self) -> Result<Bytes, DecodeError> {
        match self {
            Body::Full(bytes) => Ok(bytes),
            streamed @ Body::Streamed(_) => Ok(streamed.collect().await?.to_bytes()),
        }
    }
}

impl<R> http_body::Body for Body<R>
where
    R: AsyncRead + Unpin,
{
    type Data = Bytes;
    type Error = DecodeError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Body::Full(bytes) if bytes.is_empty() => Poll::Ready(None),
            Body::Full(bytes) => Poll::Ready(Some(Ok(Frame::data(mem::take(bytes))))),
            Body::Streamed(streamed) => streamed.poll_next_chunk(cx).map(|chunk| chunk.map(|r| r.map(Frame::data))),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining() == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use http_body::Body as _;

    use super::*;
    use crate::codec::ChunkedBytes;

    #[tokio::test]
    async fn full_body_yields_one_frame() {
        let mut body: Body<&[u8]> = Body::Full(Bytes::from_static(b"Hello"));
        assert_eq!(body.size_hint().exact(), Some(5));

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"Hello"));
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn empty_body() {
        let body: Body<&[u8]> = Body::empty();
        assert!(body.is_end_stream());
        assert_eq!(body.collect().await.unwrap().to_bytes(), Bytes::new());
    }

    #[tokio::test]
    async fn streamed_body_yields_bounded_frames() {
        let source = &b"0123456789tail"[..];
        let mut body = Body::Streamed(StreamedBody::new(ChunkedBytes::new(source), 10, 4));
        assert!(body.is_streamed());
        assert_eq!(body.size_hint().exact(), Some(10));

        let mut frames = Vec::new();
        while let Some(frame) = body.frame().await {
            frames.push(frame.unwrap().into_data().unwrap());
        }

        assert_eq!(frames, vec![Bytes::from_static(b"0123"), Bytes::from_static(b"4567"), Bytes::from_static(b"89")]);
        assert!(body.is_end_stream());
    }
}
