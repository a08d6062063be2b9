//! HTTP message decoder.
//!
//! [`HttpDecoder`] turns a [`ChunkedBytes`] sequence into one decoded message by
//! walking an explicit state machine:
//!
//! ```text
//! ReadStartLine -> ReadHeaders -> ReadBody -> Done
//!        \              \             \
//!         +--------------+-------------+----> Failed
//! ```
//!
//! Decoding is strictly sequential: each state finishes its pulls before the next
//! one starts, and both terminal states pull nothing more. The only suspension
//! points are pulls on the byte sequence that can't be served from its buffer.
//!
//! # Bodies
//!
//! The body length comes from `Content-Length`. A missing or non-numeric value
//! means an empty body. Bodies up to [`DecoderConfig::materialize_threshold`] are
//! pulled eagerly; larger request bodies are handed back as a [`StreamedBody`]
//! that owns the rest of the byte sequence. Response bodies are always resolved
//! into one block before [`HttpDecoder::decode_response`] returns.
//!
//! # Example
//!
//! ```
//! use micro_http::codec::{ChunkedBytes, HttpDecoder};
//!
//! # futures::executor::block_on(async {
//! let raw = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = HttpDecoder::new().decode_request(ChunkedBytes::new(&raw[..])).await.unwrap();
//!
//! assert_eq!(request.path(), "/search");
//! assert_eq!(request.query_value("q"), Some("rust"));
//! assert_eq!(request.headers().get("host"), Some("example.com"));
//! # });
//! ```

use tokio::io::AsyncRead;
use tracing::{debug, trace};

use crate::codec::ChunkedBytes;
use crate::codec::config::DecoderConfig;
use crate::codec::header_decoder::{HeaderDecoder, next_text_line};
use crate::codec::start_line::{RequestLine, StartLine, StatusLine};
use crate::protocol::{Body, DecodeError, Headers, Request, RequestHead, Response, StreamedBody};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DecodeState {
    ReadStartLine,
    ReadHeaders,
    ReadBody,
    Done,
    Failed,
}

/// Tracks the state of one decode and reports its transitions.
#[derive(Debug)]
struct Progress {
    kind: &'static str,
    state: DecodeState,
}

impl Progress {
    fn new(kind: &'static str) -> Self {
        trace!(kind, state = ?DecodeState::ReadStartLine, "decode started");
        Self { kind, state: DecodeState::ReadStartLine }
    }

    fn enter(&mut self, next: DecodeState) {
        trace!(kind = self.kind, from = ?self.state, to = ?next, "decode state transition");
        self.state = next;
    }

    fn finish<T>(mut self, result: Result<T, DecodeError>) -> Result<T, DecodeError> {
        match result {
            Ok(message) => {
                self.enter(DecodeState::Done);
                Ok(message)
            }
            Err(e) => {
                debug!(kind = self.kind, state = ?self.state, cause = %e, "decode failed");
                self.enter(DecodeState::Failed);
                Err(e)
            }
        }
    }
}

/// Decodes requests and responses from a byte sequence.
///
/// The decoder holds configuration only; every call owns its own state, so one
/// decoder can serve any number of concurrent decodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDecoder {
    config: DecoderConfig,
    header_decoder: HeaderDecoder,
}

impl HttpDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config, header_decoder: HeaderDecoder }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes one request.
    ///
    /// A body above the materialization threshold takes ownership of `bytes` and
    /// is pulled by the caller.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MalformedStartLine`] if the request line has fewer than three fields
    /// - [`DecodeError::InvalidMethod`] if the method isn't a valid token
    /// - [`DecodeError::PrematureEndOfStream`] if `bytes` ends before the head, or a
    ///   materialized body, is complete
    /// - [`DecodeError::Io`] if the byte source fails
    pub async fn decode_request<R>(&self, bytes: ChunkedBytes<R>) -> Result<Request<Body<R>>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut progress = Progress::new("request");
        let result = self.request(bytes, &mut progress).await;
        progress.finish(result)
    }

    /// Decodes one response, resolving its body into a single block.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MalformedStartLine`] if the status line has fewer than three fields
    /// - [`DecodeError::InvalidStatusCode`] if the status isn't a positive integer
    /// - [`DecodeError::PrematureEndOfStream`] if `bytes` ends before the message is complete
    /// - [`DecodeError::Io`] if the byte source fails
    pub async fn decode_response<R>(&self, bytes: ChunkedBytes<R>) -> Result<Response, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut progress = Progress::new("response");
        let result = self.response(bytes, &mut progress).await;
        progress.finish(result)
    }

    async fn request<R>(&self, mut bytes: ChunkedBytes<R>, progress: &mut Progress) -> Result<Request<Body<R>>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let (line, headers) = self.decode_head::<RequestLine, R>(&mut bytes, progress).await?;
        let body = self.decode_body(bytes, &headers).await?;

        let RequestLine { method, path, query, version } = line;
        Ok(Request::from_parts(RequestHead { method, version, path, query, headers }, body))
    }

    async fn response<R>(&self, mut bytes: ChunkedBytes<R>, progress: &mut Progress) -> Result<Response, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let (line, headers) = self.decode_head::<StatusLine, R>(&mut bytes, progress).await?;
        let body = self.decode_body(bytes, &headers).await?.into_bytes().await?;

        let StatusLine { version, status, reason } = line;
        Ok(Response { version, status, reason, headers, body })
    }

    async fn decode_head<S, R>(&self, bytes: &mut ChunkedBytes<R>, progress: &mut Progress) -> Result<(S, Headers), DecodeError>
    where
        S: StartLine,
        R: AsyncRead + Unpin,
    {
        if let Some(limit) = self.config.max_line_length() {
            bytes.set_max_line_length(Some(limit));
        }
        let line = S::parse(&next_text_line(bytes).await?)?;
        progress.enter(DecodeState::ReadHeaders);

        let headers = self.header_decoder.decode(bytes).await?;
        progress.enter(DecodeState::ReadBody);

        Ok((line, headers))
    }

    async fn decode_body<R>(&self, mut bytes: ChunkedBytes<R>, headers: &Headers) -> Result<Body<R>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let Some(length) = headers.content_length().filter(|length| *length > 0) else {
            return Ok(Body::empty());
        };

        if length <= self.config.materialize_threshold()
            && let Ok(count) = usize::try_from(length)
        {
            trace!(length, "materializing body");
            return Ok(Body::Full(bytes.next_chunk(count).await?));
        }

        trace!(length, chunk_size = self.config.chunk_size(), "streaming body");
        Ok(Body::Streamed(StreamedBody::new(bytes, length, self.config.chunk_size())))
    }
}
