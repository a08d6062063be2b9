//! Decoding of HTTP/1.x messages from a lazily pulled byte sequence.
//!
//! # Architecture
//!
//! - [`ChunkedBytes`]: single-pass byte sequence over any `AsyncRead` source,
//!   offering exact-size chunks and separator-delimited lines
//! - [`HttpDecoder`]: the `ReadStartLine -> ReadHeaders -> ReadBody` state machine
//!   producing a [`Request`](crate::protocol::Request) or
//!   [`Response`](crate::protocol::Response)
//! - [`DecoderConfig`]: body materialization threshold and streamed chunk size
//!
//! Start line and header parsing live in private submodules; both are driven by
//! the decoder only.

mod chunked_bytes;
mod config;
mod decoder;
mod header_decoder;
mod start_line;

pub use chunked_bytes::ChunkedBytes;
pub use chunked_bytes::Lines;
pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_MATERIALIZE_THRESHOLD, DecoderConfig};
pub use decoder::HttpDecoder;
