//! Lazy, pull-based HTTP/1.x message decoding.
//!
//! This crate decodes HTTP requests and responses from a byte source that is
//! pulled only as far as the decoder needs. Waiting for bytes suspends the
//! decoding task, never its thread.
//!
//! # Example
//!
//! ```
//! use micro_http::codec::{ChunkedBytes, HttpDecoder};
//! use micro_http::protocol::Body;
//!
//! # futures::executor::block_on(async {
//! let raw = b"POST /upload HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nHello";
//! let request = HttpDecoder::new().decode_request(ChunkedBytes::new(&raw[..])).await.unwrap();
//!
//! assert_eq!(request.method(), http::Method::POST);
//! assert_eq!(request.headers().get("HOST"), Some("x"));
//!
//! let body: Body<_> = request.into_body();
//! assert_eq!(&body.into_bytes().await.unwrap()[..], b"Hello");
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the chunked byte sequence and the decoder state machine
//! - [`protocol`]: decoded requests, responses, headers, bodies and errors
//! - [`connection`]: non-blocking sockets driven by a `micro_poll::SocketPool`
//!
//! # Bodies
//!
//! A `Content-Length` body up to the materialization threshold (10 MiB unless
//! configured) is pulled eagerly. Larger request bodies come back as a
//! [`protocol::StreamedBody`] yielding fixed-size chunks on demand. Both kinds
//! implement `http_body::Body`.
//!
//! # Limitations
//!
//! - `Content-Length` framing only; `Transfer-Encoding: chunked` isn't decoded
//! - no encoding of messages

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
