//! Decoded HTTP message types.
//!
//! This module holds the values the decoder hands to the request-handling layer.
//! They are plain owned values: once decoding completes, the decoder keeps no
//! reference to them.
//!
//! # Components
//!
//! - **Requests** ([`request`]): [`Request`] with method, version, standardized
//!   path, ordered [`QueryItem`]s, headers and a [`Body`]
//! - **Responses** ([`response`]): [`Response`] with a materialized body
//! - **Headers** ([`header`]): [`Headers`], case-insensitive and last-write-wins,
//!   keyed by [`HeaderKey`]
//! - **Bodies** ([`body`]): [`Body`], either materialized or [`StreamedBody`]
//! - **Errors** ([`error`]): [`DecodeError`]

mod error;
pub use error::DecodeError;

mod header;
pub use header::HeaderKey;
pub use header::Headers;

mod query;
pub use query::QueryItem;
pub(crate) use query::split_target;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::Response;

pub mod body;
pub use body::Body;
pub use body::StreamedBody;
