//! Decoded HTTP response.
//!
//! Unlike requests, a response body is always resolved into one block before
//! decoding completes, so [`Response::body`] never has to wait.

use bytes::Bytes;
use http::StatusCode;

use crate::protocol::Headers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub(crate) version: String,
    pub(crate) status: u32,
    pub(crate) reason: String,
    pub(crate) headers: Headers,
    pub(crate) body: Bytes,
}

impl Response {
    /// The version field of the status line, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The status code as sent; any positive integer.
    pub fn status(&self) -> u32 {
        self.status
    }

    /// The status as an [`http::StatusCode`], `None` outside `100..=999`.
    pub fn status_code(&self) -> Option<StatusCode> {
        u16::try_from(self.status).ok().and_then(|code| StatusCode::from_u16(code).ok())
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}
