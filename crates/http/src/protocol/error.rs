use std::io;
use thiserror::Error;

/// Errors that abort one decode.
///
/// A decode failure never affects other connections or the socket pool: every
/// decode owns its own buffer and state machine.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed start line: {line:?}")]
    MalformedStartLine { line: String },

    #[error("invalid status code: {status:?}")]
    InvalidStatusCode { status: String },

    #[error("invalid http method: {method:?}")]
    InvalidMethod { method: String },

    #[error("line exceeds the limit of {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("premature end of stream, {available} bytes left while a read was still pending")]
    PrematureEndOfStream { available: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl DecodeError {
    pub fn malformed_start_line<S: ToString>(line: S) -> Self {
        Self::MalformedStartLine { line: line.to_string() }
    }

    pub fn invalid_status_code<S: ToString>(status: S) -> Self {
        Self::InvalidStatusCode { status: status.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn line_too_long(limit: usize) -> Self {
        Self::LineTooLong { limit }
    }

    pub fn premature_end(available: usize) -> Self {
        Self::PrematureEndOfStream { available }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the byte source ended before the message was complete.
    #[inline]
    pub fn is_premature_end(&self) -> bool {
        matches!(self, DecodeError::PrematureEndOfStream { .. })
    }
}
