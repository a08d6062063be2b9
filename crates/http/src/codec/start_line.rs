//! Start line parsing.
//!
//! The first line of a message is split on the space character with at most two
//! splits, so the last field may itself contain spaces (a reason phrase usually
//! does). Exactly three fields are required.

use http::Method;

use crate::ensure;
use crate::protocol::{DecodeError, QueryItem};

/// First line of a message, as understood by one message kind.
pub(crate) trait StartLine: Sized {
    fn parse(line: &str) -> Result<Self, DecodeError>;
}

/// `<method> <target> <version>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestLine {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<QueryItem>,
    pub(crate) version: String,
}

/// `<version> <status> <reason>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusLine {
    pub(crate) version: String,
    pub(crate) status: u32,
    pub(crate) reason: String,
}

fn split(line: &str) -> Result<[&str; 3], DecodeError> {
    let mut fields = line.splitn(3, ' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(first), Some(second), Some(third)) => Ok([first, second, third]),
        _ => Err(DecodeError::malformed_start_line(line)),
    }
}

impl StartLine for RequestLine {
    fn parse(line: &str) -> Result<Self, DecodeError> {
        let [method, target, version] = split(line)?;

        let method = Method::from_bytes(method.as_bytes()).map_err(|_invalid| DecodeError::invalid_method(method))?;
        let (path, query) = crate::protocol::split_target(target);

        Ok(Self { method, path, query, version: version.trim().to_string() })
    }
}

impl StartLine for StatusLine {
    fn parse(line: &str) -> Result<Self, DecodeError> {
        let [version, status, reason] = split(line)?;

        let code = status.parse::<u32>().map_err(|_parse| DecodeError::invalid_status_code(status))?;
        ensure!(code > 0, DecodeError::invalid_status_code(status));

        Ok(Self { version: version.to_string(), status: code, reason: reason.trim().to_string() })
    }
}
