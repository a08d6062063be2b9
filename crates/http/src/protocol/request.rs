//! Decoded HTTP request.

use http::Method;

use crate::protocol::{Headers, QueryItem};

/// A decoded request, handed to the caller by value.
///
/// `path` is the percent-decoded, standardized path of the request target and
/// `query` keeps the query items in the order they appeared.
#[derive(Debug)]
pub struct Request<B> {
    method: Method,
    version: String,
    path: String,
    query: Vec<QueryItem>,
    headers: Headers,
    body: B,
}

/// Everything but the body of a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Method,
    pub version: String,
    pub path: String,
    pub query: Vec<QueryItem>,
    pub headers: Headers,
}

impl<B> Request<B> {
    pub fn from_parts(head: RequestHead, body: B) -> Self {
        let RequestHead { method, version, path, query, headers } = head;
        Self { method, version, path, query, headers, body }
    }

    pub fn into_parts(self) -> (RequestHead, B) {
        let Self { method, version, path, query, headers, body } = self;
        (RequestHead { method, version, path, query, headers }, body)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The version field of the request line, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[QueryItem] {
        &self.query
    }

    /// Value of the first query item called `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|item| item.name == name).map(|item| item.value.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    /// Replaces the body, keeping everything else.
    pub fn map<T, F: FnOnce(B) -> T>(self, f: F) -> Request<T> {
        let (head, body) = self.into_parts();
        Request::from_parts(head, f(body))
    }
}
