//! Case-insensitive header collection.
//!
//! Header names are normalized to lower case when they enter a [`Headers`] map, so
//! `Content-Type` and `content-type` address the same entry. Inserting a name that
//! is already present replaces the previous value: the last occurrence of a
//! header in a message wins.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

/// A header name normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderKey(String);

impl HeaderKey {
    /// Trims surrounding whitespace and lower-cases `name`.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HeaderKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for HeaderKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All headers of one message, keyed by [`HeaderKey`], last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: HashMap<HeaderKey, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, returning the value it replaced.
    ///
    /// Surrounding whitespace is trimmed from both name and value.
    pub fn insert(&mut self, name: &str, value: &str) -> Option<String> {
        self.map.insert(HeaderKey::new(name), value.trim().to_string())
    }

    /// Looks a header up, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(HeaderKey::new(name).as_str()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(HeaderKey::new(name).as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, HeaderKey, String> {
        self.map.iter()
    }

    /// Parses the `Content-Length` header, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length").and_then(|value| value.parse::<u64>().ok())
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a HeaderKey, &'a String);
    type IntoIter = hash_map::Iter<'a, HeaderKey, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
