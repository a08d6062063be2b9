//! Request target decomposition.
//!
//! A request target is split into a standardized, percent-decoded path and the
//! ordered list of query items, following URL component parsing:
//!
//! - absolute-form targets (`http://host/a?b=c`) go through [`url::Url`]
//! - origin-form targets (`/a/../b?c=d`) have their dot segments resolved
//! - targets without a path (`*`, `?x=1`, `http://host`, empty) never fail, an absent path is `""`
//!
//! Query items are form-decoded in order; an item without `=` has an empty value.

use percent_encoding::percent_decode_str;
use url::Url;

/// One `name=value` pair of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
    pub name: String,
    pub value: String,
}

impl QueryItem {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Splits a request target into its path and query items.
pub(crate) fn split_target(target: &str) -> (String, Vec<QueryItem>) {
    if let Ok(url) = Url::parse(target) {
        let path = if spells_out_path(target) { decode_path(url.path()) } else { String::new() };
        return (path, query_items(url.query().unwrap_or_default()));
    }

    let target = target.split_once('#').map_or(target, |(before, _)| before);
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    (decode_path(&standardize(path)), query_items(query))
}

/// Whether an absolute-form target has a path after its authority.
///
/// `Url` reports `/` for `http://host`, which must stay an empty path.
fn spells_out_path(target: &str) -> bool {
    let Some((_, rest)) = target.split_once("://") else {
        // no authority, everything after the scheme is path
        return true;
    };
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[authority_end..].starts_with('/')
}

/// Resolves `.` and `..` segments of an origin-form path.
fn standardize(path: &str) -> String {
    // `//x` would be read as an authority by the url parser
    if !path.starts_with('/') || path.starts_with("//") {
        return path.to_string();
    }

    Url::parse("http://localhost")
        .and_then(|base| base.join(path))
        .map_or_else(|_| path.to_string(), |url| url.path().to_string())
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

fn query_items(query: &str) -> Vec<QueryItem> {
    url::form_urlencoded::parse(query.as_bytes()).map(|(name, value)| QueryItem::new(name, value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form() {
        let (path, query) = split_target("/search?q=swift");
        assert_eq!(path, "/search");
        assert_eq!(query, vec![QueryItem::new("q", "swift")]);
    }

    #[test]
    fn query_items_keep_their_order() {
        let (path, query) = split_target("/index/?a=1&b=2&a=3&flag");
        assert_eq!(path, "/index/");
        assert_eq!(
            query,
            vec![QueryItem::new("a", "1"), QueryItem::new("b", "2"), QueryItem::new("a", "3"), QueryItem::new("flag", "")]
        );
    }

    #[test]
    fn path_is_decoded_and_standardized() {
        let (path, query) = split_target("/docs/./drafts/../hello%20world.txt#top");
        assert_eq!(path, "/docs/hello world.txt");
        assert!(query.is_empty());

        let (_, query) = split_target("/?name=J%C3%BCrgen+M&x=%26");
        assert_eq!(query, vec![QueryItem::new("name", "Jürgen M"), QueryItem::new("x", "&")]);
    }

    #[test]
    fn absolute_form() {
        let (path, query) = split_target("http://example.com:8080/a/b?c=d");
        assert_eq!(path, "/a/b");
        assert_eq!(query, vec![QueryItem::new("c", "d")]);
    }

    #[test]
    fn targets_without_path() {
        assert_eq!(split_target(""), (String::new(), vec![]));
        assert_eq!(split_target("?x=1"), (String::new(), vec![QueryItem::new("x", "1")]));
        assert_eq!(split_target("*"), ("*".to_string(), vec![]));
        assert_eq!(split_target("http://example.com"), (String::new(), vec![]));
        assert_eq!(split_target("http://example.com?x=1"), (String::new(), vec![QueryItem::new("x", "1")]));
        assert_eq!(split_target("http://example.com:8080#frag"), (String::new(), vec![]));
    }

    #[test]
    fn absolute_form_root_path_is_kept() {
        assert_eq!(split_target("http://example.com/"), ("/".to_string(), vec![]));
        assert_eq!(split_target("http://example.com/?x=1").0, "/");
    }
}
