//! URL decomposition.
//!
//! Splits a request URL into origin, pathname, query parameters and hash
//! so that mocks can be keyed and looked up by any of those shapes.

use std::collections::HashMap;

/// Query parameters parsed from a URL. A hash fragment is stored under `hash`.
pub type QueryParams = HashMap<String, String>;

/// Key under which the hash fragment is stored in [`QueryParams`].
pub const HASH_KEY: &str = "hash";

/// A URL split into its comparable parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Origin + pathname + raw query/hash suffix, trailing slashes stripped
    pub full_url: String,
    /// Scheme and authority (or the leading segment of a schemeless URL)
    pub origin: String,
    /// Path without query or hash, trailing slashes stripped (a relative
    /// root stays `/`)
    pub pathname: String,
    /// Decoded query parameters plus the `hash` entry
    pub query_params: QueryParams,
    /// Raw `?query#hash` suffix as it appeared in the input
    pub query_string: String,
}

impl UrlParts {
    /// Parse a URL. Never fails; unrecognizable input ends up as the pathname.
    pub fn parse(url: &str) -> Self {
        let (before_hash, hash) = match url.split_once('#') {
            Some((head, hash)) => (head, Some(hash)),
            None => (url, None),
        };
        let (before_query, query) = match before_hash.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (before_hash, None),
        };

        let path_start = path_start(before_query);
        let origin = before_query[..path_start].trim_end_matches('/');
        let raw_path = &before_query[path_start..];
        let mut pathname = raw_path.trim_end_matches('/');
        // A relative root path keeps its slash so it stays a usable key
        if pathname.is_empty() && origin.is_empty() && !raw_path.is_empty() {
            pathname = "/";
        }
        let query_string = &url[before_query.len()..];

        let mut query_params = parse_query_string(query.unwrap_or(""));
        if let Some(hash) = hash.filter(|h| !h.is_empty()) {
            query_params.insert(HASH_KEY.to_string(), decode(hash));
        }

        let full_url = format!("{}{}{}", origin, pathname, query_string)
            .trim_end_matches('/')
            .to_string();

        Self {
            full_url,
            origin: origin.to_string(),
            pathname: pathname.to_string(),
            query_params,
            query_string: query_string.to_string(),
        }
    }

    /// Origin and pathname without any query or hash.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.origin, self.pathname)
    }

    /// Registry key for entries that ignore query parameters.
    ///
    /// Falls back to the base URL when the pathname is empty so that a bare
    /// origin never collapses into the empty key.
    pub fn pathname_key(&self) -> String {
        if self.pathname.is_empty() {
            self.base_url()
        } else {
            self.pathname.clone()
        }
    }

    /// Whether the request carries query parameters or a hash fragment.
    pub fn has_query(&self) -> bool {
        !self.query_params.is_empty()
    }

    /// Whether the URL has no origin component.
    pub fn is_relative(&self) -> bool {
        self.origin.is_empty()
    }
}

/// Byte offset where the pathname begins.
fn path_start(url: &str) -> usize {
    if let Some(scheme_end) = url.find("://") {
        let authority = scheme_end + 3;
        return url[authority..]
            .find('/')
            .map(|i| authority + i)
            .unwrap_or(url.len());
    }
    if let Some(rest) = url.strip_prefix("//") {
        return rest.find('/').map(|i| i + 2).unwrap_or(url.len());
    }
    // Schemeless: an origin exists only when a slash follows it
    url.find('/').unwrap_or(0)
}

/// Parse a query string into key-value pairs.
fn parse_query_string(query: &str) -> QueryParams {
    let mut params = HashMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            params.insert(decode(key), decode(value));
        } else {
            params.insert(decode(part), String::new());
        }
    }

    params
}

/// Percent-decode, keeping the raw text if it does not decode to UTF-8.
fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
