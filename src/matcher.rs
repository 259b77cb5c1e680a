//! Request matching logic.
//!
//! Decides which registry key, if any, governs an outgoing request URL.

use crate::url::UrlParts;
use serde::Serialize;

/// How a request URL was matched to a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The full normalized URL is registered
    Exact,
    /// Only the pathname is registered
    Pathname,
    /// Origin + pathname is registered
    BaseUrl,
    /// Matched after rebasing against the page origin
    PageOrigin,
}

/// Result of matching a request URL against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Registry key that governs the request
    pub key: String,
    /// Which lookup step produced the key
    pub kind: MatchKind,
}

/// Match resolver.
///
/// Candidate keys are tried in order: full URL, pathname, origin + pathname,
/// then the same lookups rebased against the page origin. Query-stripped
/// candidates only count when the request has no query/hash or the entry
/// opted into pathname matching.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    page_origin: Option<String>,
}

impl Matcher {
    /// Create a matcher. `page_origin` enables lookups that rebase relative
    /// URLs onto the host page's origin.
    pub fn new(page_origin: Option<String>) -> Self {
        let page_origin = page_origin
            .map(|o| o.trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty());
        Self { page_origin }
    }

    /// The configured page origin.
    pub fn page_origin(&self) -> Option<&str> {
        self.page_origin.as_deref()
    }

    /// Find the registry key for `url`.
    ///
    /// `lookup` returns `Some(use_pathname_for_all_queries)` for registered
    /// keys and `None` otherwise.
    pub fn find_match<F>(&self, url: &str, lookup: F) -> Option<MatchResult>
    where
        F: Fn(&str) -> Option<bool>,
    {
        let parts = UrlParts::parse(url);

        if let Some(result) = self.match_parts(&parts, &lookup) {
            return Some(result);
        }

        let rebased = self.rebase(&parts)?;
        self.match_parts(&rebased, &lookup).map(|result| MatchResult {
            kind: MatchKind::PageOrigin,
            ..result
        })
    }

    fn match_parts<F>(&self, parts: &UrlParts, lookup: &F) -> Option<MatchResult>
    where
        F: Fn(&str) -> Option<bool>,
    {
        if lookup(&parts.full_url).is_some() {
            return Some(MatchResult {
                key: parts.full_url.clone(),
                kind: MatchKind::Exact,
            });
        }

        let stripped = [
            (parts.pathname_key(), MatchKind::Pathname),
            (parts.base_url(), MatchKind::BaseUrl),
        ];
        for (key, kind) in stripped {
            if key.is_empty() {
                continue;
            }
            match lookup(&key) {
                Some(use_pathname) if use_pathname || !parts.has_query() => {
                    return Some(MatchResult { key, kind });
                }
                // A query-stripped hit on an entry that did not opt in
                // leaves the request unmocked.
                Some(_) => return None,
                None => {}
            }
        }

        None
    }

    /// Rebase a URL against the page origin: relative URLs gain the origin,
    /// same-origin absolute URLs lose it.
    fn rebase(&self, parts: &UrlParts) -> Option<UrlParts> {
        let page_origin = self.page_origin.as_deref()?;

        if parts.is_relative() {
            if parts.full_url.is_empty() && parts.query_string.is_empty() {
                return None;
            }
            let path = if parts.pathname.is_empty() || parts.pathname.starts_with('/') {
                parts.pathname.clone()
            } else {
                format!("/{}", parts.pathname)
            };
            return Some(UrlParts::parse(&format!(
                "{}{}{}",
                page_origin, path, parts.query_string
            )));
        }

        if parts.origin == page_origin && !parts.pathname.is_empty() {
            return Some(UrlParts::parse(&format!(
                "{}{}",
                parts.pathname, parts.query_string
            )));
        }

        None
    }
}
