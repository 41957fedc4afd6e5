//! core::urls
//!
//! URL helpers shared by the controller and the page cache.
//!
//! # Cache Keys
//!
//! Pages are keyed by path plus query string. Scheme, host and fragment never
//! take part in the key, so `https://example.com/a#top` and `/a` share a cache
//! entry.
//!
//! # Filters
//!
//! `cache_ignore`, `prefetch_ignore` and `prevent_urls` accept either a boolean
//! or a list of glob patterns:
//!
//! ```toml
//! cache_ignore = true
//! prevent_urls = ["/admin/*", "*.pdf"]
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

/// Resolve `href` against `base` (absolute hrefs are returned as-is).
pub fn resolve(base: &Url, href: &str) -> Result<Url, url::ParseError> {
    base.join(href)
}

/// Cache key for a URL: path plus `?query` when present.
pub fn cache_key(url: &Url) -> String {
    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
        _ => url.path().to_string(),
    }
}

/// Same scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Equal once fragments are ignored.
pub fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

/// Boolean-or-pattern-list option as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlFilter {
    Toggle(bool),
    Patterns(Vec<String>),
}

impl Default for UrlFilter {
    fn default() -> Self {
        UrlFilter::Toggle(false)
    }
}

impl UrlFilter {
    /// Compile into a matcher.
    ///
    /// # Errors
    ///
    /// Returns the glob error for the first invalid pattern.
    pub fn compile(&self) -> Result<UrlMatcher, globset::Error> {
        match self {
            UrlFilter::Toggle(true) => Ok(UrlMatcher::Always),
            UrlFilter::Toggle(false) => Ok(UrlMatcher::Never),
            UrlFilter::Patterns(patterns) if patterns.is_empty() => Ok(UrlMatcher::Never),
            UrlFilter::Patterns(patterns) => {
                let mut builder = GlobSetBuilder::new();
                for pattern in patterns {
                    builder.add(Glob::new(pattern)?);
                }
                Ok(UrlMatcher::Set(builder.build()?))
            }
        }
    }
}

/// Compiled [`UrlFilter`].
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    Always,
    Never,
    Set(GlobSet),
}

impl Default for UrlMatcher {
    fn default() -> Self {
        UrlMatcher::Never
    }
}

impl UrlMatcher {
    /// True if the URL's cache key or its full serialization matches.
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            UrlMatcher::Always => true,
            UrlMatcher::Never => false,
            UrlMatcher::Set(set) => set.is_match(cache_key(url)) || set.is_match(url.as_str()),
        }
    }
}
