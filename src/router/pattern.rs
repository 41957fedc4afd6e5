//! router::pattern
//!
//! Path patterns for route predicates.
//!
//! ```text
//! PATTERN := "/" SEGMENT ("/" SEGMENT)* ["/*"]
//! SEGMENT := literal | ":" name
//! ```
//!
//! A trailing `*` matches any remainder, including nothing. Matching is
//! segment-by-segment on the URL path; query and fragment are never part of
//! the match.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Named segments captured by a match.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("route pattern '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("route pattern '{pattern}' has an unnamed parameter")]
    UnnamedParam { pattern: String },

    #[error("route pattern '{pattern}' uses '*' before the last segment")]
    InnerWildcard { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl PathPattern {
    /// Parse `pattern`.
    ///
    /// # Errors
    ///
    /// Fails for relative patterns, bare `:` segments, and a `*` anywhere but
    /// the last segment.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        };

        let parts: Vec<&str> = split(rest).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut wildcard = false;

        for (i, part) in parts.iter().enumerate() {
            if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(PatternError::InnerWildcard {
                        pattern: pattern.to_string(),
                    });
                }
                wildcard = true;
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::UnnamedParam {
                        pattern: pattern.to_string(),
                    });
                }
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal((*part).to_string()));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            wildcard,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match `path`, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = split(path).collect();

        if parts.len() < self.segments.len()
            || (!self.wildcard && parts.len() != self.segments.len())
        {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Non-empty path segments, so `/a/` and `/a` are the same path.
fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse {
        use super::*;

        #[test]
        fn literal_and_params() {
            let p = PathPattern::parse("/blog/:slug").unwrap();
            assert_eq!(p.as_str(), "/blog/:slug");
            assert_eq!(p.segments.len(), 2);
            assert!(!p.wildcard);
        }

        #[test]
        fn trailing_wildcard() {
            let p: PathPattern = "/docs/*".parse().unwrap();
            assert!(p.wildcard);
            assert_eq!(p.segments.len(), 1);
        }

        #[test]
        fn errors() {
            assert_eq!(
                PathPattern::parse("blog"),
                Err(PatternError::NotAbsolute("blog".into()))
            );
            assert!(matches!(
                PathPattern::parse("/blog/:"),
                Err(PatternError::UnnamedParam { .. })
            ));
            assert!(matches!(
                PathPattern::parse("/*/edit"),
                Err(PatternError::InnerWildcard { .. })
            ));
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn exact_literal() {
            let p = PathPattern::parse("/about").unwrap();
            assert_eq!(p.matches("/about"), Some(Params::new()));
            assert_eq!(p.matches("/about/"), Some(Params::new()));
            assert_eq!(p.matches("/about/team"), None);
            assert_eq!(p.matches("/"), None);
        }

        #[test]
        fn root() {
            let p = PathPattern::parse("/").unwrap();
            assert!(p.matches("/").is_some());
            assert!(p.matches("/a").is_none());
        }

        #[test]
        fn captures_params() {
            let p = PathPattern::parse("/users/:id/posts/:post").unwrap();
            let params = p.matches("/users/7/posts/hello").unwrap();
            assert_eq!(params.get("id").map(String::as_str), Some("7"));
            assert_eq!(params.get("post").map(String::as_str), Some("hello"));
            assert!(p.matches("/users/7/comments/hello").is_none());
        }

        #[test]
        fn wildcard_matches_remainder() {
            let p = PathPattern::parse("/docs/*").unwrap();
            assert!(p.matches("/docs").is_some());
            assert!(p.matches("/docs/guide/install").is_some());
            assert!(p.matches("/blog/docs").is_none());
        }

        #[test]
        fn bare_wildcard_matches_everything() {
            let p = PathPattern::parse("/*").unwrap();
            assert!(p.matches("/").is_some());
            assert!(p.matches("/anything/at/all").is_some());
        }
    }
}
