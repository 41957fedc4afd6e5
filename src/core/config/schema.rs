//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! wrapper_attr = "data-softnav-wrapper"
//! timeout = 5000
//! max_pages = 10
//! sticky_scroll = false
//! force_on_error = true
//! cache_ignore = ["/account/*"]
//! prevent_urls = ["*.pdf"]
//!
//! [headers]
//! X-Theme = "dark"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: `max_pages` and `timeout` must be
//! positive, attribute names must be non-empty, and filter patterns must be
//! valid globs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::urls::{UrlFilter, UrlMatcher};

pub const DEFAULT_WRAPPER_ATTR: &str = "data-softnav-wrapper";
pub const DEFAULT_PREVENT_SELF_ATTR: &str = "data-softnav-prevent";
pub const DEFAULT_PREVENT_ALL_ATTR: &str = "data-softnav-prevent-all";
pub const DEFAULT_TRANSITION_ATTR: &str = "data-softnav-transition";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_PAGES: usize = 5;

/// Session configuration, resolved once and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    /// Attribute marking the swappable content region.
    pub wrapper_attr: String,

    /// Extra request headers sent with every fetch.
    pub headers: BTreeMap<String, String>,

    /// Attribute on a link that opts that link out.
    pub prevent_self_attr: String,

    /// Attribute on an ancestor that opts every descendant link out.
    pub prevent_all_attr: String,

    /// Attribute on a link naming the transition to run.
    pub transition_attr: String,

    /// Fetch timeout in milliseconds.
    pub timeout: u64,

    /// Page cache capacity.
    pub max_pages: usize,

    /// Keep the scroll position across non-popstate navigation.
    pub sticky_scroll: bool,

    /// Hard-navigate on any pipeline failure.
    pub force_on_error: bool,

    /// Suppress fragment auto-scroll.
    pub ignore_hash_action: bool,

    /// Paths that are always refetched.
    pub cache_ignore: UrlFilter,

    /// Paths that are never prefetched on hover.
    pub prefetch_ignore: UrlFilter,

    /// Paths that are never soft-navigated.
    pub prevent_urls: UrlFilter,

    /// Swallow activations while a navigation is in flight instead of
    /// falling back to a hard navigation.
    pub prevent_running: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            wrapper_attr: DEFAULT_WRAPPER_ATTR.to_string(),
            headers: BTreeMap::new(),
            prevent_self_attr: DEFAULT_PREVENT_SELF_ATTR.to_string(),
            prevent_all_attr: DEFAULT_PREVENT_ALL_ATTR.to_string(),
            transition_attr: DEFAULT_TRANSITION_ATTR.to_string(),
            timeout: DEFAULT_TIMEOUT_MS,
            max_pages: DEFAULT_MAX_PAGES,
            sticky_scroll: false,
            force_on_error: false,
            ignore_hash_action: false,
            cache_ignore: UrlFilter::default(),
            prefetch_ignore: UrlFilter::default(),
            prevent_urls: UrlFilter::default(),
            prevent_running: false,
        }
    }
}

impl NavigationConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue(
                "max_pages must be at least 1".into(),
            ));
        }
        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout must be greater than 0".into(),
            ));
        }

        for (name, value) in [
            ("wrapper_attr", &self.wrapper_attr),
            ("prevent_self_attr", &self.prevent_self_attr),
            ("prevent_all_attr", &self.prevent_all_attr),
            ("transition_attr", &self.transition_attr),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }

        self.filters().map(|_| ())
    }

    /// Fetch timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Compile the URL filters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the option with a bad pattern.
    pub fn filters(&self) -> Result<Filters, ConfigError> {
        let compile = |name: &str, filter: &UrlFilter| {
            filter
                .compile()
                .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", name, e)))
        };

        Ok(Filters {
            cache_ignore: compile("cache_ignore", &self.cache_ignore)?,
            prefetch_ignore: compile("prefetch_ignore", &self.prefetch_ignore)?,
            prevent_urls: compile("prevent_urls", &self.prevent_urls)?,
        })
    }
}

/// Compiled URL filters.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub cache_ignore: UrlMatcher,
    pub prefetch_ignore: UrlMatcher,
    pub prevent_urls: UrlMatcher,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NavigationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.max_pages, 5);
    }

    #[test]
    fn parse_partial_toml() {
        let config: NavigationConfig = toml::from_str(
            r#"
            max_pages = 2
            force_on_error = true
            cache_ignore = ["/account/*"]

            [headers]
            X-Theme = "dark"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_pages, 2);
        assert!(config.force_on_error);
        assert_eq!(config.headers.get("X-Theme").map(String::as_str), Some("dark"));
        assert_eq!(config.wrapper_attr, DEFAULT_WRAPPER_ATTR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<NavigationConfig, _> = toml::from_str("maxPages = 3");
        assert!(result.is_err());
    }

    #[test]
    fn zero_max_pages_invalid() {
        let config = NavigationConfig {
            max_pages: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_pages"));
    }

    #[test]
    fn zero_timeout_invalid() {
        let config = NavigationConfig {
            timeout: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_attr_invalid() {
        let config = NavigationConfig {
            transition_attr: " ".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("transition_attr"));
    }

    #[test]
    fn bad_glob_names_option() {
        let config = NavigationConfig {
            prefetch_ignore: UrlFilter::Patterns(vec!["[".into()]),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("prefetch_ignore"));
    }
}
