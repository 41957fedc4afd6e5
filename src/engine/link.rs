//! engine::link
//!
//! Link qualification.
//!
//! An activation only becomes a soft navigation if the anchor passes every
//! check in [`validate_link`]. A failed check is not an error: it yields a
//! [`Rejection`] and the browser handles the click natively.

use std::collections::{BTreeMap, BTreeSet};

use url::Url;

use crate::core::config::{Filters, NavigationConfig};
use crate::core::urls::{resolve, same_document, same_origin};

/// The attributes of an activated anchor that qualification looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    pub href: Option<String>,
    pub target: Option<String>,
    pub download: bool,
    /// Other attributes on the anchor itself.
    pub attributes: BTreeMap<String, String>,
    /// Names of attributes present on any ancestor element.
    pub ancestor_attributes: BTreeSet<String>,
}

impl Anchor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Default::default()
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn download(mut self) -> Self {
        self.download = true;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn ancestor_attr(mut self, name: impl Into<String>) -> Self {
        self.ancestor_attributes.insert(name.into());
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// Modifier keys held during the activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub fn any(&self) -> bool {
        self.ctrl || self.meta || self.shift || self.alt
    }
}

/// Why an activation is not a soft navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingHref,
    InvalidHref,
    Modified,
    BlankTarget,
    CrossOrigin,
    Download,
    OptedOut,
    Excluded,
    SameUrl,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingHref => "missing href",
            Rejection::InvalidHref => "invalid href",
            Rejection::Modified => "modifier key held",
            Rejection::BlankTarget => "target=_blank",
            Rejection::CrossOrigin => "cross-origin",
            Rejection::Download => "download link",
            Rejection::OptedOut => "opted out",
            Rejection::Excluded => "excluded by prevent_urls",
            Rejection::SameUrl => "same url",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether an activation of `anchor` from `current` is a soft
/// navigation, returning the resolved target if so.
///
/// Checks run in a fixed order and the first failure wins.
pub fn validate_link(
    anchor: &Anchor,
    modifiers: Modifiers,
    current: &Url,
    config: &NavigationConfig,
    filters: &Filters,
) -> Result<Url, Rejection> {
    let href = match anchor.href.as_deref().map(str::trim) {
        Some(href) if !href.is_empty() => href,
        _ => return Err(Rejection::MissingHref),
    };
    if modifiers.any() {
        return Err(Rejection::Modified);
    }
    if anchor
        .target
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("_blank"))
    {
        return Err(Rejection::BlankTarget);
    }

    let target = resolve(current, href).map_err(|_| Rejection::InvalidHref)?;
    if !same_origin(&target, current) {
        return Err(Rejection::CrossOrigin);
    }
    if anchor.download {
        return Err(Rejection::Download);
    }
    if anchor.has_attr(&config.prevent_self_attr)
        || anchor.has_attr(&config.prevent_all_attr)
        || anchor.ancestor_attributes.contains(&config.prevent_all_attr)
    {
        return Err(Rejection::OptedOut);
    }
    if filters.prevent_urls.matches(&target) {
        return Err(Rejection::Excluded);
    }
    if same_document(&target, current) {
        return Err(Rejection::SameUrl);
    }
    Ok(target)
}
