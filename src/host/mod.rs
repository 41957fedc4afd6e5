//! host
//!
//! Collaborator interfaces for the environment the controller runs in.
//!
//! # Design
//!
//! The controller never touches a real DOM, history stack or window directly.
//! It talks to three narrow traits instead:
//!
//! - [`Document`] - title, the swappable content regions, scrolling
//! - [`NativeHistory`] - `pushState` / `replaceState`
//! - [`Window`] - current location and hard navigation
//!
//! All methods are synchronous; the only suspension points in a navigation are
//! the fetch and the transition hooks. [`memory`] provides recording in-memory
//! implementations used by tests and by the headless `trace` command.

pub mod memory;

use url::Url;

use crate::core::types::{HistoryPayload, ScrollPosition};

/// A swappable content region: the element carrying the wrapper attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRegion {
    /// Key of the page this region belongs to.
    pub page: String,
    /// Outer markup of the wrapper element.
    pub html: String,
}

/// Structural pieces of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub title: String,
    pub head: String,
    pub body: String,
    /// `None` when no element carries the wrapper attribute.
    pub wrapper: Option<ContentRegion>,
}

/// The live document.
pub trait Document: Send + Sync {
    fn title(&self) -> String;

    fn set_title(&self, title: &str);

    /// The live document as already parsed, used to seed the cache with the
    /// page the session started on.
    fn snapshot(&self) -> ParsedDocument;

    /// Insert `region` directly after `anchor`.
    fn insert_content(&self, region: &ContentRegion, anchor: &ContentRegion);

    fn remove_content(&self, region: &ContentRegion);

    fn scroll_position(&self) -> ScrollPosition;

    fn scroll_to(&self, position: ScrollPosition);

    /// Where the element with id `fragment` sits, if it exists.
    fn anchor_offset(&self, fragment: &str) -> Option<ScrollPosition>;
}

/// The browser's native history stack.
pub trait NativeHistory: Send + Sync {
    fn push_state(&self, payload: &HistoryPayload, url: &str);

    fn replace_state(&self, payload: &HistoryPayload, url: &str);
}

/// Location and hard navigation.
pub trait Window: Send + Sync {
    fn location(&self) -> Url;

    /// Leave soft navigation behind and load `url` for real.
    fn hard_navigate(&self, url: &Url);
}
