//! host::memory
//!
//! In-memory host for deterministic tests and headless runs.
//!
//! # Design
//!
//! [`MemoryDocument`] keeps an ordered list of content regions plus a title
//! and scroll offset, and records every mutation as a [`DocumentCall`].
//! [`MemoryWindow`] simulates the native history stack (push truncates forward
//! entries, replace overwrites in place) and the location that follows it,
//! recording each call as a [`NativeCall`]. [`MemoryWindow::traverse`] returns
//! the payload a real browser would deliver with the resulting popstate event.
//!
//! # Example
//!
//! ```
//! use softnav::host::memory::MemoryWindow;
//! use softnav::host::{NativeHistory, Window};
//! use softnav::core::types::HistoryPayload;
//! use url::Url;
//!
//! let window = MemoryWindow::new(Url::parse("https://example.com/a").unwrap());
//! let payload = HistoryPayload { index: 0, states: vec![] };
//! window.push_state(&payload, "https://example.com/b");
//! assert_eq!(window.location().path(), "/b");
//!
//! window.traverse(-1);
//! assert_eq!(window.location().path(), "/a");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use super::{ContentRegion, Document, NativeHistory, ParsedDocument, Window};
use crate::core::types::{HistoryPayload, ScrollPosition};

/// Recorded document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentCall {
    SetTitle(String),
    Insert { page: String, after: String },
    Remove { page: String },
    ScrollTo(ScrollPosition),
}

#[derive(Debug)]
struct DocumentInner {
    title: String,
    head: String,
    body: String,
    regions: Vec<ContentRegion>,
    scroll: ScrollPosition,
    anchors: HashMap<String, ScrollPosition>,
    calls: Vec<DocumentCall>,
}

/// In-memory [`Document`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    inner: Arc<Mutex<DocumentInner>>,
}

impl MemoryDocument {
    /// A document whose live state is `initial`.
    pub fn new(initial: ParsedDocument) -> Self {
        let regions = initial.wrapper.into_iter().collect();
        Self {
            inner: Arc::new(Mutex::new(DocumentInner {
                title: initial.title,
                head: initial.head,
                body: initial.body,
                regions,
                scroll: ScrollPosition::ORIGIN,
                anchors: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Place an element with id `fragment` at `position`.
    pub fn set_anchor(&self, fragment: impl Into<String>, position: ScrollPosition) {
        self.inner.lock().anchors.insert(fragment.into(), position);
    }

    /// Move the viewport without recording a call, as a user scroll would.
    pub fn user_scroll(&self, position: ScrollPosition) {
        self.inner.lock().scroll = position;
    }

    /// Content regions currently in the document, in order.
    pub fn regions(&self) -> Vec<ContentRegion> {
        self.inner.lock().regions.clone()
    }

    pub fn calls(&self) -> Vec<DocumentCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }
}

impl Document for MemoryDocument {
    fn title(&self) -> String {
        self.inner.lock().title.clone()
    }

    fn set_title(&self, title: &str) {
        let mut inner = self.inner.lock();
        inner.title = title.to_string();
        inner.calls.push(DocumentCall::SetTitle(title.to_string()));
    }

    fn snapshot(&self) -> ParsedDocument {
        let inner = self.inner.lock();
        ParsedDocument {
            title: inner.title.clone(),
            head: inner.head.clone(),
            body: inner.body.clone(),
            wrapper: inner.regions.first().cloned(),
        }
    }

    fn insert_content(&self, region: &ContentRegion, anchor: &ContentRegion) {
        let mut inner = self.inner.lock();
        let position = inner
            .regions
            .iter()
            .position(|r| r == anchor)
            .map(|p| p + 1)
            .unwrap_or(inner.regions.len());
        inner.regions.insert(position, region.clone());
        inner.calls.push(DocumentCall::Insert {
            page: region.page.clone(),
            after: anchor.page.clone(),
        });
    }

    fn remove_content(&self, region: &ContentRegion) {
        let mut inner = self.inner.lock();
        if let Some(position) = inner.regions.iter().position(|r| r == region) {
            inner.regions.remove(position);
        }
        inner.calls.push(DocumentCall::Remove {
            page: region.page.clone(),
        });
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.inner.lock().scroll
    }

    fn scroll_to(&self, position: ScrollPosition) {
        let mut inner = self.inner.lock();
        inner.scroll = position;
        inner.calls.push(DocumentCall::ScrollTo(position));
    }

    fn anchor_offset(&self, fragment: &str) -> Option<ScrollPosition> {
        let inner = self.inner.lock();
        if let Some(position) = inner.anchors.get(fragment) {
            return Some(*position);
        }

        // Without layout, an element's offset is its byte position in the
        // concatenated content.
        let needle = format!("id=\"{}\"", fragment);
        let mut offset = 0usize;
        for region in &inner.regions {
            if let Some(found) = region.html.find(&needle) {
                return Some(ScrollPosition::new(0.0, (offset + found) as f64));
            }
            offset += region.html.len();
        }
        None
    }
}

/// Recorded native history call.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Push { payload: HistoryPayload, url: String },
    Replace { payload: HistoryPayload, url: String },
}

#[derive(Debug)]
struct WindowInner {
    location: Url,
    entries: Vec<(Option<HistoryPayload>, Url)>,
    position: usize,
    calls: Vec<NativeCall>,
    hard_navigations: Vec<Url>,
}

/// In-memory [`Window`] and [`NativeHistory`].
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    inner: Arc<Mutex<WindowInner>>,
}

impl MemoryWindow {
    /// A window that has just loaded `location`.
    pub fn new(location: Url) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WindowInner {
                entries: vec![(None, location.clone())],
                location,
                position: 0,
                calls: Vec::new(),
                hard_navigations: Vec::new(),
            })),
        }
    }

    /// Move through native history like the back/forward buttons.
    ///
    /// Returns the payload of the entry landed on, which is what a popstate
    /// event would carry, or `None` if the move is out of range or the entry
    /// has no payload.
    pub fn traverse(&self, delta: i64) -> Option<HistoryPayload> {
        let mut inner = self.inner.lock();
        let target = inner.position as i64 + delta;
        if target < 0 || target >= inner.entries.len() as i64 {
            return None;
        }
        inner.position = target as usize;
        let (payload, url) = inner.entries[inner.position].clone();
        inner.location = url;
        payload
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.inner.lock().calls.clone()
    }

    /// URLs passed to [`Window::hard_navigate`], in order.
    pub fn hard_navigations(&self) -> Vec<Url> {
        self.inner.lock().hard_navigations.clone()
    }

    /// Number of native entries.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    fn resolve(inner: &WindowInner, url: &str) -> Url {
        inner
            .location
            .join(url)
            .unwrap_or_else(|_| inner.location.clone())
    }
}

impl NativeHistory for MemoryWindow {
    fn push_state(&self, payload: &HistoryPayload, url: &str) {
        let mut inner = self.inner.lock();
        let target = Self::resolve(&inner, url);
        let keep = inner.position + 1;
        inner.entries.truncate(keep);
        inner.entries.push((Some(payload.clone()), target.clone()));
        inner.position = inner.entries.len() - 1;
        inner.location = target;
        inner.calls.push(NativeCall::Push {
            payload: payload.clone(),
            url: url.to_string(),
        });
    }

    fn replace_state(&self, payload: &HistoryPayload, url: &str) {
        let mut inner = self.inner.lock();
        let target = Self::resolve(&inner, url);
        let position = inner.position;
        inner.entries[position] = (Some(payload.clone()), target.clone());
        inner.location = target;
        inner.calls.push(NativeCall::Replace {
            payload: payload.clone(),
            url: url.to_string(),
        });
    }
}

impl Window for MemoryWindow {
    fn location(&self) -> Url {
        self.inner.lock().location.clone()
    }

    fn hard_navigate(&self, url: &Url) {
        let mut inner = self.inner.lock();
        inner.hard_navigations.push(url.clone());
        inner.location = url.clone();
    }
}
