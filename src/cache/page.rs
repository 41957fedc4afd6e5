//! cache::page
//!
//! A fetched page resource.
//!
//! # Lifecycle
//!
//! A [`Page`] starts as raw markup. Its structure (title, head, body, content
//! wrapper) is parsed on the first [`Page::build`] call and kept afterwards.
//! The page the session started on is created already built from the live
//! document with [`Page::from_document`]. When the cache evicts a page it
//! calls [`Page::teardown`], which drops the parsed structure so nothing can
//! reach the old regions through a stale `Arc<Page>`.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

use super::parser::MarkupParser;
use crate::host::{ContentRegion, ParsedDocument};

/// Errors from building a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// No element in the fetched markup carries the wrapper attribute.
    #[error("page {key} has no content wrapper")]
    BuildInvalid { key: String },

    /// The page was evicted and its structure released.
    #[error("page {key} was torn down")]
    TornDown { key: String },
}

#[derive(Debug)]
enum Structure {
    Unbuilt,
    Built(ParsedDocument),
    TornDown,
}

/// A page resource owned by the cache.
pub struct Page {
    key: String,
    url: Url,
    raw: String,
    parser: Arc<dyn MarkupParser>,
    structure: Mutex<Structure>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("key", &self.key)
            .field("url", &self.url.as_str())
            .field("raw_len", &self.raw.len())
            .field("built", &self.is_built())
            .finish()
    }
}

impl Page {
    /// A page holding raw markup, parsed later on [`Page::build`].
    pub fn new(url: Url, key: impl Into<String>, raw: String, parser: Arc<dyn MarkupParser>) -> Self {
        Self {
            key: key.into(),
            url,
            raw,
            parser,
            structure: Mutex::new(Structure::Unbuilt),
        }
    }

    /// A page that is already parsed, such as the live initial document.
    pub fn from_document(
        url: Url,
        key: impl Into<String>,
        mut document: ParsedDocument,
        parser: Arc<dyn MarkupParser>,
    ) -> Self {
        let key = key.into();
        if let Some(wrapper) = document.wrapper.as_mut() {
            wrapper.page = key.clone();
        }
        Self {
            key,
            url,
            raw: String::new(),
            parser,
            structure: Mutex::new(Structure::Built(document)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parse the raw markup if that has not happened yet.
    ///
    /// Building is idempotent.
    ///
    /// # Errors
    ///
    /// - `BuildInvalid` if no content wrapper is found
    /// - `TornDown` if the page was evicted
    pub fn build(&self) -> Result<(), PageError> {
        let mut structure = self.structure.lock();
        match &*structure {
            Structure::TornDown => {
                return Err(PageError::TornDown {
                    key: self.key.clone(),
                })
            }
            Structure::Built(document) => {
                return self.require_wrapper(document);
            }
            Structure::Unbuilt => {}
        }

        let mut document = self.parser.parse(&self.raw);
        if let Some(wrapper) = document.wrapper.as_mut() {
            wrapper.page = self.key.clone();
        }
        let result = self.require_wrapper(&document);
        tracing::debug!(path = %self.key, title = %document.title, "page built");
        *structure = Structure::Built(document);
        result
    }

    fn require_wrapper(&self, document: &ParsedDocument) -> Result<(), PageError> {
        if document.wrapper.is_some() {
            Ok(())
        } else {
            Err(PageError::BuildInvalid {
                key: self.key.clone(),
            })
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(*self.structure.lock(), Structure::Built(_))
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(*self.structure.lock(), Structure::TornDown)
    }

    /// The parsed structure, if built.
    pub fn document(&self) -> Option<ParsedDocument> {
        match &*self.structure.lock() {
            Structure::Built(document) => Some(document.clone()),
            _ => None,
        }
    }

    /// Title of the built page; empty if not built.
    pub fn title(&self) -> String {
        self.document().map(|d| d.title).unwrap_or_default()
    }

    /// The content wrapper region, if built and present.
    pub fn wrapper(&self) -> Option<ContentRegion> {
        self.document().and_then(|d| d.wrapper)
    }

    /// Release the parsed structure.
    pub fn teardown(&self) {
        *self.structure.lock() = Structure::TornDown;
    }
}
