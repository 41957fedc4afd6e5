//! transition
//!
//! Transition descriptors, their registry, and the lifecycle engine.
//!
//! # Design
//!
//! A [`TransitionDescriptor`] is a name plus three uniform [`Hook`]s: an
//! optional `init` run once at boot, and the `out`/`in` pair run around the
//! content swap. A hook receives a [`HookContext`] and returns a future.
//!
//! # Completion
//!
//! A hook finishes when its returned future resolves or when it signals
//! [`Done`], whichever happens first. Hooks written in callback style use
//! [`callback_hook`], whose future never resolves on its own, so only the
//! `done` signal ends them.
//!
//! # Example
//!
//! ```
//! use softnav::transition::{hook, TransitionDescriptor, TransitionRegistry};
//!
//! let fade = TransitionDescriptor::new(
//!     "fade",
//!     hook(|_ctx| async { Ok(()) }),
//!     hook(|_ctx| async { Ok(()) }),
//! );
//!
//! let mut registry = TransitionRegistry::new();
//! registry.add(fade);
//! assert!(registry.has("fade"));
//! assert!(registry.has("default"));
//! ```

pub mod engine;

pub use engine::{AnimateRequest, Animation, TransitionEngine};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::cache::Page;
use crate::core::registry::Registry;
use crate::core::types::{ScrollPosition, Trigger};

/// Name of the transition that is always registered.
pub const DEFAULT_TRANSITION: &str = "default";

/// Errors from the transition lifecycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// A page reached the transition without a content wrapper.
    #[error("page {key} has no content wrapper")]
    MissingWrapper { key: String },

    /// A hook reported failure.
    #[error("transition hook failed: {0}")]
    HookFailed(String),
}

/// A lifecycle run that stopped part way.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{error}")]
pub struct AnimateError {
    pub error: TransitionError,
    /// True once the new content has been inserted into the document.
    pub swapped: bool,
}

impl AnimateError {
    fn before_swap(error: TransitionError) -> Self {
        Self {
            error,
            swapped: false,
        }
    }
}

pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), TransitionError>> + Send>>;

/// A lifecycle hook.
pub type Hook = Arc<dyn Fn(HookContext) -> HookFuture + Send + Sync>;

/// Wrap an async closure as a [`Hook`].
pub fn hook<F, Fut>(f: F) -> Hook
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TransitionError>> + Send + 'static,
{
    Arc::new(move |ctx| -> HookFuture { Box::pin(f(ctx)) })
}

/// Wrap a callback-style closure as a [`Hook`]. The hook ends only when the
/// closure (or something it hands the context to) calls [`Done::signal`].
pub fn callback_hook<F>(f: F) -> Hook
where
    F: Fn(HookContext) + Send + Sync + 'static,
{
    Arc::new(move |ctx| -> HookFuture {
        f(ctx);
        Box::pin(futures::future::pending())
    })
}

/// A hook that finishes immediately.
pub fn noop_hook() -> Hook {
    hook(|_| async { Ok(()) })
}

/// Explicit completion signal handed to every hook.
#[derive(Clone)]
pub struct Done {
    sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl Done {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Mark the hook as finished. Later calls do nothing.
    pub fn signal(&self) {
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for Done {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Done")
            .field("signalled", &self.sender.lock().is_none())
            .finish()
    }
}

/// What a hook sees.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub trigger: Trigger,
    /// Page being left. For `init`, the page the session started on.
    pub from: Option<Arc<Page>>,
    /// Page being entered; only set for `in`.
    pub to: Option<Arc<Page>>,
    pub scroll: ScrollPosition,
    pub done: Done,
}

/// A named transition.
#[derive(Clone)]
pub struct TransitionDescriptor {
    pub name: String,
    pub init: Option<Hook>,
    pub out: Hook,
    pub in_: Hook,
    /// The hooks handle scrolling themselves, so the controller skips its
    /// own post-transition scroll.
    pub scrollable: bool,
}

impl std::fmt::Debug for TransitionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionDescriptor")
            .field("name", &self.name)
            .field("init", &self.init.is_some())
            .field("scrollable", &self.scrollable)
            .finish()
    }
}

impl TransitionDescriptor {
    pub fn new(name: impl Into<String>, out: Hook, in_: Hook) -> Self {
        Self {
            name: name.into(),
            init: None,
            out,
            in_,
            scrollable: false,
        }
    }

    /// A transition that swaps content with no animation.
    pub fn instant(name: impl Into<String>) -> Self {
        Self::new(name, noop_hook(), noop_hook())
    }

    pub fn with_init(mut self, init: Hook) -> Self {
        self.init = Some(init);
        self
    }

    pub fn scrollable(mut self, scrollable: bool) -> Self {
        self.scrollable = scrollable;
        self
    }
}

/// Name → descriptor table, always holding [`DEFAULT_TRANSITION`].
#[derive(Debug)]
pub struct TransitionRegistry {
    entries: Registry<String, Arc<TransitionDescriptor>>,
}

impl TransitionRegistry {
    pub fn new() -> Self {
        let mut entries = Registry::new();
        entries.set(
            DEFAULT_TRANSITION.to_string(),
            Arc::new(TransitionDescriptor::instant(DEFAULT_TRANSITION)),
        );
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<Arc<TransitionDescriptor>> {
        self.entries.get(name).cloned()
    }

    /// Register `descriptor` under `name`, which may differ from its own.
    pub fn set(&mut self, name: impl Into<String>, descriptor: TransitionDescriptor) {
        self.entries.set(name.into(), Arc::new(descriptor));
    }

    /// Register `descriptor` under its own name.
    pub fn add(&mut self, descriptor: TransitionDescriptor) {
        let name = descriptor.name.clone();
        self.set(name, descriptor);
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.has(name)
    }

    /// Look up `name`, substituting the default for unknown names.
    pub fn resolve(&self, name: &str) -> Arc<TransitionDescriptor> {
        if let Some(descriptor) = self.get(name) {
            return descriptor;
        }
        tracing::warn!(transition = %name, "unknown transition, using default");
        match self.get(DEFAULT_TRANSITION) {
            Some(descriptor) => descriptor,
            None => Arc::new(TransitionDescriptor::instant(DEFAULT_TRANSITION)),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn descriptors(&self) -> Vec<Arc<TransitionDescriptor>> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TransitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
