//! transition::engine
//!
//! The transition lifecycle.
//!
//! # Phases
//!
//! [`TransitionEngine::animate`] runs a fixed sequence and announces each
//! boundary on the bus before moving on:
//!
//! 1. both pages must expose a content wrapper (checked before anything else)
//! 2. the document title becomes the new page's title
//! 3. `BEFORE_TRANSITION_OUT`, the `out` hook, `AFTER_TRANSITION_OUT`
//! 4. the new wrapper is inserted after the old one, `CONTENT_INSERT`
//! 5. the old wrapper is removed, `CONTENT_REPLACED`
//! 6. `BEFORE_TRANSITION_IN`, the `in` hook, `AFTER_TRANSITION_IN`
//!
//! Document mutation therefore always happens between the two hooks.

use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use super::{
    AnimateError, Done, Hook, HookContext, TransitionDescriptor, TransitionError, TransitionRegistry,
};
use crate::cache::Page;
use crate::core::types::{ScrollPosition, Trigger};
use crate::events::{Event, EventBus, EventData};
use crate::host::Document;

/// Inputs to one run of the lifecycle.
#[derive(Debug, Clone)]
pub struct AnimateRequest {
    pub from: Arc<Page>,
    pub to: Arc<Page>,
    pub trigger: Trigger,
    /// Scroll target before any fragment adjustment.
    pub scroll: ScrollPosition,
    /// Where the navigation is going; its fragment drives hash scrolling.
    pub target: Url,
    pub ignore_hash_action: bool,
}

/// Result of a completed lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    /// Name of the descriptor that actually ran.
    pub transition: String,
    pub scrollable: bool,
    /// Final scroll target.
    pub scroll: ScrollPosition,
}

/// Runs transitions against a document.
pub struct TransitionEngine {
    registry: RwLock<TransitionRegistry>,
    bus: Arc<EventBus>,
    document: Arc<dyn Document>,
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("transitions", &self.registry.read().names())
            .finish()
    }
}

impl TransitionEngine {
    pub fn new(registry: TransitionRegistry, bus: Arc<EventBus>, document: Arc<dyn Document>) -> Self {
        Self {
            registry: RwLock::new(registry),
            bus,
            document,
        }
    }

    /// Register a descriptor under its own name.
    pub fn add(&self, descriptor: TransitionDescriptor) {
        self.registry.write().add(descriptor);
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.read().has(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<TransitionDescriptor>> {
        self.registry.read().get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    /// Run every registered `init` hook once, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure; later hooks do not run.
    pub async fn init(&self, initial: Arc<Page>, scroll: ScrollPosition) -> Result<(), TransitionError> {
        let descriptors = self.registry.read().descriptors();
        for descriptor in descriptors {
            let Some(init) = descriptor.init.as_ref() else {
                continue;
            };
            tracing::debug!(transition = %descriptor.name, "running init hook");
            run_hook(init, |done| HookContext {
                trigger: Trigger::Programmatic,
                from: Some(Arc::clone(&initial)),
                to: None,
                scroll,
                done,
            })
            .await?;
        }
        Ok(())
    }

    /// Run the lifecycle for `name`, substituting the default transition for
    /// unknown names.
    ///
    /// # Errors
    ///
    /// - `MissingWrapper` if either page lacks a content wrapper; nothing has
    ///   been mutated in that case
    /// - whatever a hook returns. A failing `out` hook puts the old title
    ///   back, so the document is as it was; `swapped` tells the two apart
    pub async fn animate(&self, name: &str, request: AnimateRequest) -> Result<Animation, AnimateError> {
        let old = request
            .from
            .wrapper()
            .ok_or_else(|| {
                AnimateError::before_swap(TransitionError::MissingWrapper {
                    key: request.from.key().to_string(),
                })
            })?;
        let new = request
            .to
            .wrapper()
            .ok_or_else(|| {
                AnimateError::before_swap(TransitionError::MissingWrapper {
                    key: request.to.key().to_string(),
                })
            })?;

        let descriptor = self.registry.read().resolve(name);
        let data = EventData::Transition {
            name: descriptor.name.clone(),
            from: request.from.url().to_string(),
            to: request.to.url().to_string(),
            trigger: request.trigger.clone(),
        };
        tracing::debug!(
            transition = %descriptor.name,
            from = %request.from.key(),
            to = %request.to.key(),
            "animating"
        );

        let previous_title = self.document.title();
        self.document.set_title(&request.to.title());

        self.bus.emit(Event::BeforeTransitionOut, data.clone());
        let out = run_hook(&descriptor.out, |done| HookContext {
            trigger: request.trigger.clone(),
            from: Some(Arc::clone(&request.from)),
            to: None,
            scroll: request.scroll,
            done,
        })
        .await;
        if let Err(error) = out {
            self.document.set_title(&previous_title);
            return Err(AnimateError::before_swap(error));
        }
        self.bus.emit(Event::AfterTransitionOut, data.clone());

        self.document.insert_content(&new, &old);
        self.bus.emit(Event::ContentInsert, data.clone());

        self.document.remove_content(&old);
        self.bus.emit(Event::ContentReplaced, data.clone());

        let mut scroll = request.scroll;
        if !request.trigger.is_history_traversal() && !request.ignore_hash_action {
            if let Some(offset) = request
                .target
                .fragment()
                .filter(|f| !f.is_empty())
                .and_then(|f| self.document.anchor_offset(f))
            {
                scroll = offset;
            }
        }

        self.bus.emit(Event::BeforeTransitionIn, data.clone());
        run_hook(&descriptor.in_, |done| HookContext {
            trigger: request.trigger.clone(),
            from: Some(Arc::clone(&request.from)),
            to: Some(Arc::clone(&request.to)),
            scroll,
            done,
        })
        .await
        .map_err(|error| AnimateError {
            error,
            swapped: true,
        })?;
        self.bus.emit(Event::AfterTransitionIn, data);

        Ok(Animation {
            transition: descriptor.name.clone(),
            scrollable: descriptor.scrollable,
            scroll,
        })
    }
}

/// Call `hook` and wait for its future or its `done` signal, whichever is
/// first. A `Done` dropped without signalling leaves only the future.
async fn run_hook(hook: &Hook, context: impl FnOnce(Done) -> HookContext) -> Result<(), TransitionError> {
    let (done, mut signal) = Done::channel();
    let mut future = hook(context(done));
    tokio::select! {
        result = &mut future => result,
        Ok(()) = &mut signal => Ok(()),
    }
}
