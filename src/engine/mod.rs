//! engine
//!
//! The navigation controller: the state machine that ties history, cache and
//! transitions together.
//!
//! # Pipeline
//!
//! Every navigation, whether from a link, a programmatic [`Controller::go`]
//! or a popstate replay, runs the same pipeline:
//!
//! ```text
//! GO -> NAVIGATION_START -> PAGE_LOADING -> [load old + new] -> PAGE_LOAD_COMPLETE
//!    -> [commit history] -> TRANSITION_START -> [animate] -> TRANSITION_END
//!    -> [post-scroll] -> NAVIGATION_END
//! ```
//!
//! History is committed only after both pages are loaded and built, so a
//! failed fetch leaves history untouched. The document is only mutated inside
//! the transition engine. If the transition fails before the new content is
//! inserted, the commit is rolled back and the user stays where they were.
//!
//! Both pages are pinned in the cache for the whole navigation, so eviction
//! triggered by this or any concurrent load never tears them down.
//!
//! # Invariants
//!
//! - at most one navigation is in flight; the busy flag is held by a guard
//!   that releases it on every exit path
//! - a navigation to the current document does nothing, apart from scrolling
//!   to its fragment
//! - a busy controller either swallows a new activation (`prevent_running`)
//!   or abandons soft navigation and hard-navigates
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use softnav::engine::ControllerBuilder;
//! use softnav::host::memory::{MemoryDocument, MemoryWindow};
//! use softnav::host::{ContentRegion, ParsedDocument};
//! use url::Url;
//!
//! # tokio_test::block_on(async {
//! let window = Arc::new(MemoryWindow::new(Url::parse("https://example.com/").unwrap()));
//! let document = Arc::new(MemoryDocument::new(ParsedDocument {
//!     wrapper: Some(ContentRegion {
//!         page: "/".into(),
//!         html: "<main data-softnav-wrapper></main>".into(),
//!     }),
//!     ..Default::default()
//! }));
//! let controller = ControllerBuilder::new(document, window.clone(), window).build().unwrap();
//! controller.boot().await.unwrap();
//! controller.go("/about", None).await.unwrap();
//! # });
//! ```

pub mod link;

pub use link::{validate_link, Anchor, Modifiers, Rejection};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

use crate::cache::{CacheOptions, MarkerParser, MarkupParser, Page, PageCache, PageError};
use crate::core::config::{ConfigError, Filters, NavigationConfig};
use crate::core::types::{Direction, HistoryPayload, NavigationState, ScrollPosition, Trigger};
use crate::core::urls::{cache_key, resolve, same_document, same_origin};
use crate::events::{Event, EventBus, EventData};
use crate::fetch::{Fetcher, HttpFetcher, RequestError};
use crate::history::{HistoryMode, HistoryStore};
use crate::host::{Document, NativeHistory, Window};
use crate::transition::{
    AnimateRequest, TransitionDescriptor, TransitionEngine, TransitionError, TransitionRegistry,
    DEFAULT_TRANSITION,
};

/// Errors from navigation.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("request failed: {0}")]
    Request(#[from] RequestError),

    #[error("page build failed: {0}")]
    Page(#[from] PageError),

    #[error("transition failed: {0}")]
    Transition(#[from] TransitionError),

    #[error("invalid url '{href}': {message}")]
    InvalidUrl { href: String, message: String },

    #[error("controller has not been booted")]
    NotBooted,

    #[error("controller is already booted")]
    AlreadyBooted,
}

/// How a navigation request ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Content was swapped and history updated.
    Completed { url: Url, transition: String },
    /// The target is the current document; nothing happened.
    Unchanged,
    /// A navigation was already running and `prevent_running` is set.
    Blocked,
    /// Soft navigation was abandoned for a full page load.
    HardNavigated(Url),
    /// The activation did not qualify as a navigation.
    Rejected(Rejection),
}

/// What hovering a link did.
#[derive(Debug, Clone)]
pub enum PrefetchOutcome {
    Rejected(Rejection),
    Ignored,
    AlreadyCached,
    Loaded(Arc<Page>),
}

/// Shared per-session state handed to every component.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub config: Arc<NavigationConfig>,
    pub bus: Arc<EventBus>,
}

/// Builds a [`Controller`] from its collaborators.
pub struct ControllerBuilder {
    config: NavigationConfig,
    bus: Option<Arc<EventBus>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    parser: Option<Arc<dyn MarkupParser>>,
    document: Arc<dyn Document>,
    window: Arc<dyn Window>,
    native: Arc<dyn NativeHistory>,
    transitions: Vec<TransitionDescriptor>,
}

impl ControllerBuilder {
    pub fn new(
        document: Arc<dyn Document>,
        window: Arc<dyn Window>,
        native: Arc<dyn NativeHistory>,
    ) -> Self {
        Self {
            config: NavigationConfig::default(),
            bus: None,
            fetcher: None,
            parser: None,
            document,
            window,
            native,
            transitions: Vec::new(),
        }
    }

    pub fn config(mut self, config: NavigationConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing bus, e.g. one a router is already subscribed to.
    pub fn bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Defaults to [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Defaults to a [`MarkerParser`] for the configured wrapper attribute.
    pub fn parser(mut self, parser: Arc<dyn MarkupParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn transition(mut self, descriptor: TransitionDescriptor) -> Self {
        self.transitions.push(descriptor);
        self
    }

    /// Validate the configuration and assemble the controller.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is invalid.
    pub fn build(self) -> Result<Controller, NavigationError> {
        self.config.validate()?;
        let filters = self.config.filters()?;

        let parser: Arc<dyn MarkupParser> = match self.parser {
            Some(parser) => parser,
            None => Arc::new(MarkerParser::new(&self.config.wrapper_attr).map_err(|e| {
                ConfigError::InvalidValue(format!("wrapper_attr: {}", e))
            })?),
        };
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()),
        };
        let bus = self.bus.unwrap_or_default();

        let cache = PageCache::new(
            CacheOptions::from_config(&self.config, &filters),
            fetcher,
            parser,
            Arc::clone(&self.window),
        );

        let mut registry = TransitionRegistry::new();
        for descriptor in self.transitions {
            registry.add(descriptor);
        }
        let transitions =
            TransitionEngine::new(registry, Arc::clone(&bus), Arc::clone(&self.document));

        Ok(Controller {
            context: SessionContext {
                config: Arc::new(self.config),
                bus,
            },
            filters,
            history: Mutex::new(HistoryStore::new(self.native)),
            cache: Arc::new(cache),
            transitions,
            document: self.document,
            window: self.window,
            busy: AtomicBool::new(false),
            booted: AtomicBool::new(false),
        })
    }
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Everything the pipeline needs to know about one navigation.
struct Plan {
    from: NavigationState,
    target: Url,
    trigger: Trigger,
    transition: String,
    commit: Commit,
}

enum Commit {
    /// Push a fresh state.
    Push(NavigationState),
    /// Adopt the state list carried by a native history entry.
    Adopt(HistoryPayload),
}

/// How to undo a [`Commit`].
enum Revert {
    Push,
    /// The store as it was before adopting.
    Adopt(HistoryPayload),
}

/// The navigation controller.
pub struct Controller {
    context: SessionContext,
    filters: Filters,
    history: Mutex<HistoryStore>,
    cache: Arc<PageCache>,
    transitions: TransitionEngine,
    document: Arc<dyn Document>,
    window: Arc<dyn Window>,
    busy: AtomicBool,
    booted: AtomicBool,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("history", &*self.history.lock())
            .field("cache", &self.cache)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl Controller {
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.context.bus
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.context.config
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }

    pub fn transitions(&self) -> &TransitionEngine {
        &self.transitions
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Copy of the recorded states.
    pub fn history(&self) -> Vec<NavigationState> {
        self.history.lock().states().to_vec()
    }

    pub fn history_pointer(&self) -> usize {
        self.history.lock().pointer()
    }

    pub fn current_state(&self) -> Option<NavigationState> {
        self.history.lock().current().cloned()
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    /// Start the session on the page currently in the document.
    ///
    /// Seeds history with a replace-style entry, caches the live document as
    /// the initial page, runs every transition's `init` hook, then emits
    /// `READY`.
    ///
    /// # Errors
    ///
    /// - `AlreadyBooted` on a second call
    /// - `Page` if the live document has no content wrapper
    /// - `Transition` if an `init` hook fails
    pub async fn boot(&self) -> Result<(), NavigationError> {
        if self.booted.swap(true, Ordering::SeqCst) {
            return Err(NavigationError::AlreadyBooted);
        }

        let location = self.window.location();
        let key = cache_key(&location);
        let page = Arc::new(Page::from_document(
            location.clone(),
            key.clone(),
            self.document.snapshot(),
            self.cache.parser(),
        ));
        if let Err(e) = page.build() {
            self.booted.store(false, Ordering::SeqCst);
            return Err(e.into());
        }
        self.cache.insert(Arc::clone(&page));

        let scroll = self.document.scroll_position();
        self.history.lock().init(NavigationState::new(
            location.as_str(),
            DEFAULT_TRANSITION,
            scroll,
        ));

        self.transitions.init(page, scroll).await?;

        tracing::info!(url = %location, "soft navigation ready");
        self.context.bus.emit(Event::Ready, EventData::None);
        Ok(())
    }

    /// End the session: history and cache are cleared.
    pub fn destroy(&self) {
        self.history.lock().clear();
        self.cache.clear();
        self.booted.store(false, Ordering::SeqCst);
        tracing::debug!("controller destroyed");
    }

    pub fn on_resize(&self) {
        self.context.bus.emit(Event::Resize, EventData::None);
    }

    pub fn on_scroll(&self) {
        self.context.bus.emit(Event::Scroll, EventData::None);
    }

    /// Handle an anchor activation.
    ///
    /// Rejected activations emit nothing. A same-document link with a
    /// fragment scrolls to its anchor unless `ignore_hash_action` is set.
    ///
    /// # Errors
    ///
    /// See [`Controller::go`].
    pub async fn on_click(
        &self,
        anchor: &Anchor,
        modifiers: Modifiers,
    ) -> Result<NavigationOutcome, NavigationError> {
        let current = self.window.location();
        let target = match validate_link(
            anchor,
            modifiers,
            &current,
            &self.context.config,
            &self.filters,
        ) {
            Ok(target) => target,
            Err(Rejection::SameUrl) => {
                self.scroll_to_hash(anchor.href.as_deref().unwrap_or_default(), &current);
                return Ok(NavigationOutcome::Rejected(Rejection::SameUrl));
            }
            Err(reason) => {
                tracing::trace!(href = ?anchor.href, %reason, "link rejected");
                return Ok(NavigationOutcome::Rejected(reason));
            }
        };

        let href = anchor.href.clone().unwrap_or_default();
        let link = EventData::Link { href: href.clone() };
        self.context.bus.emit(Event::AnchorClick, link.clone());
        self.context.bus.emit(Event::Click, link);

        let transition = anchor
            .get_attr(&self.context.config.transition_attr)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_TRANSITION)
            .to_string();
        self.forward(target, Trigger::Link { href }, transition).await
    }

    /// Navigate to `href` (resolved against the current location).
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `href` cannot be resolved
    /// - `Request` / `Page` if loading failed (after a hard navigation when
    ///   `force_on_error` is set)
    /// - `Transition` if the lifecycle failed
    pub async fn go(
        &self,
        href: &str,
        transition: Option<&str>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let current = self.window.location();
        let target = resolve(&current, href).map_err(|e| NavigationError::InvalidUrl {
            href: href.to_string(),
            message: e.to_string(),
        })?;

        if !same_origin(&target, &current) {
            tracing::debug!(url = %target, "cross-origin target, hard navigating");
            self.window.hard_navigate(&target);
            return Ok(NavigationOutcome::HardNavigated(target));
        }
        if same_document(&target, &current) {
            self.scroll_to_hash(href, &current);
            return Ok(NavigationOutcome::Unchanged);
        }

        let transition = transition.unwrap_or(DEFAULT_TRANSITION).to_string();
        self.forward(target, Trigger::Programmatic, transition).await
    }

    /// Handle a native popstate carrying `payload`.
    ///
    /// Entries without a payload were not created by this controller (for
    /// example a fragment change) and are ignored.
    ///
    /// # Errors
    ///
    /// See [`Controller::go`].
    pub async fn on_popstate(
        &self,
        payload: Option<HistoryPayload>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let Some(payload) = payload else {
            tracing::debug!("popstate without payload ignored");
            return Ok(NavigationOutcome::Unchanged);
        };
        let Some(next) = payload.current().cloned() else {
            tracing::warn!(index = payload.index, "popstate payload has no current state");
            return Ok(NavigationOutcome::Unchanged);
        };

        let from = self.current_or_err()?;
        let direction = Direction::infer(from.index, payload.index);

        let popstate = EventData::Popstate {
            direction,
            index: payload.index,
        };
        self.context.bus.emit(Event::Popstate, popstate.clone());
        match direction {
            Direction::Back => self.context.bus.emit(Event::PopstateBack, popstate),
            Direction::Forward => self.context.bus.emit(Event::PopstateForward, popstate),
            Direction::Popstate => {}
        }

        let target = Url::parse(&next.url).map_err(|e| NavigationError::InvalidUrl {
            href: next.url.clone(),
            message: e.to_string(),
        })?;

        // Going back replays the transition that brought us forward.
        let transition = match direction {
            Direction::Back => from.transition_name.clone(),
            _ => next.transition_name.clone(),
        };

        self.run(Plan {
            from,
            target,
            trigger: Trigger::Popstate(direction),
            transition,
            commit: Commit::Adopt(payload),
        })
        .await
    }

    /// Prefetch the target of a hovered anchor.
    ///
    /// Never touches history or the busy flag.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the prefetch failed.
    pub async fn on_hover(&self, anchor: &Anchor) -> Result<PrefetchOutcome, NavigationError> {
        let current = self.window.location();
        let target = match validate_link(
            anchor,
            Modifiers::NONE,
            &current,
            &self.context.config,
            &self.filters,
        ) {
            Ok(target) => target,
            Err(reason) => return Ok(PrefetchOutcome::Rejected(reason)),
        };

        let link = EventData::Link {
            href: anchor.href.clone().unwrap_or_default(),
        };
        self.context.bus.emit(Event::AnchorHover, link.clone());
        self.context.bus.emit(Event::Hover, link.clone());

        if self.filters.prefetch_ignore.matches(&target) {
            return Ok(PrefetchOutcome::Ignored);
        }
        if self.cache.is_cached(&target) {
            return Ok(PrefetchOutcome::AlreadyCached);
        }

        self.context.bus.emit(Event::Prefetch, link);
        let page = self.cache.load(&target).await?;
        tracing::debug!(path = %page.key(), "prefetched");
        Ok(PrefetchOutcome::Loaded(page))
    }

    fn current_or_err(&self) -> Result<NavigationState, NavigationError> {
        self.history
            .lock()
            .current()
            .cloned()
            .ok_or(NavigationError::NotBooted)
    }

    fn scroll_to_hash(&self, href: &str, current: &Url) {
        if self.context.config.ignore_hash_action {
            return;
        }
        let Ok(target) = resolve(current, href) else {
            return;
        };
        if let Some(offset) = target
            .fragment()
            .filter(|f| !f.is_empty())
            .and_then(|f| self.document.anchor_offset(f))
        {
            self.document.scroll_to(offset);
        }
    }

    async fn forward(
        &self,
        target: Url,
        trigger: Trigger,
        transition: String,
    ) -> Result<NavigationOutcome, NavigationError> {
        let from = self.current_or_err()?;
        let scroll = if self.context.config.sticky_scroll {
            self.document.scroll_position()
        } else {
            ScrollPosition::ORIGIN
        };
        let state = NavigationState::new(target.as_str(), transition.clone(), scroll);

        self.run(Plan {
            from,
            target,
            trigger,
            transition,
            commit: Commit::Push(state),
        })
        .await
    }

    async fn run(&self, plan: Plan) -> Result<NavigationOutcome, NavigationError> {
        let from_url = Url::parse(&plan.from.url).map_err(|e| NavigationError::InvalidUrl {
            href: plan.from.url.clone(),
            message: e.to_string(),
        })?;

        if same_document(&from_url, &plan.target) && !plan.trigger.is_history_traversal() {
            return Ok(NavigationOutcome::Unchanged);
        }

        let Some(_guard) = self.try_acquire() else {
            if self.context.config.prevent_running {
                tracing::debug!(url = %plan.target, "navigation in progress, activation swallowed");
                return Ok(NavigationOutcome::Blocked);
            }
            tracing::debug!(url = %plan.target, "navigation in progress, hard navigating");
            self.window.hard_navigate(&plan.target);
            return Ok(NavigationOutcome::HardNavigated(plan.target));
        };
        let _pins = self
            .cache
            .pin([cache_key(&from_url), cache_key(&plan.target)]);

        let bus = &self.context.bus;
        let navigation = EventData::Navigation {
            from: plan.from.url.clone(),
            to: plan.target.to_string(),
            trigger: plan.trigger.clone(),
        };
        bus.emit(Event::Go, navigation.clone());
        bus.emit(Event::NavigationStart, navigation.clone());

        let (old, new) = match self.load(&from_url, &plan.target).await {
            Ok(pages) => pages,
            Err(error) => return Err(self.fail(&plan.target, error)),
        };

        let scroll = match &plan.commit {
            Commit::Push(state) => state.scroll(),
            Commit::Adopt(payload) => payload
                .current()
                .map(NavigationState::scroll)
                .unwrap_or(ScrollPosition::ORIGIN),
        };
        let revert = self.commit(plan.commit);

        bus.emit(
            Event::TransitionStart,
            EventData::Transition {
                name: plan.transition.clone(),
                from: plan.from.url.clone(),
                to: plan.target.to_string(),
                trigger: plan.trigger.clone(),
            },
        );

        let request = AnimateRequest {
            from: old,
            to: new,
            trigger: plan.trigger.clone(),
            scroll,
            target: plan.target.clone(),
            ignore_hash_action: self.context.config.ignore_hash_action,
        };
        let animation = match self.transitions.animate(&plan.transition, request).await {
            Ok(animation) => animation,
            Err(failure) => {
                if !failure.swapped {
                    self.revert(revert);
                }
                return Err(self.fail(&plan.target, failure.error.into()));
            }
        };

        bus.emit(
            Event::TransitionEnd,
            EventData::Transition {
                name: animation.transition.clone(),
                from: plan.from.url.clone(),
                to: plan.target.to_string(),
                trigger: plan.trigger.clone(),
            },
        );

        if !animation.scrollable {
            self.document.scroll_to(animation.scroll);
        }

        tracing::info!(
            from = %plan.from.url,
            to = %plan.target,
            transition = %animation.transition,
            trigger = %plan.trigger,
            "navigation complete"
        );
        bus.emit(Event::NavigationEnd, navigation);

        Ok(NavigationOutcome::Completed {
            url: plan.target,
            transition: animation.transition,
        })
    }

    /// Load and build the page being left and the page being entered.
    async fn load(&self, from: &Url, to: &Url) -> Result<(Arc<Page>, Arc<Page>), NavigationError> {
        let bus = &self.context.bus;
        let link = EventData::Link {
            href: to.to_string(),
        };
        bus.emit(Event::PageLoading, link.clone());

        let (old, new) = futures::try_join!(self.cache.load(from), self.cache.load(to))?;
        old.build()?;
        new.build()?;

        bus.emit(Event::PageLoadComplete, link);
        Ok((old, new))
    }

    fn commit(&self, commit: Commit) -> Revert {
        let mut history = self.history.lock();
        match commit {
            Commit::Push(state) => {
                let dropped = history.truncate_forward();
                if dropped > 0 {
                    tracing::debug!(dropped, "discarded forward history");
                }
                let added = history.add(state, HistoryMode::Push).clone();
                drop(history);
                self.context
                    .bus
                    .emit(Event::HistoryNewItem, EventData::History { state: added });
                Revert::Push
            }
            Commit::Adopt(payload) => {
                let before = history.payload();
                history.replace(payload.states);
                history.set_pointer(payload.index);
                Revert::Adopt(before)
            }
        }
    }

    /// Put history back the way it was before [`Controller::commit`].
    fn revert(&self, revert: Revert) {
        let mut history = self.history.lock();
        match revert {
            Revert::Push => {
                history.retract();
            }
            Revert::Adopt(before) => {
                history.replace(before.states);
                history.set_pointer(before.index);
            }
        }
        tracing::debug!(pointer = history.pointer(), "history rolled back");
    }

    /// Report a pipeline failure and apply the fallback policy.
    fn fail(&self, target: &Url, error: NavigationError) -> NavigationError {
        let data = EventData::Error {
            url: target.to_string(),
            message: error.to_string(),
        };
        match &error {
            NavigationError::Request(e) if e.is_timeout() => {
                self.context.bus.emit(Event::TimeoutError, data);
            }
            NavigationError::Request(_) => {
                self.context.bus.emit(Event::RequestError, data);
            }
            _ => {}
        }

        tracing::warn!(url = %target, %error, "navigation failed");
        if self.context.config.force_on_error {
            self.window.hard_navigate(target);
        }
        error
    }
}
