//! events
//!
//! Named-event publish/subscribe shared by every component.
//!
//! # Design
//!
//! The [`EventBus`] maps an [`Event`] to an ordered list of listeners.
//! Registration returns a [`ListenerId`] that the registering party keeps and
//! later hands to [`EventBus::off`]; the bus never reaches back into its
//! subscribers.
//!
//! - `on` registers one callback for several events under a single id
//! - `once` removes the whole registration after its first delivery
//! - listeners run synchronously, in registration order, outside the bus lock,
//!   so a listener may register or remove listeners while being called
//!
//! # Example
//!
//! ```
//! use softnav::events::{Event, EventBus, EventData};
//!
//! let bus = EventBus::new();
//! let id = bus.on(&[Event::NavigationStart, Event::NavigationEnd], |event, _| {
//!     println!("{}", event);
//! });
//! bus.emit(Event::NavigationStart, EventData::None);
//! assert!(bus.off(id));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::types::{Direction, NavigationState, Trigger};

/// Lifecycle events announced on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Ready,
    Resize,
    Scroll,
    AnchorClick,
    Click,
    AnchorHover,
    Hover,
    Prefetch,
    Popstate,
    PopstateBack,
    PopstateForward,
    HistoryNewItem,
    Go,
    NavigationStart,
    PageLoading,
    PageLoadComplete,
    TransitionStart,
    BeforeTransitionOut,
    AfterTransitionOut,
    ContentInsert,
    ContentReplaced,
    BeforeTransitionIn,
    AfterTransitionIn,
    TransitionEnd,
    NavigationEnd,
    RequestError,
    TimeoutError,
}

impl Event {
    pub const ALL: [Event; 27] = [
        Event::Ready,
        Event::Resize,
        Event::Scroll,
        Event::AnchorClick,
        Event::Click,
        Event::AnchorHover,
        Event::Hover,
        Event::Prefetch,
        Event::Popstate,
        Event::PopstateBack,
        Event::PopstateForward,
        Event::HistoryNewItem,
        Event::Go,
        Event::NavigationStart,
        Event::PageLoading,
        Event::PageLoadComplete,
        Event::TransitionStart,
        Event::BeforeTransitionOut,
        Event::AfterTransitionOut,
        Event::ContentInsert,
        Event::ContentReplaced,
        Event::BeforeTransitionIn,
        Event::AfterTransitionIn,
        Event::TransitionEnd,
        Event::NavigationEnd,
        Event::RequestError,
        Event::TimeoutError,
    ];

    /// The six boundaries of a transition, in emission order.
    pub const TRANSITION_LIFECYCLE: [Event; 6] = [
        Event::BeforeTransitionOut,
        Event::AfterTransitionOut,
        Event::ContentInsert,
        Event::ContentReplaced,
        Event::BeforeTransitionIn,
        Event::AfterTransitionIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Ready => "READY",
            Event::Resize => "RESIZE",
            Event::Scroll => "SCROLL",
            Event::AnchorClick => "ANCHOR_CLICK",
            Event::Click => "CLICK",
            Event::AnchorHover => "ANCHOR_HOVER",
            Event::Hover => "HOVER",
            Event::Prefetch => "PREFETCH",
            Event::Popstate => "POPSTATE",
            Event::PopstateBack => "POPSTATE_BACK",
            Event::PopstateForward => "POPSTATE_FORWARD",
            Event::HistoryNewItem => "HISTORY_NEW_ITEM",
            Event::Go => "GO",
            Event::NavigationStart => "NAVIGATION_START",
            Event::PageLoading => "PAGE_LOADING",
            Event::PageLoadComplete => "PAGE_LOAD_COMPLETE",
            Event::TransitionStart => "TRANSITION_START",
            Event::BeforeTransitionOut => "BEFORE_TRANSITION_OUT",
            Event::AfterTransitionOut => "AFTER_TRANSITION_OUT",
            Event::ContentInsert => "CONTENT_INSERT",
            Event::ContentReplaced => "CONTENT_REPLACED",
            Event::BeforeTransitionIn => "BEFORE_TRANSITION_IN",
            Event::AfterTransitionIn => "AFTER_TRANSITION_IN",
            Event::TransitionEnd => "TRANSITION_END",
            Event::NavigationEnd => "NAVIGATION_END",
            Event::RequestError => "REQUEST_ERROR",
            Event::TimeoutError => "TIMEOUT_ERROR",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload delivered with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    None,
    /// Link interactions and prefetches.
    Link { href: String },
    /// Navigation-level boundaries.
    Navigation {
        from: String,
        to: String,
        trigger: Trigger,
    },
    /// A state was committed to history.
    History { state: NavigationState },
    /// A native history entry was replayed.
    Popstate { direction: Direction, index: usize },
    /// Transition-level boundaries.
    Transition {
        name: String,
        from: String,
        to: String,
        trigger: Trigger,
    },
    /// A fetch failed or timed out.
    Error { url: String, message: String },
}

/// Handle returned by registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(Event, &EventData) + Send + Sync>;

struct Registration {
    id: ListenerId,
    events: Vec<Event>,
    once: bool,
    callback: Callback,
}

struct Inner {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Named-event publish/subscribe.
pub struct EventBus {
    inner: Mutex<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                registrations: Vec::new(),
            }),
        }
    }

    /// Register `callback` for every event in `events`.
    pub fn on<F>(&self, events: &[Event], callback: F) -> ListenerId
    where
        F: Fn(Event, &EventData) + Send + Sync + 'static,
    {
        self.register(events, false, Arc::new(callback))
    }

    /// Register `callback` for the first of `events` to be emitted.
    pub fn once<F>(&self, events: &[Event], callback: F) -> ListenerId
    where
        F: Fn(Event, &EventData) + Send + Sync + 'static,
    {
        self.register(events, true, Arc::new(callback))
    }

    fn register(&self, events: &[Event], once: bool, callback: Callback) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.registrations.push(Registration {
            id,
            events: events.to_vec(),
            once,
            callback,
        });
        id
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.registrations.len();
        inner.registrations.retain(|r| r.id != id);
        inner.registrations.len() != before
    }

    /// Remove every listener of one event. Multi-event registrations keep
    /// their other events.
    pub fn off_event(&self, event: Event) {
        let mut inner = self.inner.lock();
        for registration in inner.registrations.iter_mut() {
            registration.events.retain(|e| *e != event);
        }
        inner.registrations.retain(|r| !r.events.is_empty());
    }

    /// Deliver `event` to its listeners.
    pub fn emit(&self, event: Event, data: EventData) {
        let callbacks: Vec<Callback> = {
            let mut inner = self.inner.lock();
            let mut selected = Vec::new();
            let mut spent = Vec::new();
            for registration in inner.registrations.iter() {
                if registration.events.contains(&event) {
                    selected.push(Arc::clone(&registration.callback));
                    if registration.once {
                        spent.push(registration.id);
                    }
                }
            }
            if !spent.is_empty() {
                inner.registrations.retain(|r| !spent.contains(&r.id));
            }
            selected
        };

        tracing::trace!(event = %event, listeners = callbacks.len(), "emit");
        for callback in callbacks {
            callback(event, &data);
        }
    }

    /// Number of live listeners for an event.
    pub fn listener_count(&self, event: Event) -> usize {
        self.inner
            .lock()
            .registrations
            .iter()
            .filter(|r| r.events.contains(&event))
            .count()
    }

    /// Record every emission of `events` until the recording is stopped.
    pub fn record(self: &Arc<Self>, events: &[Event]) -> Recording {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let id = self.on(events, move |event, data| {
            sink.lock().push((event, data.clone()));
        });
        Recording {
            bus: Arc::clone(self),
            id,
            log,
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EventBus")
            .field("listeners", &inner.registrations.len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Captured stream of events; see [`EventBus::record`].
pub struct Recording {
    bus: Arc<EventBus>,
    id: ListenerId,
    log: Arc<Mutex<Vec<(Event, EventData)>>>,
}

impl Recording {
    /// Events seen so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.log.lock().iter().map(|(e, _)| *e).collect()
    }

    /// Events with their payloads.
    pub fn entries(&self) -> Vec<(Event, EventData)> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// Unregister from the bus and return everything captured.
    pub fn stop(self) -> Vec<(Event, EventData)> {
        self.bus.off(self.id);
        let entries = self.log.lock().clone();
        entries
    }
}
