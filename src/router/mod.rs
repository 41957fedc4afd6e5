//! router
//!
//! Optional route callbacks on completed navigations.
//!
//! The router never drives navigation. It listens for `NAVIGATION_END` on
//! the bus and runs every route whose `from`/`to` patterns match the paths
//! of the navigation that just finished. A missing side matches anything.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use softnav::events::EventBus;
//! use softnav::router::Router;
//!
//! let bus = Arc::new(EventBus::new());
//! let router = Router::attach(Arc::clone(&bus));
//! router
//!     .on(None, Some("/blog/:slug"), |m| {
//!         println!("entered post {}", m.to["slug"]);
//!     })
//!     .unwrap();
//! ```

pub mod pattern;

pub use pattern::{Params, PathPattern, PatternError};

use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::core::types::Trigger;
use crate::events::{Event, EventBus, EventData, ListenerId};

/// What a route callback receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub from_path: String,
    pub to_path: String,
    /// Parameters captured by the `from` pattern.
    pub from: Params,
    /// Parameters captured by the `to` pattern.
    pub to: Params,
    pub trigger: Trigger,
}

type RouteCallback = Arc<dyn Fn(&RouteMatch) + Send + Sync>;

struct Route {
    from: Option<PathPattern>,
    to: Option<PathPattern>,
    callback: RouteCallback,
}

impl Route {
    fn matches(&self, from: &str, to: &str) -> Option<(Params, Params)> {
        let side = |pattern: &Option<PathPattern>, path: &str| match pattern {
            Some(pattern) => pattern.matches(path),
            None => Some(Params::new()),
        };
        Some((side(&self.from, from)?, side(&self.to, to)?))
    }
}

/// Path-pattern router bound to an [`EventBus`].
pub struct Router {
    bus: Arc<EventBus>,
    routes: Arc<RwLock<Vec<Route>>>,
    listener: ListenerId,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.len())
            .field("listener", &self.listener)
            .finish()
    }
}

impl Router {
    /// Subscribe a new router to `bus`.
    pub fn attach(bus: Arc<EventBus>) -> Self {
        let routes: Arc<RwLock<Vec<Route>>> = Arc::new(RwLock::new(Vec::new()));
        let table = Arc::clone(&routes);
        let listener = bus.on(&[Event::NavigationEnd], move |_, data| {
            dispatch(&table, data);
        });
        Self {
            bus,
            routes,
            listener,
        }
    }

    /// Register `callback` for navigations from a path matching `from` to a
    /// path matching `to`.
    ///
    /// # Errors
    ///
    /// Returns the parse error of an invalid pattern; nothing is registered.
    pub fn on<F>(&self, from: Option<&str>, to: Option<&str>, callback: F) -> Result<(), PatternError>
    where
        F: Fn(&RouteMatch) + Send + Sync + 'static,
    {
        let from = from.map(PathPattern::parse).transpose()?;
        let to = to.map(PathPattern::parse).transpose()?;
        tracing::debug!(
            from = from.as_ref().map(PathPattern::as_str).unwrap_or("*"),
            to = to.as_ref().map(PathPattern::as_str).unwrap_or("*"),
            "route registered"
        );
        self.routes.write().push(Route {
            from,
            to,
            callback: Arc::new(callback),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Unsubscribe from the bus. Registered routes stop firing.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.bus.off(self.listener);
    }
}

fn dispatch(routes: &RwLock<Vec<Route>>, data: &EventData) {
    let EventData::Navigation { from, to, trigger } = data else {
        return;
    };
    let from_path = path_of(from);
    let to_path = path_of(to);

    // Callbacks run outside the lock so they may register further routes.
    let matched: Vec<(RouteCallback, Params, Params)> = routes
        .read()
        .iter()
        .filter_map(|route| {
            route
                .matches(&from_path, &to_path)
                .map(|(f, t)| (Arc::clone(&route.callback), f, t))
        })
        .collect();

    for (callback, from, to) in matched {
        callback(&RouteMatch {
            from_path: from_path.clone(),
            to_path: to_path.clone(),
            from,
            to,
            trigger: trigger.clone(),
        });
    }
}

/// The path of an absolute URL, or the input itself if it is already a path.
fn path_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(url) => url.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn navigation(from: &str, to: &str) -> EventData {
        EventData::Navigation {
            from: format!("https://example.com{}", from),
            to: format!("https://example.com{}", to),
            trigger: Trigger::Programmatic,
        }
    }

    fn collecting(router: &Router, from: Option<&str>, to: Option<&str>) -> Arc<Mutex<Vec<RouteMatch>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        router
            .on(from, to, move |m| sink.lock().push(m.clone()))
            .unwrap();
        seen
    }

    #[test]
    fn matches_both_sides_and_captures() {
        let bus = Arc::new(EventBus::new());
        let router = Router::attach(Arc::clone(&bus));
        let seen = collecting(&router, Some("/"), Some("/blog/:slug"));

        bus.emit(Event::NavigationEnd, navigation("/", "/blog/hello?ref=home"));
        bus.emit(Event::NavigationEnd, navigation("/about", "/blog/other"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].to["slug"], "hello");
        assert_eq!(seen[0].to_path, "/blog/hello");
    }

    #[test]
    fn missing_side_matches_anything() {
        let bus = Arc::new(EventBus::new());
        let router = Router::attach(Arc::clone(&bus));
        let seen = collecting(&router, None, Some("/contact"));

        bus.emit(Event::NavigationEnd, navigation("/a", "/contact"));
        bus.emit(Event::NavigationEnd, navigation("/b/c", "/contact"));
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn only_navigation_end_is_observed() {
        let bus = Arc::new(EventBus::new());
        let router = Router::attach(Arc::clone(&bus));
        let seen = collecting(&router, None, None);

        bus.emit(Event::NavigationStart, navigation("/a", "/b"));
        bus.emit(Event::TransitionEnd, EventData::None);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn invalid_pattern_registers_nothing() {
        let bus = Arc::new(EventBus::new());
        let router = Router::attach(bus);
        assert!(router.on(Some("relative"), None, |_| {}).is_err());
        assert!(router.is_empty());
    }

    #[test]
    fn callbacks_may_register_routes() {
        let bus = Arc::new(EventBus::new());
        let router = Arc::new(Router::attach(Arc::clone(&bus)));
        let inner = Arc::clone(&router);
        router
            .on(None, None, move |_| {
                let _ = inner.on(None, Some("/later"), |_| {});
            })
            .unwrap();

        bus.emit(Event::NavigationEnd, navigation("/a", "/b"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn detach_unsubscribes() {
        let bus = Arc::new(EventBus::new());
        let router = Router::attach(Arc::clone(&bus));
        assert_eq!(bus.listener_count(Event::NavigationEnd), 1);
        router.detach();
        assert_eq!(bus.listener_count(Event::NavigationEnd), 0);
    }

    #[test]
    fn path_of_handles_absolute_and_relative() {
        assert_eq!(path_of("https://example.com/a/b?x#y"), "/a/b");
        assert_eq!(path_of("/a/b?x#y"), "/a/b");
    }
}
