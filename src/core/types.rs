//! core::types
//!
//! Shared value types for the navigation model.
//!
//! # Types
//!
//! - [`ScrollPosition`] - Viewport scroll offset
//! - [`NavigationState`] - One recorded point in session history
//! - [`HistoryPayload`] - What gets written into every native history entry
//! - [`Direction`] - Classification of a history traversal
//! - [`Trigger`] - What started a navigation
//!
//! # Native History Layout
//!
//! Every native history entry carries the *entire* state list plus the index
//! of the entry itself, so a popstate event can rebuild the session history
//! without any other source:
//!
//! ```json
//! { "index": 1, "states": [ { "url": "...", "index": 0, "transitionName": "default", "data": { "scroll": { "x": 0, "y": 0 } } } ] }
//! ```

use serde::{Deserialize, Serialize};

/// Scroll offset of the viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    /// The top-left corner of the document.
    pub const ORIGIN: ScrollPosition = ScrollPosition { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Free-form data attached to a navigation state.
///
/// `scroll` is always present; anything else an application stores is kept
/// verbatim in `extra` and survives the round trip through native history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateData {
    pub scroll: ScrollPosition,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A recorded snapshot of one point in session history.
///
/// Immutable once recorded, except for `index`, which the history store
/// assigns exactly once on insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub url: String,
    pub index: usize,
    pub transition_name: String,
    pub data: StateData,
}

impl NavigationState {
    /// Create a candidate state. The index is a placeholder until the state
    /// is added to a [`HistoryStore`](crate::history::HistoryStore).
    pub fn new(
        url: impl Into<String>,
        transition_name: impl Into<String>,
        scroll: ScrollPosition,
    ) -> Self {
        Self {
            url: url.into(),
            index: 0,
            transition_name: transition_name.into(),
            data: StateData {
                scroll,
                extra: serde_json::Map::new(),
            },
        }
    }

    /// Recorded scroll offset for this state.
    pub fn scroll(&self) -> ScrollPosition {
        self.data.scroll
    }
}

/// Payload persisted into each native history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPayload {
    /// Index of the entry this payload belongs to.
    pub index: usize,
    /// The full session history at the time the entry was written.
    pub states: Vec<NavigationState>,
}

impl HistoryPayload {
    /// The state this payload points at, if the index is in range.
    pub fn current(&self) -> Option<&NavigationState> {
        self.states.get(self.index)
    }
}

/// Classification of a history traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Back,
    Popstate,
}

impl Direction {
    /// Classify a move from `old_index` to `new_index`.
    ///
    /// With `delta = old_index - new_index`:
    /// - `delta == 0` is `Popstate`
    /// - single steps are `Forward` when `delta < 0` and `Back` when `delta > 0`
    /// - larger jumps are `Forward` when `delta > 0` and `Back` when `delta < 0`
    pub fn infer(old_index: usize, new_index: usize) -> Self {
        let delta = old_index as i64 - new_index as i64;
        match delta {
            0 => Direction::Popstate,
            -1 => Direction::Forward,
            1 => Direction::Back,
            d if d > 0 => Direction::Forward,
            _ => Direction::Back,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Popstate => "popstate",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What started a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A qualifying anchor was activated.
    Link { href: String },
    /// [`Controller::go`](crate::engine::Controller::go) was called directly.
    Programmatic,
    /// The browser replayed a history entry.
    Popstate(Direction),
}

impl Trigger {
    /// True for back/forward/popstate replays, where scroll is restored from
    /// the recorded state instead of being derived from the URL fragment.
    pub fn is_history_traversal(&self) -> bool {
        matches!(self, Trigger::Popstate(_))
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Link { href } => write!(f, "link({})", href),
            Trigger::Programmatic => write!(f, "programmatic"),
            Trigger::Popstate(direction) => write!(f, "popstate({})", direction),
        }
    }
}
