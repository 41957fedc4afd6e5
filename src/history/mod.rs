//! history
//!
//! Navigation State Store.
//!
//! # Design
//!
//! The store is a pointer-addressed sequence of [`NavigationState`]s that
//! mirrors itself into the browser's native history stack. Every native entry
//! receives the full state list (see [`HistoryPayload`]), so a popstate event
//! carries everything needed to rebuild the store.
//!
//! # Invariants
//!
//! - `0 <= pointer < states.len()` whenever `states` is non-empty
//! - after [`HistoryStore::add`], [`HistoryStore::current`] is the added state
//! - a state's `index` is assigned exactly once, on insertion
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use softnav::core::types::{NavigationState, ScrollPosition};
//! use softnav::history::{HistoryMode, HistoryStore};
//! use softnav::host::memory::MemoryWindow;
//! use url::Url;
//!
//! let native = Arc::new(MemoryWindow::new(Url::parse("https://example.com/a").unwrap()));
//! let mut history = HistoryStore::new(native);
//! history.init(NavigationState::new("https://example.com/a", "default", ScrollPosition::ORIGIN));
//! history.add(NavigationState::new("https://example.com/b", "fade", ScrollPosition::ORIGIN), HistoryMode::Push);
//! assert_eq!(history.pointer(), 1);
//! assert_eq!(history.previous().map(|s| s.url.as_str()), Some("https://example.com/a"));
//! ```

use std::sync::Arc;

use crate::core::types::{HistoryPayload, NavigationState};
use crate::host::NativeHistory;

/// How a new state is mirrored into native history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    Replace,
}

/// Session history for one controller.
pub struct HistoryStore {
    states: Vec<NavigationState>,
    pointer: usize,
    native: Arc<dyn NativeHistory>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("states", &self.states.len())
            .field("pointer", &self.pointer)
            .finish()
    }
}

impl HistoryStore {
    pub fn new(native: Arc<dyn NativeHistory>) -> Self {
        Self {
            states: Vec::new(),
            pointer: 0,
            native,
        }
    }

    /// Seed the store with the page the session started on.
    ///
    /// The native entry is replaced rather than pushed, so going back past
    /// the start of the session leaves the site instead of replaying it.
    pub fn init(&mut self, initial: NavigationState) {
        self.states.clear();
        self.pointer = 0;
        self.add(initial, HistoryMode::Replace);
    }

    /// Append a state, point at it, and mirror it natively.
    pub fn add(&mut self, mut state: NavigationState, mode: HistoryMode) -> &NavigationState {
        let index = self.states.len();
        state.index = index;
        self.states.push(state);
        self.pointer = index;

        let payload = self.payload();
        let url = self.states[index].url.clone();
        match mode {
            HistoryMode::Push => self.native.push_state(&payload, &url),
            HistoryMode::Replace => self.native.replace_state(&payload, &url),
        }
        tracing::debug!(url = %url, index, ?mode, "history entry added");

        &self.states[index]
    }

    /// Remove the entry at `index` (default: the last one).
    ///
    /// The pointer moves down when the removed entry was at or before it and
    /// is clamped to the remaining range, so it never dangles.
    pub fn remove(&mut self, index: Option<usize>) -> Option<NavigationState> {
        if self.states.is_empty() {
            return None;
        }
        let index = index.unwrap_or(self.states.len() - 1);
        if index >= self.states.len() {
            return None;
        }

        let removed = self.states.remove(index);
        if index <= self.pointer {
            self.pointer = self.pointer.saturating_sub(1);
        }
        if !self.states.is_empty() && self.pointer >= self.states.len() {
            self.pointer = self.states.len() - 1;
        }
        if self.states.is_empty() {
            self.pointer = 0;
        }
        Some(removed)
    }

    /// Undo the most recent push.
    ///
    /// Native history cannot drop an entry, so the entry that was pushed is
    /// rewritten to point back at the state that is current again.
    pub fn retract(&mut self) -> Option<NavigationState> {
        let removed = self.remove(None)?;
        if let Some(url) = self.current().map(|s| s.url.clone()) {
            let payload = self.payload();
            self.native.replace_state(&payload, &url);
            tracing::debug!(url = %url, removed = %removed.url, "history entry retracted");
        }
        Some(removed)
    }

    /// Drop every entry after the pointer.
    pub fn truncate_forward(&mut self) -> usize {
        let mut dropped = 0;
        while self.states.len() > self.pointer + 1 {
            self.remove(None);
            dropped += 1;
        }
        dropped
    }

    /// Replace the whole list. The pointer is left for the caller to set.
    pub fn replace(&mut self, states: Vec<NavigationState>) {
        self.states = states;
        if self.states.is_empty() {
            self.pointer = 0;
        } else if self.pointer >= self.states.len() {
            self.pointer = self.states.len() - 1;
        }
    }

    /// Point at an existing entry. Out-of-range indexes are clamped.
    pub fn set_pointer(&mut self, index: usize) {
        self.pointer = if self.states.is_empty() {
            0
        } else {
            index.min(self.states.len() - 1)
        };
    }

    pub fn get(&self, index: usize) -> Option<&NavigationState> {
        self.states.get(index)
    }

    pub fn current(&self) -> Option<&NavigationState> {
        self.states.get(self.pointer)
    }

    pub fn last(&self) -> Option<&NavigationState> {
        self.states.last()
    }

    /// The entry before the pointer; `None` at the start of the session.
    pub fn previous(&self) -> Option<&NavigationState> {
        if self.pointer < 1 {
            None
        } else {
            self.states.get(self.pointer - 1)
        }
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[NavigationState] {
        &self.states
    }

    /// What native history stores for the current entry.
    pub fn payload(&self) -> HistoryPayload {
        HistoryPayload {
            index: self.pointer,
            states: self.states.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.pointer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ScrollPosition;
    use crate::host::memory::{MemoryWindow, NativeCall};
    use crate::host::Window;
    use url::Url;

    fn state(path: &str) -> NavigationState {
        NavigationState::new(
            format!("https://example.com{}", path),
            "default",
            ScrollPosition::ORIGIN,
        )
    }

    fn store() -> (Arc<MemoryWindow>, HistoryStore) {
        let native = Arc::new(MemoryWindow::new(
            Url::parse("https://example.com/a").unwrap(),
        ));
        let mut history = HistoryStore::new(native.clone());
        history.init(state("/a"));
        (native, history)
    }

    mod init {
        use super::*;

        #[test]
        fn seeds_single_entry_with_replace() {
            let (native, history) = store();
            assert_eq!(history.len(), 1);
            assert_eq!(history.pointer(), 0);
            assert!(history.previous().is_none());

            let calls = native.calls();
            assert_eq!(calls.len(), 1);
            assert!(matches!(calls[0], NativeCall::Replace { .. }));
        }
    }

    mod add {
        use super::*;

        #[test]
        fn assigns_index_and_moves_pointer() {
            let (_, mut history) = store();
            let added = history.add(state("/b"), HistoryMode::Push).clone();

            assert_eq!(added.index, 1);
            assert_eq!(history.pointer(), 1);
            assert_eq!(history.current(), Some(&added));
            assert_eq!(history.previous().unwrap().url, "https://example.com/a");
        }

        #[test]
        fn mirrors_full_list_natively() {
            let (native, mut history) = store();
            history.add(state("/b"), HistoryMode::Push);

            let calls = native.calls();
            match &calls[1] {
                NativeCall::Push { payload, url } => {
                    assert_eq!(url, "https://example.com/b");
                    assert_eq!(payload.index, 1);
                    assert_eq!(payload.states.len(), 2);
                }
                other => panic!("expected push, got {:?}", other),
            }
        }

        #[test]
        fn replace_mode_uses_replace_state() {
            let (native, mut history) = store();
            history.add(state("/b"), HistoryMode::Replace);
            assert!(matches!(native.calls()[1], NativeCall::Replace { .. }));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn defaults_to_last_and_decrements_pointer() {
            let (_, mut history) = store();
            history.add(state("/b"), HistoryMode::Push);

            let removed = history.remove(None).unwrap();
            assert_eq!(removed.url, "https://example.com/b");
            assert_eq!(history.pointer(), 0);
            assert_eq!(history.len(), 1);
        }

        #[test]
        fn entries_past_pointer_leave_pointer_alone() {
            let (_, mut history) = store();
            history.add(state("/b"), HistoryMode::Push);
            history.add(state("/c"), HistoryMode::Push);
            history.set_pointer(1);

            assert_eq!(history.truncate_forward(), 1);
            assert_eq!(history.pointer(), 1);
            assert_eq!(history.current().unwrap().url, "https://example.com/b");
        }

        #[test]
        fn retract_rewrites_native_entry() {
            let (native, mut history) = store();
            history.add(state("/b"), HistoryMode::Push);

            let removed = history.retract().unwrap();
            assert_eq!(removed.url, "https://example.com/b");
            assert_eq!(history.len(), 1);
            assert_eq!(history.pointer(), 0);

            match native.calls().last() {
                Some(NativeCall::Replace { payload, url }) => {
                    assert_eq!(url, "https://example.com/a");
                    assert_eq!(payload.index, 0);
                    assert_eq!(payload.states.len(), 1);
                }
                other => panic!("expected replace, got {:?}", other),
            }
            assert_eq!(native.location().as_str(), "https://example.com/a");
        }

        #[test]
        fn out_of_range_is_none() {
            let (_, mut history) = store();
            assert!(history.remove(Some(5)).is_none());
            assert_eq!(history.len(), 1);
        }

        #[test]
        fn removing_everything_resets_pointer() {
            let (_, mut history) = store();
            history.remove(None);
            assert!(history.is_empty());
            assert_eq!(history.pointer(), 0);
            assert!(history.current().is_none());
            assert!(history.remove(None).is_none());
        }
    }

    mod replace {
        use super::*;

        #[test]
        fn swaps_list_without_touching_pointer() {
            let (_, mut history) = store();
            history.add(state("/b"), HistoryMode::Push);

            let mut states = vec![state("/x"), state("/y"), state("/z")];
            for (i, s) in states.iter_mut().enumerate() {
                s.index = i;
            }
            history.replace(states);

            assert_eq!(history.pointer(), 1);
            assert_eq!(history.current().unwrap().url, "https://example.com/y");
        }

        #[test]
        fn set_pointer_clamps() {
            let (_, mut history) = store();
            history.set_pointer(10);
            assert_eq!(history.pointer(), 0);
        }
    }

    #[test]
    fn accessors() {
        let (_, mut history) = store();
        history.add(state("/b"), HistoryMode::Push);
        history.add(state("/c"), HistoryMode::Push);

        assert_eq!(history.get(0).unwrap().url, "https://example.com/a");
        assert_eq!(history.last().unwrap().index, 2);
        assert_eq!(history.payload().index, 2);

        history.clear();
        assert!(history.is_empty());
    }
}
