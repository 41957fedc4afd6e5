//! Property-based tests for core invariants.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs and operation sequences.

use std::sync::Arc;

use proptest::prelude::*;
use url::Url;

use softnav::cache::{CacheOptions, MarkerParser, Page, PageCache};
use softnav::core::config::NavigationConfig;
use softnav::core::types::{Direction, NavigationState, ScrollPosition};
use softnav::core::urls::{cache_key, same_document};
use softnav::fetch::mock::MockFetcher;
use softnav::history::{HistoryMode, HistoryStore};
use softnav::host::memory::MemoryWindow;
use softnav::router::PathPattern;

/// Operations that can be applied to a history store.
#[derive(Debug, Clone)]
enum HistoryOp {
    Push(u8),
    Replace(u8),
    Remove(Option<usize>),
    TruncateForward,
    SetPointer(usize),
    ReplaceAll(u8),
}

fn history_op() -> impl Strategy<Value = HistoryOp> {
    prop_oneof![
        3 => any::<u8>().prop_map(HistoryOp::Push),
        1 => any::<u8>().prop_map(HistoryOp::Replace),
        2 => prop::option::of(0usize..12).prop_map(HistoryOp::Remove),
        1 => Just(HistoryOp::TruncateForward),
        2 => (0usize..12).prop_map(HistoryOp::SetPointer),
        1 => (0u8..6).prop_map(HistoryOp::ReplaceAll),
    ]
}

fn state(n: u8) -> NavigationState {
    NavigationState::new(
        format!("https://example.com/p{}", n),
        "default",
        ScrollPosition::ORIGIN,
    )
}

fn store() -> HistoryStore {
    let window = Arc::new(MemoryWindow::new(
        Url::parse("https://example.com/").unwrap(),
    ));
    let mut store = HistoryStore::new(window);
    store.init(state(0));
    store
}

/// Strategy for path segments.
fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,8}"
}

proptest! {
    /// The pointer always addresses an existing entry, or is 0 when empty.
    #[test]
    fn history_pointer_stays_valid(ops in prop::collection::vec(history_op(), 1..60)) {
        let mut store = store();
        for op in ops {
            match op {
                HistoryOp::Push(n) => {
                    store.add(state(n), HistoryMode::Push);
                }
                HistoryOp::Replace(n) => {
                    store.add(state(n), HistoryMode::Replace);
                }
                HistoryOp::Remove(index) => {
                    store.remove(index);
                }
                HistoryOp::TruncateForward => {
                    store.truncate_forward();
                    prop_assert_eq!(store.len(), if store.is_empty() { 0 } else { store.pointer() + 1 });
                }
                HistoryOp::SetPointer(index) => store.set_pointer(index),
                HistoryOp::ReplaceAll(count) => {
                    store.replace((0..count).map(state).collect());
                }
            }

            if store.is_empty() {
                prop_assert_eq!(store.pointer(), 0);
                prop_assert!(store.current().is_none());
            } else {
                prop_assert!(store.pointer() < store.len());
                prop_assert!(store.current().is_some());
            }
        }
    }

    /// Consecutive adds get consecutive indexes and the pointer follows.
    #[test]
    fn history_add_assigns_positions(count in 1usize..20) {
        let mut store = store();
        for n in 0..count {
            let added = store.add(state(n as u8), HistoryMode::Push).index;
            prop_assert_eq!(added, n + 1);
            prop_assert_eq!(store.pointer(), n + 1);
        }
        let indexes: Vec<usize> = store.states().iter().map(|s| s.index).collect();
        prop_assert_eq!(indexes, (0..=count).collect::<Vec<_>>());
    }

    /// The cache never holds more than `max_pages` pages.
    #[test]
    fn cache_respects_max_pages(
        max_pages in 1usize..6,
        current in 0u8..10,
        keys in prop::collection::vec(0u8..10, 1..40),
    ) {
        let config = NavigationConfig { max_pages, ..Default::default() };
        let filters = config.filters().unwrap();
        let parser = Arc::new(MarkerParser::new(&config.wrapper_attr).unwrap());
        let window = Arc::new(MemoryWindow::new(
            Url::parse(&format!("https://example.com/p{}", current)).unwrap(),
        ));
        let cache = PageCache::new(
            CacheOptions::from_config(&config, &filters),
            Arc::new(MockFetcher::new()),
            parser.clone(),
            window,
        );

        for k in keys {
            let url = Url::parse(&format!("https://example.com/p{}", k)).unwrap();
            let key = cache_key(&url);
            cache.insert(Arc::new(Page::new(url, key, String::new(), parser.clone())));
            prop_assert!(cache.len() <= max_pages);
        }
    }

    /// Direction classification for single steps and no-ops.
    #[test]
    fn direction_single_steps(index in 0usize..1000) {
        prop_assert_eq!(Direction::infer(index, index), Direction::Popstate);
        prop_assert_eq!(Direction::infer(index + 1, index), Direction::Back);
        prop_assert_eq!(Direction::infer(index, index + 1), Direction::Forward);
    }

    /// Fragments never change the cache key or document identity.
    #[test]
    fn fragment_is_not_part_of_identity(path in segment(), fragment in segment()) {
        let plain = Url::parse(&format!("https://example.com/{}", path)).unwrap();
        let with_fragment = Url::parse(&format!("https://example.com/{}#{}", path, fragment)).unwrap();
        prop_assert_eq!(cache_key(&plain), cache_key(&with_fragment));
        prop_assert!(same_document(&plain, &with_fragment));
    }

    /// A parameter pattern captures whatever concrete segment it is given.
    #[test]
    fn param_patterns_capture_segments(section in segment(), id in segment()) {
        let pattern = PathPattern::parse("/:section/items/:id").unwrap();
        let params = pattern.matches(&format!("/{}/items/{}", section, id)).unwrap();
        prop_assert_eq!(&params["section"], &section);
        prop_assert_eq!(&params["id"], &id);
    }
}
