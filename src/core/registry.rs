//! core::registry
//!
//! Ordered key → value container.
//!
//! # Design
//!
//! [`Registry`] is the substrate for the page cache and the transition table.
//! Iteration follows insertion order, and replacing the value of an existing
//! key keeps that key's position. Removal preserves the relative order of the
//! remaining keys, so "first key" and "second key" stay meaningful for the
//! cache's neighbor eviction.

use indexmap::IndexMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Insertion-ordered map.
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> Registry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Insert or replace. Returns the previous value for the key, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Remove a key, keeping the order of the others.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.shift_remove(key)
    }

    /// Key at a position in insertion order.
    pub fn key_at(&self, position: usize) -> Option<&K> {
        self.entries.get_index(position).map(|(k, _)| k)
    }

    /// Position of a key in insertion order.
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get_index_of(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, handing each value to `f` first.
    pub fn drain_with(&mut self, mut f: impl FnMut(K, V)) {
        for (k, v) in self.entries.drain(..) {
            f(k, v);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Hash + Eq, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
