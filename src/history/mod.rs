//! Ordered operation histories.
//!
//! The proxy keeps two of these per instance: the resolver history (every
//! chain-advancing operation result, seeded with the `"base"` construction
//! value) and the relation history (relation-traversal results only, kept
//! separate so relation chains do not pollute the main chain).

use crate::core::Entity;

/// Resolver keys registered by the pagination variants. Once any of them is
/// present, abstract resolution keeps dereferencing through the paginated
/// view instead of falling back to a later non-pagination entry.
pub const PAGINATION_KEYS: [&str; 3] = ["paginate", "simple_paginate", "cursor_paginate"];

/// Synthetic resolver key for the value the proxy was constructed with.
pub const BASE_KEY: &str = "base";

/// Append-only, insertion-ordered log of `(operation, produced value)`
/// pairs. Keys may repeat; keyed lookup takes the last write, while
/// insertion order decides the "last resolver".
#[derive(Clone, Default)]
pub struct History {
    entries: Vec<(String, Entity)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, entity: Entity) {
        self.entries.push((key.into(), entity));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Last write for a key.
    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, e)| e)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Most recently inserted value.
    pub fn last(&self) -> Option<&Entity> {
        self.entries.last().map(|(_, e)| e)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Abstract resolution: pick the history entry that represents the
    /// chain's effective current value.
    ///
    /// Pagination takes precedence: the earliest-inserted pagination key
    /// pins resolution to its (latest) entry, so an aggregate call after
    /// paginating does not silently swap the chain back to a non-paginated
    /// view. Otherwise a known hint key wins, then the last resolver.
    pub fn resolve(&self, hint: Option<&str>) -> Option<&Entity> {
        if self.entries.is_empty() {
            return None;
        }

        if let Some((key, _)) = self
            .entries
            .iter()
            .find(|(k, _)| PAGINATION_KEYS.contains(&k.as_str()))
        {
            return self.get(key);
        }

        if let Some(hint) = hint {
            if let Some(entity) = self.get(hint) {
                return Some(entity);
            }
        }

        self.last()
    }
}
