//! Subscriber types for the reactive system.
//!
//! A subscriber is any derived computation that reads state. Each one is
//! identified by a [`SubscriberId`] and owns the set of state paths it read
//! during its last run.

use std::sync::atomic::{AtomicU64, Ordering};

use super::StatePath;

/// Unique identifier for a subscriber.
///
/// Each derived computation gets a unique ID when created. This ID is used
/// to track which state paths it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// The state paths one subscriber read during its last computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    paths: Vec<StatePath>,
}

impl Dependencies {
    /// Build a dependency set, dropping duplicate paths.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = StatePath>,
    {
        let mut deps = Self::default();
        for path in paths {
            deps.insert(path);
        }
        deps
    }

    /// Record a read of `path`.
    pub fn insert(&mut self, path: StatePath) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Whether a change at `changed` can affect anything these paths read.
    ///
    /// A write at `a/c` changes the value observed at `a` (ancestor) and at
    /// `a/c/x` (descendant), but not at the sibling `b`.
    pub fn overlaps(&self, changed: &[String]) -> bool {
        self.paths.iter().any(|read| paths_overlap(read, changed))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// True when one path is a prefix of the other.
pub(crate) fn paths_overlap(a: &[String], b: &[String]) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
