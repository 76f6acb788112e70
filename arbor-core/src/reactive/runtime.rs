//! Reactive Runtime
//!
//! The runtime connects the state tree to the derived values computed from
//! it. It keeps a registry of live derived values and the state paths each
//! one read, and marks the affected ones dirty when a path changes.
//!
//! # How It Works
//!
//! 1. A derived value registers with the runtime and receives a handle.
//!
//! 2. After each recomputation the derived value reports the paths it read
//!    (collected through [`ReactiveContext`](super::ReactiveContext)).
//!
//! 3. When the state tree writes a path, the runtime finds every
//!    subscriber whose reads overlap that path and marks it dirty. Derived
//!    values are lazy: they recompute on their next access.
//!
//! Each store owns its own runtime, so stores never invalidate each
//! other's caches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::subscriber::{Dependencies, SubscriberId};
use super::StatePath;

/// A trait for values that are invalidated when their dependencies change.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Mark this reactive value as needing recomputation.
    fn mark_dirty(&self);
}

/// Handle to a registered reactive value.
///
/// Dropping this handle unregisters the reactive value from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
    runtime: Weak<Runtime>,
}

impl ReactiveHandle {
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.unregister(self.subscriber_id);
        }
    }
}

/// The dependency runtime for one reactive state tree.
#[derive(Default)]
pub struct Runtime {
    /// Live reactive values, held weakly so the runtime never keeps a
    /// dropped getter alive.
    registry: RwLock<HashMap<SubscriberId, Weak<dyn Reactive>>>,
    /// State paths each subscriber read during its last computation.
    dependencies: RwLock<HashMap<SubscriberId, Dependencies>>,
    /// Bumped on every change notification.
    writes: AtomicU64,
}

impl Runtime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a reactive value with the runtime.
    ///
    /// Returns a handle that unregisters the value when dropped.
    pub fn register(self: &Arc<Self>, reactive: Arc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();
        self.registry.write().insert(id, Arc::downgrade(&reactive));

        ReactiveHandle {
            subscriber_id: id,
            runtime: Arc::downgrade(self),
        }
    }

    fn unregister(&self, id: SubscriberId) {
        self.registry.write().remove(&id);
        self.dependencies.write().remove(&id);
    }

    /// Replace the recorded reads of a subscriber.
    pub fn set_dependencies<I>(&self, subscriber_id: SubscriberId, paths: I)
    where
        I: IntoIterator<Item = StatePath>,
    {
        self.dependencies
            .write()
            .insert(subscriber_id, Dependencies::from_paths(paths));
    }

    /// Forget every read of a subscriber.
    ///
    /// Called before re-running a computation to clear stale dependencies.
    pub fn clear_dependencies(&self, subscriber_id: SubscriberId) {
        self.dependencies.write().remove(&subscriber_id);
    }

    /// Mark every subscriber that read an overlapping path as dirty.
    ///
    /// Returns how many subscribers were invalidated.
    pub fn notify_change(&self, changed: &[String]) -> usize {
        // Bump before looking at dependencies: a computation that records
        // its reads after this point sees the new count instead.
        self.writes.fetch_add(1, Ordering::SeqCst);

        let affected: Vec<SubscriberId> = {
            let dependencies = self.dependencies.read();
            dependencies
                .iter()
                .filter(|(_, deps)| deps.overlaps(changed))
                .map(|(id, _)| *id)
                .collect()
        };

        if affected.is_empty() {
            return 0;
        }

        let reactives: Vec<Arc<dyn Reactive>> = {
            let registry = self.registry.read();
            affected
                .iter()
                .filter_map(|id| registry.get(id).and_then(Weak::upgrade))
                .collect()
        };

        for reactive in &reactives {
            reactive.mark_dirty();
        }

        reactives.len()
    }

    /// Count of change notifications so far.
    ///
    /// A computation compares the count from before it ran with the count
    /// after its reads are recorded; a difference means a write may have
    /// slipped past unseen.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of live registered reactive values.
    pub fn registered_count(&self) -> usize {
        self.registry.read().len()
    }
}
