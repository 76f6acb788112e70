//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when a state
//! path it read has changed.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation inside a
//!    [`ReactiveContext`] and caches the result. The paths read during the
//!    run are reported to the [`Runtime`].
//!
//! 2. When accessed again, if the memo is still clean, the cached value is
//!    returned without running the computation.
//!
//! 3. When the runtime sees a write to an overlapping path, it marks the
//!    memo dirty. The next access recomputes.
//!
//! Memos that are never read again stay dirty and cost nothing.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use super::subscriber::SubscriberId;

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// The memo needs to recompute on next access.
    Dirty,
}

struct MemoInner<T> {
    subscriber_id: SubscriberId,
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    value: RwLock<Option<T>>,
    state: RwLock<MemoState>,
    computations: AtomicUsize,
}

impl<T> Reactive for MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_dirty(&self) {
        *self.state.write() = MemoState::Dirty;
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// Clones share the cache. The memo stays registered with its runtime
/// until the last clone is dropped.
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<MemoInner<T>>,
    runtime: Arc<Runtime>,
    _handle: Arc<ReactiveHandle>,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(runtime: &Arc<Runtime>, compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_arc(runtime, Arc::new(compute))
    }

    pub(crate) fn from_arc(runtime: &Arc<Runtime>, compute: Arc<dyn Fn() -> T + Send + Sync>) -> Self {
        let inner = Arc::new(MemoInner {
            subscriber_id: SubscriberId::new(),
            compute,
            value: RwLock::new(None),
            state: RwLock::new(MemoState::Dirty),
            computations: AtomicUsize::new(0),
        });
        let handle = runtime.register(inner.clone());

        Self {
            inner,
            runtime: Arc::clone(runtime),
            _handle: Arc::new(handle),
        }
    }

    /// Get the subscriber ID for this memo.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        if self.state() == MemoState::Clean {
            if let Some(value) = self.inner.value.read().as_ref() {
                return value.clone();
            }
        }
        self.recompute()
    }

    /// Mark the memo as needing recomputation.
    pub fn mark_dirty(&self) {
        self.inner.mark_dirty();
    }

    fn recompute(&self) -> T {
        let id = self.inner.subscriber_id;
        self.runtime.clear_dependencies(id);

        *self.inner.state.write() = MemoState::Clean;
        let writes_before = self.runtime.write_count();

        let (value, reads) = {
            let _ctx = ReactiveContext::enter(id);
            let value = (self.inner.compute)();
            (value, ReactiveContext::reads())
        };

        self.runtime.set_dependencies(id, reads);
        *self.inner.value.write() = Some(value.clone());
        self.inner.computations.fetch_add(1, Ordering::SeqCst);

        // No dependencies were recorded while the computation ran, so a
        // write in that window reached nobody. Recompute next time.
        if self.runtime.write_count() != writes_before {
            self.inner.mark_dirty();
        }

        value
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        *self.inner.state.read()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }

    /// How many times the computation has run.
    pub fn computations(&self) -> usize {
        self.inner.computations.load(Ordering::SeqCst)
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            runtime: Arc::clone(&self.runtime),
            _handle: Arc::clone(&self._handle),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("subscriber_id", &self.inner.subscriber_id)
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .field("computations", &self.computations())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
