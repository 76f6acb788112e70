//! Reactive state tree.
//!
//! [`Reactivity`] is the capability the store needs from a reactivity
//! engine: a live root value with tracked reads, in-place writes that
//! notify dependents, late attachment of new properties, wholesale
//! replacement, and cached derived values. [`StateTree`] is the default
//! implementation, built on [`Runtime`] and [`Memo`].
//!
//! # Granularity
//!
//! Dependencies are tracked per state path rather than per value. A read
//! of `a` depends on everything below `a`; a write at `a/c` invalidates
//! readers of `a`, `a/c` and anything under `a/c`, and leaves readers of
//! `b` cached.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::context::ReactiveContext;
use super::memo::Memo;
use super::runtime::Runtime;
use crate::error::{render_path, Result, StoreError};

/// A derived computation over the state tree.
pub type Compute = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// Cached accessor returned by [`Reactivity::derived`].
pub type Accessor = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// The reactivity capability consumed by the store.
pub trait Reactivity: Send + Sync {
    /// Clone of the live root value. Not tracked.
    fn get(&self) -> Value;

    /// Tracked read of the value at `path`.
    fn read(&self, path: &[String]) -> Result<Value>;

    /// Mutate the value at `path` in place and notify its dependents.
    fn update(&self, path: &[String], f: &mut dyn FnMut(&mut Value)) -> Result<()>;

    /// Add (or overwrite) the property named by the last segment of `path`
    /// on the object at the parent path, so later reads of it are tracked.
    fn set(&self, path: &[String], value: Value) -> Result<()>;

    /// Substitute the root value.
    fn replace(&self, value: Value);

    /// Register a cached derived value, recomputed only after one of the
    /// paths it read has changed.
    fn derived(&self, compute: Compute) -> Accessor;
}

/// Default [`Reactivity`] implementation.
pub struct StateTree {
    root: RwLock<Value>,
    runtime: Arc<Runtime>,
}

impl StateTree {
    pub fn new(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
            runtime: Runtime::new(),
        }
    }

    /// The runtime that tracks this tree's derived values.
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }
}

fn resolve<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, segment| value.get(segment.as_str()))
}

fn resolve_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    path.iter()
        .try_fold(root, |value, segment| value.get_mut(segment.as_str()))
}

impl Reactivity for StateTree {
    fn get(&self) -> Value {
        self.root.read().clone()
    }

    fn read(&self, path: &[String]) -> Result<Value> {
        ReactiveContext::track_read(path);

        let root = self.root.read();
        resolve(&root, path)
            .cloned()
            .ok_or_else(|| StoreError::StatePathNotFound(render_path(path)))
    }

    fn update(&self, path: &[String], f: &mut dyn FnMut(&mut Value)) -> Result<()> {
        {
            let mut root = self.root.write();
            let slice = resolve_mut(&mut root, path)
                .ok_or_else(|| StoreError::StatePathNotFound(render_path(path)))?;
            f(slice);
        }
        self.runtime.notify_change(path);
        Ok(())
    }

    fn set(&self, path: &[String], value: Value) -> Result<()> {
        let Some((key, parent_path)) = path.split_last() else {
            self.replace(value);
            return Ok(());
        };

        {
            let mut root = self.root.write();
            let parent = resolve_mut(&mut root, parent_path)
                .ok_or_else(|| StoreError::StatePathNotFound(render_path(parent_path)))?;
            let object = parent
                .as_object_mut()
                .ok_or_else(|| StoreError::NotAnObject(render_path(parent_path)))?;
            object.insert(key.clone(), value);
        }
        self.runtime.notify_change(path);
        Ok(())
    }

    fn replace(&self, value: Value) {
        *self.root.write() = value;
        self.runtime.notify_change(&[]);
    }

    fn derived(&self, compute: Compute) -> Accessor {
        let memo = Memo::from_arc(&self.runtime, compute);
        Arc::new(move || memo.get())
    }
}
