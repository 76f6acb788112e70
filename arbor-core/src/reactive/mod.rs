//! Reactive Primitives
//!
//! This module implements the reactivity capability the store builds on:
//! a state tree whose reads are tracked per path, and cached derived
//! values (memos) that are invalidated when a path they read changes.
//!
//! # Concepts
//!
//! ## State tree
//!
//! A single JSON value holding the whole store state. Module state slices
//! live at paths below the root. Writes go through the tree so it can tell
//! the runtime which path changed.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only
//! when one of the paths it read has been written. Store getters are memos.
//!
//! # Implementation Notes
//!
//! Reads are attributed to the running memo through a thread-local
//! tracking context. When the state tree is read, we check if there is an
//! active context and, if so, record the path against it.
//!
//! The store only talks to the [`Reactivity`] trait. [`StateTree`] is the
//! default implementation; any other observer mechanism can be injected.

mod context;
mod memo;
mod runtime;
mod subscriber;
mod tree;

pub use context::ReactiveContext;
pub use memo::{Memo, MemoState};
pub use runtime::{Reactive, ReactiveHandle, Runtime};
pub use subscriber::{Dependencies, SubscriberId};
pub use tree::{Accessor, Compute, Reactivity, StateTree};

/// Ordered module names from the root, addressing a slice of state.
pub type StatePath = Vec<String>;
