//! Reactive Context
//!
//! The reactive context tracks which derived computation is currently
//! running. When the state tree is read, the path being read is recorded
//! against the innermost running computation, so that computation can be
//! invalidated when that path changes later.
//!
//! # Implementation
//!
//! A thread-local stack holds one entry per running computation. Entering
//! a context pushes an entry; the returned guard pops it on drop, so the
//! stack stays balanced even if the computation panics. Nested contexts
//! (a getter that triggers another cached read) each see only their own
//! reads.

use std::cell::RefCell;

use super::{StatePath, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = RefCell::new(Vec::new());
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    subscriber_id: SubscriberId,
    /// State paths read while this entry was on top of the stack.
    reads: Vec<StatePath>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// The context is exited when the returned guard is dropped.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                reads: Vec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().map(|entry| entry.subscriber_id))
    }

    /// Record a read of `path` by the innermost running computation.
    ///
    /// Does nothing outside of a reactive context.
    pub fn track_read(path: &[String]) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                entry.reads.push(path.to_vec());
            }
        });
    }

    /// The paths read so far in the current context.
    pub fn reads() -> Vec<StatePath> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.reads.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}
