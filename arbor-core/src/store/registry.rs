//! Flattened handler registries.
//!
//! Every module's mutations, actions and getters end up here under their
//! namespaced key. Mutation and action keys accumulate handlers; getter
//! keys hold a single thunk and the last registration wins.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use super::Store;
use crate::error::Result;

/// Installed mutation: resolves its module state from the live root.
pub type WrappedMutation = Arc<dyn Fn(&Store, &Value) -> Result<()> + Send + Sync>;

/// Installed action.
pub type WrappedAction = Arc<dyn Fn(&Store, Value) -> Result<()> + Send + Sync>;

/// Installed getter thunk.
pub type WrappedGetter = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// Handlers registered under one key, in registration order. Almost always
/// exactly one.
pub type Handlers<T> = SmallVec<[T; 1]>;

/// What subscribers learn about an applied mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Namespaced mutation key.
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

impl MutationRecord {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    mutations: IndexMap<String, Handlers<WrappedMutation>>,
    actions: IndexMap<String, Handlers<WrappedAction>>,
    wrapped_getters: IndexMap<String, WrappedGetter>,
}

impl Registry {
    pub(crate) fn add_mutation(&mut self, key: String, handler: WrappedMutation) {
        self.mutations.entry(key).or_default().push(handler);
    }

    pub(crate) fn add_action(&mut self, key: String, handler: WrappedAction) {
        self.actions.entry(key).or_default().push(handler);
    }

    pub(crate) fn set_getter(&mut self, key: String, getter: WrappedGetter) {
        if self.wrapped_getters.insert(key.clone(), getter).is_some() {
            debug!(getter = %key, "getter key already registered, replacing");
        }
    }

    /// Clone of the handler list for `key`, so callers can run the handlers
    /// without holding the registry lock.
    pub(crate) fn mutations(&self, key: &str) -> Option<Handlers<WrappedMutation>> {
        self.mutations.get(key).cloned()
    }

    pub(crate) fn actions(&self, key: &str) -> Option<Handlers<WrappedAction>> {
        self.actions.get(key).cloned()
    }

    pub(crate) fn wrapped_getters(&self) -> impl Iterator<Item = (&String, &WrappedGetter)> {
        self.wrapped_getters.iter()
    }

    pub(crate) fn mutation_keys(&self) -> impl Iterator<Item = &str> {
        self.mutations.keys().map(String::as_str)
    }

    pub(crate) fn action_keys(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}
