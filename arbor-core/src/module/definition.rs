//! User-authored module definitions.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::Result;
use crate::store::Store;

/// Synchronous state transition: `(module_state, payload)`.
pub type MutationFn = Arc<dyn Fn(&mut Value, &Value) + Send + Sync>;

/// Action body: `(store, payload)`. May clone the store and commit later.
pub type ActionFn = Arc<dyn Fn(&Store, Value) -> Result<()> + Send + Sync>;

/// Derived value over the module's own state.
pub type GetterFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Initial state of a module.
#[derive(Clone)]
pub enum StateInit {
    Value(Value),
    /// Evaluated once, when the module is registered.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl StateInit {
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl Default for StateInit {
    fn default() -> Self {
        Self::Value(json!({}))
    }
}

/// A module: state, mutations, actions, getters and nested modules.
///
/// Built with chained calls; map order is insertion order and is the order
/// handlers and child modules are registered in.
///
/// ```
/// use arbor_core::ModuleDefinition;
/// use serde_json::json;
///
/// let counter = ModuleDefinition::new()
///     .state(json!({ "count": 0 }))
///     .mutation("increment", |state, _payload| {
///         let count = state["count"].as_i64().unwrap_or(0);
///         state["count"] = json!(count + 1);
///     })
///     .getter("double", |state| json!(state["count"].as_i64().unwrap_or(0) * 2));
/// assert_eq!(counter.mutations().count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ModuleDefinition {
    state: StateInit,
    namespaced: bool,
    mutations: IndexMap<String, MutationFn>,
    actions: IndexMap<String, ActionFn>,
    getters: IndexMap<String, GetterFn>,
    modules: IndexMap<String, ModuleDefinition>,
}

impl ModuleDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: Value) -> Self {
        self.state = StateInit::Value(state);
        self
    }

    /// Use a factory so every registration gets a fresh state value.
    pub fn state_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.state = StateInit::Factory(Arc::new(factory));
        self
    }

    /// Prefix this module's keys (and its descendants') with `name/`.
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    pub fn mutation<F>(mut self, name: impl Into<String>, mutation: F) -> Self
    where
        F: Fn(&mut Value, &Value) + Send + Sync + 'static,
    {
        self.mutations.insert(name.into(), Arc::new(mutation));
        self
    }

    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Store, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    /// Nest a child module under `name`.
    pub fn module(mut self, name: impl Into<String>, module: ModuleDefinition) -> Self {
        self.modules.insert(name.into(), module);
        self
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    pub fn initial_state(&self) -> &StateInit {
        &self.state
    }

    pub fn mutations(&self) -> impl Iterator<Item = (&str, &MutationFn)> {
        self.mutations.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionFn)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn getters(&self) -> impl Iterator<Item = (&str, &GetterFn)> {
        self.getters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &ModuleDefinition)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn handler_maps(
        &self,
    ) -> (
        IndexMap<String, MutationFn>,
        IndexMap<String, ActionFn>,
        IndexMap<String, GetterFn>,
    ) {
        (
            self.mutations.clone(),
            self.actions.clone(),
            self.getters.clone(),
        )
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("namespaced", &self.namespaced)
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
