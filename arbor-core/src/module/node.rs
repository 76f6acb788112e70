//! Module Nodes
//!
//! This module defines the nodes that live in the module arena.

use indexmap::IndexMap;
use serde_json::Value;

use super::definition::{ActionFn, GetterFn, ModuleDefinition, MutationFn};

/// Index of a module in its [`ModuleCollection`](super::ModuleCollection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl ModuleId {
    /// The root module is always the first node registered.
    pub const ROOT: ModuleId = ModuleId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A registered module.
///
/// Created once per definition during registration. Only `children` changes
/// afterwards, while the tree is being built.
pub struct Module {
    id: ModuleId,

    /// Local name under the parent; `None` for the root.
    name: Option<String>,

    parent: Option<ModuleId>,

    namespaced: bool,

    /// Initial state, with any factory already evaluated.
    state: Value,

    mutations: IndexMap<String, MutationFn>,
    actions: IndexMap<String, ActionFn>,
    getters: IndexMap<String, GetterFn>,

    /// Child modules by local name, in registration order.
    children: IndexMap<String, ModuleId>,
}

impl Module {
    pub(crate) fn new(
        id: ModuleId,
        name: Option<String>,
        parent: Option<ModuleId>,
        definition: &ModuleDefinition,
    ) -> Self {
        let (mutations, actions, getters) = definition.handler_maps();
        Self {
            id,
            name,
            parent,
            namespaced: definition.is_namespaced(),
            state: definition.initial_state().resolve(),
            mutations,
            actions,
            getters,
            children: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<ModuleId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn get_child(&self, name: &str) -> Option<ModuleId> {
        self.children.get(name).copied()
    }

    pub(crate) fn add_child(&mut self, name: String, child: ModuleId) {
        self.children.insert(name, child);
    }

    pub(crate) fn remove_child(&mut self, name: &str) -> Option<ModuleId> {
        self.children.shift_remove(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, ModuleId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
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
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("namespaced", &self.namespaced)
            .field("children", &self.children)
            .finish()
    }
}
