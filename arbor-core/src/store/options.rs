//! Store construction options.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::Store;
use crate::error::Result;
use crate::module::ModuleDefinition;
use crate::reactive::{Reactivity, StateTree};

/// Builds the reactivity capability from the root module's initial state.
pub type ReactivityFactory = Box<dyn FnOnce(Value) -> Arc<dyn Reactivity> + Send>;

/// Extension invoked once with the fully constructed store.
pub trait Plugin: Send {
    fn install(self: Box<Self>, store: &Store) -> Result<()>;
}

impl<F> Plugin for F
where
    F: FnOnce(&Store) -> Result<()> + Send,
{
    fn install(self: Box<Self>, store: &Store) -> Result<()> {
        (*self)(store)
    }
}

/// Everything [`Store::new`] needs: the root module, plugins, and
/// optionally a custom reactivity implementation.
pub struct StoreOptions {
    pub(crate) root: ModuleDefinition,
    pub(crate) plugins: Vec<Box<dyn Plugin>>,
    pub(crate) reactivity: Option<ReactivityFactory>,
}

impl StoreOptions {
    pub fn new(root: ModuleDefinition) -> Self {
        Self {
            root,
            plugins: Vec::new(),
            reactivity: None,
        }
    }

    /// Append a plugin. Plugins run in the order they were added.
    pub fn plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Replace the default [`StateTree`] with another reactivity engine.
    pub fn reactivity<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(Value) -> Arc<dyn Reactivity> + Send + 'static,
    {
        self.reactivity = Some(Box::new(factory));
        self
    }

    pub(crate) fn build_reactivity(
        factory: Option<ReactivityFactory>,
        initial: Value,
    ) -> Arc<dyn Reactivity> {
        match factory {
            Some(factory) => factory(initial),
            None => Arc::new(StateTree::new(initial)),
        }
    }
}

impl From<ModuleDefinition> for StoreOptions {
    fn from(root: ModuleDefinition) -> Self {
        Self::new(root)
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("root", &self.root)
            .field("plugins", &self.plugins.len())
            .field("custom_reactivity", &self.reactivity.is_some())
            .finish()
    }
}
