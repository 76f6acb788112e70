//! Module installation.
//!
//! Walks the module tree and wires every module into the store's flat
//! registries, attaching each module's state under its parent's state as it
//! goes.
//!
//! Installed handlers never capture a module's state value. They capture
//! the module's path and resolve the state from the live root each time
//! they run, so they keep working after the root has been replaced.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::registry::{MutationRecord, WrappedAction, WrappedGetter, WrappedMutation};
use super::Store;
use crate::error::{render_path, Result, StoreError};
use crate::module::{ModuleCollection, ModuleId};

/// Install the module `id` registered at `path`, then its descendants.
pub(crate) fn install_module(
    store: &Store,
    modules: &ModuleCollection,
    path: &[String],
    id: ModuleId,
) -> Result<()> {
    let module = modules
        .get(id)
        .ok_or_else(|| StoreError::ModuleNotFound(render_path(path)))?;
    let namespace = modules.get_namespaced(path)?;

    if !path.is_empty() {
        store.reactivity().set(path, module.state().clone())?;
    }

    for (key, mutation) in module.mutations() {
        let kind = format!("{namespace}{key}");
        let mutation = Arc::clone(mutation);
        let local = path.to_vec();
        let record_kind = kind.clone();

        let wrapped: WrappedMutation = Arc::new(move |store: &Store, payload: &Value| -> Result<()> {
            store
                .reactivity()
                .update(&local, &mut |state: &mut Value| mutation(state, payload))?;
            store.notify_subscribers(&MutationRecord::new(record_kind.as_str(), payload.clone()));
            Ok(())
        });
        store.registry().write().add_mutation(kind, wrapped);
    }

    for (key, action) in module.actions() {
        let action = Arc::clone(action);
        let wrapped: WrappedAction =
            Arc::new(move |store: &Store, payload: Value| -> Result<()> { action(store, payload) });
        store
            .registry()
            .write()
            .add_action(format!("{namespace}{key}"), wrapped);
    }

    for (key, getter) in module.getters() {
        let getter = Arc::clone(getter);
        let local = path.to_vec();
        let reactivity = Arc::clone(store.reactivity());

        let wrapped: WrappedGetter = Arc::new(move || -> Result<Value> {
            let state = reactivity.read(&local)?;
            Ok(getter(&state))
        });
        store
            .registry()
            .write()
            .set_getter(format!("{namespace}{key}"), wrapped);
    }

    debug!(
        module = %render_path(path),
        namespace = %namespace,
        "installed module"
    );

    for (name, child) in module.children() {
        let mut child_path = path.to_vec();
        child_path.push(name.to_string());
        install_module(store, modules, &child_path, child)?;
    }

    Ok(())
}
