use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use serde_json::Value;
use tracing::{debug, error, trace};

use super::installer::install_module;
use super::options::StoreOptions;
use super::registry::{MutationRecord, Registry};
use crate::error::{render_path, Result, StoreError};
use crate::module::{ModuleCollection, ModuleDefinition, ModuleId};
use crate::reactive::{Accessor, Reactivity};

type SubscriberFn = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;

struct StoreInner {
    modules: RwLock<ModuleCollection>,
    registry: RwLock<Registry>,
    /// Cached getter accessors, rebuilt whenever modules are installed.
    getters: RwLock<IndexMap<String, Accessor>>,
    subscribers: RwLock<Vec<SubscriberFn>>,
    reactivity: Arc<dyn Reactivity>,
}

/// A modular state store.
///
/// `Store` is a handle: clones share the same state, registries and
/// subscribers. Actions receive the store explicitly and clone it when
/// they need to commit later.
///
/// # Example
///
/// ```
/// use arbor_core::{ModuleDefinition, Store};
/// use serde_json::json;
///
/// fn add_age(state: &mut serde_json::Value, payload: &serde_json::Value) {
///     let age = state["age"].as_i64().unwrap_or(0);
///     state["age"] = json!(age + payload.as_i64().unwrap_or(0));
/// }
///
/// let store = Store::new(
///     ModuleDefinition::new()
///         .state(json!({ "age": 10 }))
///         .mutation("changeAge", add_age)
///         .module(
///             "a",
///             ModuleDefinition::new()
///                 .state(json!({ "age": 222 }))
///                 .mutation("changeAge", add_age),
///         ),
/// )?;
///
/// store.commit("changeAge", json!(5))?;
/// assert_eq!(store.state()["age"], json!(15));
/// assert_eq!(store.state()["a"]["age"], json!(227));
/// # Ok::<(), arbor_core::StoreError>(())
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Build the module tree, install it, set up cached getters, then run
    /// plugins in order.
    pub fn new(options: impl Into<StoreOptions>) -> Result<Self> {
        let StoreOptions {
            root,
            plugins,
            reactivity,
        } = options.into();

        let modules = ModuleCollection::new(&root)?;
        let initial = modules
            .root()
            .map(|module| module.state().clone())
            .unwrap_or_else(|| Value::Object(Default::default()));
        let reactivity = StoreOptions::build_reactivity(reactivity, initial);

        let store = Self {
            inner: Arc::new(StoreInner {
                modules: RwLock::new(modules),
                registry: RwLock::new(Registry::default()),
                getters: RwLock::new(IndexMap::new()),
                subscribers: RwLock::new(Vec::new()),
                reactivity,
            }),
        };

        {
            let modules = store.inner.modules.read();
            install_module(&store, &modules, &[], ModuleId::ROOT)?;
            debug!(modules = modules.len(), "store modules installed");
        }
        store.reset_getters();

        for plugin in plugins {
            plugin.install(&store)?;
        }

        Ok(store)
    }

    pub(crate) fn reactivity(&self) -> &Arc<dyn Reactivity> {
        &self.inner.reactivity
    }

    pub(crate) fn registry(&self) -> &RwLock<Registry> {
        &self.inner.registry
    }

    /// The live root state.
    pub fn state(&self) -> Value {
        self.inner.reactivity.get()
    }

    /// Apply every mutation registered under `kind`, in registration order.
    pub fn commit(&self, kind: &str, payload: Value) -> Result<()> {
        let handlers = self.inner.registry.read().mutations(kind);
        let Some(handlers) = handlers else {
            error!(mutation = kind, "unknown mutation type");
            return Err(StoreError::UnknownMutation(kind.to_string()));
        };

        trace!(mutation = kind, handlers = handlers.len(), "commit");
        for handler in &handlers {
            handler(self, &payload)?;
        }
        Ok(())
    }

    /// Invoke every action registered under `kind`, in registration order.
    ///
    /// Returns once each action function has returned; work an action
    /// schedules for later is not awaited.
    pub fn dispatch(&self, kind: &str, payload: Value) -> Result<()> {
        let handlers = self.inner.registry.read().actions(kind);
        let Some(handlers) = handlers else {
            error!(action = kind, "unknown action type");
            return Err(StoreError::UnknownAction(kind.to_string()));
        };

        trace!(action = kind, handlers = handlers.len(), "dispatch");
        for handler in &handlers {
            handler(self, payload.clone())?;
        }
        Ok(())
    }

    /// Swap the whole root state.
    ///
    /// Getters and mutations resolve module state from the live root, so
    /// they observe the new value from their next run on.
    pub fn replace_state(&self, state: Value) {
        self.inner.reactivity.replace(state);
    }

    /// Call `callback` after every applied mutation with the mutation and
    /// the state after it.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    {
        self.inner.subscribers.write().push(Arc::new(callback));
    }

    pub(crate) fn notify_subscribers(&self, record: &MutationRecord) {
        let subscribers = self.inner.subscribers.read().clone();
        if subscribers.is_empty() {
            return;
        }
        let state = self.state();
        for subscriber in &subscribers {
            subscriber(record, &state);
        }
    }

    /// Read a getter through its cache.
    pub fn getter(&self, name: &str) -> Result<Value> {
        let accessor = self.inner.getters.read().get(name).cloned();
        match accessor {
            Some(accessor) => accessor(),
            None => Err(StoreError::UnknownGetter(name.to_string())),
        }
    }

    pub fn getter_names(&self) -> Vec<String> {
        self.inner.getters.read().keys().cloned().collect()
    }

    /// Rebuild the cached getter surface from the wrapped getters.
    fn reset_getters(&self) {
        let getters: IndexMap<String, Accessor> = {
            let registry = self.inner.registry.read();
            registry
                .wrapped_getters()
                .map(|(key, getter)| (key.clone(), self.inner.reactivity.derived(Arc::clone(getter))))
                .collect()
        };
        debug!(getters = getters.len(), "getters rebuilt");
        *self.inner.getters.write() = getters;
    }

    /// Register and install a module subtree after construction.
    ///
    /// The parent path must already be registered. Registries stay
    /// append-only; there is no way to remove a module again.
    pub fn register_module<S: AsRef<str>>(&self, path: &[S], definition: ModuleDefinition) -> Result<()> {
        let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
        let Some((_, parent_path)) = path.split_last() else {
            return Err(StoreError::ModuleAlreadyRegistered(render_path(&path)));
        };

        // The new state is attached under the parent's live slice, which
        // `replace_state` may have turned into something else.
        if !self.inner.reactivity.read(parent_path)?.is_object() {
            return Err(StoreError::NotAnObject(render_path(parent_path)));
        }

        {
            let mut modules = self.inner.modules.write();
            let id = modules.register(&path, &definition)?;
            if let Err(err) = modules.check_nesting(&path, id) {
                modules.unregister_last(id);
                return Err(err);
            }
            let modules = RwLockWriteGuard::downgrade(modules);
            install_module(self, &modules, &path, id)?;
        }
        self.reset_getters();
        Ok(())
    }

    pub fn has_module<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.inner.modules.read().resolve(path).is_some()
    }

    /// Namespace prefix of the module at `path`.
    pub fn namespace<S: AsRef<str>>(&self, path: &[S]) -> Result<String> {
        self.inner.modules.read().get_namespaced(path)
    }

    pub fn mutation_handler_count(&self, kind: &str) -> usize {
        self.inner
            .registry
            .read()
            .mutations(kind)
            .map_or(0, |handlers| handlers.len())
    }

    pub fn action_handler_count(&self, kind: &str) -> usize {
        self.inner
            .registry
            .read()
            .actions(kind)
            .map_or(0, |handlers| handlers.len())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.read();
        f.debug_struct("Store")
            .field("modules", &self.inner.modules.read().len())
            .field("mutations", &registry.mutation_keys().collect::<Vec<_>>())
            .field("actions", &registry.action_keys().collect::<Vec<_>>())
            .field("getters", &self.getter_names())
            .field("subscribers", &self.inner.subscribers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn add_age(state: &mut Value, payload: &Value) {
        let age = state["age"].as_i64().unwrap_or(0);
        state["age"] = json!(age + payload.as_i64().unwrap_or(0));
    }

    fn age_module(age: i64) -> ModuleDefinition {
        ModuleDefinition::new()
            .state(json!({ "age": age }))
            .mutation("changeAge", add_age)
    }

    #[test]
    fn child_state_is_attached_under_parent() {
        let store = Store::new(
            age_module(28)
                .module("a", age_module(222).module("c", age_module(333)))
                .module("b", age_module(111)),
        )
        .unwrap();

        assert_eq!(
            store.state(),
            json!({
                "age": 28,
                "a": { "age": 222, "c": { "age": 333 } },
                "b": { "age": 111 }
            })
        );
    }

    #[test]
    fn commit_unknown_type_fails() {
        let store = Store::new(age_module(1)).unwrap();
        assert_eq!(
            store.commit("nope", json!(1)),
            Err(StoreError::UnknownMutation("nope".into()))
        );
        assert_eq!(
            store.dispatch("nope", json!(1)),
            Err(StoreError::UnknownAction("nope".into()))
        );
    }

    #[test]
    fn namespaced_keys_are_prefixed() {
        let store = Store::new(
            ModuleDefinition::new().module("a", age_module(1).namespaced(true)),
        )
        .unwrap();

        assert_eq!(store.mutation_handler_count("a/changeAge"), 1);
        assert_eq!(store.mutation_handler_count("changeAge"), 0);

        store.commit("a/changeAge", json!(2)).unwrap();
        assert_eq!(store.state()["a"]["age"], json!(3));
    }

    #[test]
    fn subscribers_receive_record_and_new_state() {
        let store = Store::new(age_module(1)).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        store.subscribe(move |record, state| {
            seen_clone.lock().push((record.clone(), state.clone()));
        });
        store.commit("changeAge", json!(4)).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, MutationRecord::new("changeAge", json!(4)));
        assert_eq!(seen[0].1, json!({ "age": 5 }));
    }

    #[test]
    fn getters_are_cached_until_their_module_changes() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let store = Store::new(
            age_module(1)
                .module(
                    "a",
                    age_module(10).namespaced(true).getter("doubled", move |state| {
                        runs_clone.fetch_add(1, Ordering::SeqCst);
                        json!(state["age"].as_i64().unwrap_or(0) * 2)
                    }),
                )
                .module("b", age_module(100).namespaced(true)),
        )
        .unwrap();

        assert_eq!(store.getter("a/doubled").unwrap(), json!(20));
        assert_eq!(store.getter("a/doubled").unwrap(), json!(20));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        store.commit("b/changeAge", json!(1)).unwrap();
        assert_eq!(store.getter("a/doubled").unwrap(), json!(20));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        store.commit("a/changeAge", json!(1)).unwrap();
        assert_eq!(store.getter("a/doubled").unwrap(), json!(22));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_getter_fails() {
        let store = Store::new(age_module(1)).unwrap();
        assert_eq!(
            store.getter("missing"),
            Err(StoreError::UnknownGetter("missing".into()))
        );
    }

    #[test]
    fn plugins_run_after_installation() {
        let observed = Arc::new(Mutex::new(None));
        let observed_clone = observed.clone();

        Store::new(
            StoreOptions::new(age_module(7).module("a", age_module(8))).plugin(
                move |store: &Store| -> Result<()> {
                    *observed_clone.lock() = Some(store.state());
                    Ok(())
                },
            ),
        )
        .unwrap();

        assert_eq!(
            observed.lock().clone(),
            Some(json!({ "age": 7, "a": { "age": 8 } }))
        );
    }

    #[test]
    fn plugin_errors_abort_construction() {
        let result = Store::new(
            StoreOptions::new(age_module(1))
                .plugin(|_: &Store| -> Result<()> { Err(StoreError::NoStore) }),
        );
        assert_eq!(result.err(), Some(StoreError::NoStore));
    }

    #[test]
    fn register_module_installs_late() {
        let store = Store::new(age_module(1).module("a", age_module(2))).unwrap();

        store
            .register_module(
                &["a", "d"],
                age_module(40).namespaced(true).getter("age", |state| state["age"].clone()),
            )
            .unwrap();

        assert!(store.has_module(&["a", "d"]));
        assert_eq!(store.state()["a"]["d"], json!({ "age": 40 }));
        assert_eq!(store.mutation_handler_count("d/changeAge"), 1);
        assert_eq!(store.getter("d/age").unwrap(), json!(40));

        store.commit("d/changeAge", json!(2)).unwrap();
        assert_eq!(store.getter("d/age").unwrap(), json!(42));
    }

    #[test]
    fn register_module_rejects_root_and_duplicates() {
        let store = Store::new(age_module(1).module("a", age_module(2))).unwrap();

        assert_eq!(
            store.register_module::<&str>(&[], ModuleDefinition::new()),
            Err(StoreError::ModuleAlreadyRegistered("<root>".into()))
        );
        assert_eq!(
            store.register_module(&["a"], ModuleDefinition::new()),
            Err(StoreError::ModuleAlreadyRegistered("a".into()))
        );
    }

    #[test]
    fn failed_registration_can_be_retried() {
        let store = Store::new(age_module(1).module("a", age_module(2))).unwrap();

        store.replace_state(json!({ "age": 1, "a": 7 }));
        assert_eq!(
            store.register_module(&["a", "d"], age_module(40).namespaced(true)),
            Err(StoreError::NotAnObject("a".into()))
        );
        assert!(!store.has_module(&["a", "d"]));
        assert_eq!(store.mutation_handler_count("d/changeAge"), 0);

        store.replace_state(json!({ "age": 1, "a": { "age": 2 } }));
        store
            .register_module(&["a", "d"], age_module(40).namespaced(true))
            .unwrap();
        assert!(store.has_module(&["a", "d"]));
        assert_eq!(store.mutation_handler_count("d/changeAge"), 1);
    }

    #[test]
    fn registration_nesting_under_scalar_state_is_rolled_back() {
        let store = Store::new(age_module(1)).unwrap();
        let scalar_with_children = ModuleDefinition::new()
            .state(json!(3))
            .module("inner", age_module(1));

        assert_eq!(
            store.register_module(&["a"], scalar_with_children),
            Err(StoreError::NotAnObject("a".into()))
        );
        assert!(!store.has_module(&["a"]));
        assert!(!store.has_module(&["a", "inner"]));
        assert_eq!(store.mutation_handler_count("changeAge"), 1);
        assert_eq!(store.state(), json!({ "age": 1 }));
    }

    #[test]
    fn commit_after_replace_without_slice_fails() {
        let store = Store::new(ModuleDefinition::new().module("a", age_module(2))).unwrap();

        store.replace_state(json!({}));
        assert_eq!(
            store.commit("changeAge", json!(1)),
            Err(StoreError::StatePathNotFound("a".into()))
        );
    }
}
