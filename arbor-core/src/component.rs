//! Store propagation through a component tree.
//!
//! The root component is created with the store; every component created
//! from it inherits the same store handle. Nothing is injected implicitly:
//! a component only has a store if its ancestor chain started with one.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    store: Option<Store>,
}

impl Component {
    /// A root component carrying `store`.
    pub fn root(name: impl Into<String>, store: Store) -> Self {
        Self {
            name: name.into(),
            store: Some(store),
        }
    }

    /// A root component without a store.
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: None,
        }
    }

    /// Create a child that inherits this component's store.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: self.store.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    fn require_store(&self) -> Result<&Store> {
        self.store.as_ref().ok_or(StoreError::NoStore)
    }

    /// Read top-level state keys. Missing keys map to `null`.
    pub fn map_state(&self, keys: &[&str]) -> Result<IndexMap<String, Value>> {
        let state = self.require_store()?.state();
        Ok(keys
            .iter()
            .map(|key| (key.to_string(), state.get(*key).cloned().unwrap_or(Value::Null)))
            .collect())
    }

    /// Read getters by key.
    pub fn map_getters(&self, keys: &[&str]) -> Result<IndexMap<String, Value>> {
        let store = self.require_store()?;
        keys.iter()
            .map(|key| store.getter(key).map(|value| (key.to_string(), value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleDefinition;
    use serde_json::json;

    fn store() -> Store {
        Store::new(
            ModuleDefinition::new()
                .state(json!({ "age": 28 }))
                .getter("getAge", |state| json!(state["age"].as_i64().unwrap_or(0) + 10)),
        )
        .unwrap()
    }

    #[test]
    fn descendants_inherit_the_root_store() {
        let root = Component::root("root", store());
        let grandchild = root.child("app").child("counter");

        assert_eq!(grandchild.name(), "counter");
        assert_eq!(
            grandchild.store().map(Store::state),
            Some(json!({ "age": 28 }))
        );
    }

    #[test]
    fn map_helpers_read_through_the_store() {
        let component = Component::root("root", store()).child("view");

        let state = component.map_state(&["age", "missing"]).unwrap();
        assert_eq!(state["age"], json!(28));
        assert_eq!(state["missing"], Value::Null);

        let getters = component.map_getters(&["getAge"]).unwrap();
        assert_eq!(getters["getAge"], json!(38));

        assert_eq!(
            component.map_getters(&["nope"]),
            Err(StoreError::UnknownGetter("nope".into()))
        );
    }

    #[test]
    fn detached_tree_has_no_store() {
        let child = Component::detached("orphan").child("leaf");
        assert!(child.store().is_none());
        assert_eq!(child.map_state(&["age"]), Err(StoreError::NoStore));
    }
}
