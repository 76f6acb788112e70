//! Module Collection
//!
//! The collection turns a nested [`ModuleDefinition`] into a flat arena of
//! [`Module`] nodes linked by id.
//!
//! # Algorithm
//!
//! Registration is a depth-first pass:
//!
//! 1. Create the node for the current definition.
//! 2. Empty path: it becomes the root. Otherwise resolve the parent by
//!    following child links from the root over all but the last path
//!    segment, and attach the node under the last segment.
//! 3. Recurse into the definition's nested modules, in insertion order,
//!    with `path + [child_name]`.
//!
//! A node is attached before any of its children are registered, so every
//! parent lookup during the pass succeeds.

use tracing::debug;

use super::definition::ModuleDefinition;
use super::node::{Module, ModuleId};
use crate::error::{render_path, Result, StoreError};

/// Arena of registered modules. The root is [`ModuleId::ROOT`].
#[derive(Debug, Default)]
pub struct ModuleCollection {
    modules: Vec<Module>,
}

impl ModuleCollection {
    /// Build the whole tree from the root definition.
    pub fn new(root: &ModuleDefinition) -> Result<Self> {
        let mut collection = Self::default();
        let root_path: [&str; 0] = [];
        collection.register(&root_path, root)?;
        Ok(collection)
    }

    /// Register `definition` (and its nested modules) at `path`.
    ///
    /// Returns the id of the module created for `definition` itself.
    pub fn register<S: AsRef<str>>(
        &mut self,
        path: &[S],
        definition: &ModuleDefinition,
    ) -> Result<ModuleId> {
        let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
        self.register_path(&path, definition)
    }

    fn register_path(&mut self, path: &[String], definition: &ModuleDefinition) -> Result<ModuleId> {
        let id = ModuleId::from_index(self.modules.len());

        match path.split_last() {
            None => {
                if !self.modules.is_empty() {
                    return Err(StoreError::ModuleAlreadyRegistered(render_path(path)));
                }
                self.modules.push(Module::new(id, None, None, definition));
            }
            Some((name, parent_path)) => {
                let parent = self
                    .resolve(parent_path)
                    .ok_or_else(|| StoreError::ModuleNotFound(render_path(parent_path)))?;
                if self.modules[parent.index()].get_child(name).is_some() {
                    return Err(StoreError::ModuleAlreadyRegistered(render_path(path)));
                }
                self.modules
                    .push(Module::new(id, Some(name.clone()), Some(parent), definition));
                self.modules[parent.index()].add_child(name.clone(), id);
            }
        }

        debug!(module = %render_path(path), id = id.index(), "registered module");

        for (child_name, child) in definition.modules() {
            let mut child_path = path.to_vec();
            child_path.push(child_name.to_string());
            self.register_path(&child_path, child)?;
        }

        Ok(id)
    }

    /// Follow child links from the root.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<ModuleId> {
        let root = self.modules.first()?;
        path.iter()
            .try_fold(root, |module, name| {
                module
                    .get_child(name.as_ref())
                    .map(|id| &self.modules[id.index()])
            })
            .map(Module::id)
    }

    /// Namespace prefix for the module at `path`.
    ///
    /// Concatenates `name/` for every module on the path that is
    /// namespaced; empty when none is.
    pub fn get_namespaced<S: AsRef<str>>(&self, path: &[S]) -> Result<String> {
        let mut module = self
            .modules
            .first()
            .ok_or_else(|| StoreError::ModuleNotFound(render_path(path)))?;
        let mut namespace = String::new();

        for name in path {
            let name = name.as_ref();
            let child = module
                .get_child(name)
                .ok_or_else(|| StoreError::ModuleNotFound(render_path(path)))?;
            module = &self.modules[child.index()];
            if module.is_namespaced() {
                namespace.push_str(name);
                namespace.push('/');
            }
        }

        Ok(namespace)
    }

    /// Check that every module in the subtree at `id` that has children
    /// carries object state, so the children's state can be attached to it.
    pub(crate) fn check_nesting(&self, path: &[String], id: ModuleId) -> Result<()> {
        let module = self
            .get(id)
            .ok_or_else(|| StoreError::ModuleNotFound(render_path(path)))?;
        let mut children = module.children().peekable();
        if children.peek().is_some() && !module.state().is_object() {
            return Err(StoreError::NotAnObject(render_path(path)));
        }

        for (name, child) in children {
            let mut child_path = path.to_vec();
            child_path.push(name.to_string());
            self.check_nesting(&child_path, child)?;
        }
        Ok(())
    }

    /// Undo the most recent [`register`](Self::register) call, which
    /// returned `id`.
    ///
    /// Registration appends a subtree depth-first, so the subtree occupies
    /// every slot from `id` to the end of the arena.
    pub(crate) fn unregister_last(&mut self, id: ModuleId) {
        let Some(module) = self.get(id) else {
            return;
        };
        if let (Some(parent), Some(name)) = (module.parent(), module.name().map(str::to_string)) {
            self.modules[parent.index()].remove_child(&name);
        }
        self.modules.truncate(id.index());
        debug!(id = id.index(), "rolled back module registration");
    }

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    pub fn root(&self) -> Option<&Module> {
        self.modules.first()
    }

    /// Number of registered modules, root included.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(a_namespaced: bool, c_namespaced: bool) -> ModuleDefinition {
        ModuleDefinition::new()
            .state(json!({ "age": 28 }))
            .module(
                "a",
                ModuleDefinition::new()
                    .namespaced(a_namespaced)
                    .module("c", ModuleDefinition::new().namespaced(c_namespaced)),
            )
            .module("b", ModuleDefinition::new())
    }

    #[test]
    fn registers_depth_first() {
        let collection = ModuleCollection::new(&tree(false, false)).unwrap();
        assert_eq!(collection.len(), 4);

        let order: Vec<_> = (0..collection.len())
            .map(|i| {
                collection
                    .get(ModuleId::from_index(i))
                    .and_then(|m| m.name().map(str::to_string))
                    .unwrap_or_else(|| "root".into())
            })
            .collect();
        assert_eq!(order, vec!["root", "a", "c", "b"]);
    }

    #[test]
    fn resolves_nested_paths() {
        let collection = ModuleCollection::new(&tree(false, false)).unwrap();

        let c = collection.resolve(&["a", "c"]).unwrap();
        let a = collection.resolve(&["a"]).unwrap();
        assert_eq!(collection.get(c).unwrap().parent(), Some(a));
        assert_eq!(collection.resolve(&["b", "c"]), None);
        assert_eq!(collection.resolve::<&str>(&[]), Some(ModuleId::ROOT));
    }

    #[test]
    fn namespace_joins_namespaced_modules() {
        let collection = ModuleCollection::new(&tree(true, true)).unwrap();
        assert_eq!(collection.get_namespaced(&["a", "c"]).unwrap(), "a/c/");
        assert_eq!(collection.get_namespaced(&["a"]).unwrap(), "a/");
        assert_eq!(collection.get_namespaced(&["b"]).unwrap(), "");
    }

    #[test]
    fn namespace_skips_plain_modules() {
        let collection = ModuleCollection::new(&tree(false, true)).unwrap();
        assert_eq!(collection.get_namespaced(&["a", "c"]).unwrap(), "c/");

        let plain = ModuleCollection::new(&tree(false, false)).unwrap();
        assert_eq!(plain.get_namespaced(&["a", "c"]).unwrap(), "");
        assert_eq!(plain.get_namespaced::<&str>(&[]).unwrap(), "");
    }

    #[test]
    fn namespace_is_stable_across_calls() {
        let collection = ModuleCollection::new(&tree(true, false)).unwrap();
        let first = collection.get_namespaced(&["a", "c"]).unwrap();
        let second = collection.get_namespaced(&["a", "c"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut collection = ModuleCollection::new(&tree(false, false)).unwrap();
        let err = collection
            .register(&["missing", "x"], &ModuleDefinition::new())
            .unwrap_err();
        assert_eq!(err, StoreError::ModuleNotFound("missing".into()));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut collection = ModuleCollection::new(&tree(false, false)).unwrap();

        assert_eq!(
            collection.register(&["a"], &ModuleDefinition::new()),
            Err(StoreError::ModuleAlreadyRegistered("a".into()))
        );
        assert_eq!(
            collection.register::<&str>(&[], &ModuleDefinition::new()),
            Err(StoreError::ModuleAlreadyRegistered("<root>".into()))
        );
    }

    #[test]
    fn late_registration_attaches_subtree() {
        let mut collection = ModuleCollection::new(&tree(false, false)).unwrap();
        let d = collection
            .register(
                &["b", "d"],
                &ModuleDefinition::new().module("e", ModuleDefinition::new()),
            )
            .unwrap();

        assert_eq!(collection.resolve(&["b", "d"]), Some(d));
        assert!(collection.resolve(&["b", "d", "e"]).is_some());
        assert_eq!(collection.len(), 6);
    }

    #[test]
    fn nesting_under_scalar_state_is_rejected() {
        let mut collection = ModuleCollection::new(&tree(false, false)).unwrap();
        let d = collection
            .register(
                &["b", "d"],
                &ModuleDefinition::new()
                    .state(json!(5))
                    .module("e", ModuleDefinition::new()),
            )
            .unwrap();

        let path = vec!["b".to_string(), "d".to_string()];
        assert_eq!(
            collection.check_nesting(&path, d),
            Err(StoreError::NotAnObject("b/d".into()))
        );
        assert_eq!(collection.check_nesting(&[], ModuleId::ROOT), Ok(()));
    }

    #[test]
    fn unregister_last_removes_the_subtree() {
        let mut collection = ModuleCollection::new(&tree(false, false)).unwrap();
        let d = collection
            .register(
                &["b", "d"],
                &ModuleDefinition::new().module("e", ModuleDefinition::new()),
            )
            .unwrap();

        collection.unregister_last(d);

        assert_eq!(collection.len(), 4);
        assert_eq!(collection.resolve(&["b", "d"]), None);
        assert!(collection.register(&["b", "d"], &ModuleDefinition::new()).is_ok());
    }
}
