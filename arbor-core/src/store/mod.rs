//! Store facade.
//!
//! The store flattens the module tree into three registries and exposes
//! them through `commit`, `dispatch` and cached getters.
//!
//! # Flattening
//!
//! Each module's keys are prefixed with its namespace (see
//! [`ModuleCollection::get_namespaced`](crate::module::ModuleCollection::get_namespaced)).
//! When two modules end up with the same mutation or action key, both
//! handlers are kept and run in registration order. When two modules end
//! up with the same getter key, the later one replaces the earlier one.

mod installer;
mod options;
mod registry;
#[allow(clippy::module_inception)]
mod store;

pub use options::{Plugin, ReactivityFactory, StoreOptions};
pub use registry::{Handlers, MutationRecord, WrappedAction, WrappedGetter, WrappedMutation};
pub use store::Store;
