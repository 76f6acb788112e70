//! Module Tree
//!
//! A store is described by one root [`ModuleDefinition`] that may nest
//! child definitions to any depth. This module builds the internal tree
//! from that description.
//!
//! # Design Decisions
//!
//! 1. Modules live in an arena ([`ModuleCollection`]) indexed by
//!    [`ModuleId`]. Parent and child links are ids, so there are no
//!    reference cycles and no shared ownership between nodes.
//!
//! 2. Children are kept in insertion order. Registration order decides
//!    the order in which colliding handlers run, so it must be stable.
//!
//! 3. Namespaces are computed from the tree on demand rather than stored,
//!    so they stay correct when modules are registered later.

mod collection;
mod definition;
mod node;

pub use collection::ModuleCollection;
pub use definition::{ActionFn, GetterFn, ModuleDefinition, MutationFn, StateInit};
pub use node::{Module, ModuleId};
