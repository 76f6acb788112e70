//! Arbor Core
//!
//! This crate provides the core runtime for Arbor, a modular state store.
//! It implements:
//!
//! - A module tree builder that turns nested module definitions into an
//!   arena of modules with namespaces
//! - An installer that flattens the tree into namespaced mutation, action
//!   and getter registries
//! - A store facade exposing `commit`, `dispatch`, cached getters,
//!   subscriptions and state replacement
//! - A reactivity layer (state tree, dependency runtime, memos) behind a
//!   trait so other engines can be plugged in
//!
//! # Architecture
//!
//! - `module`: module definitions, arena nodes and the collection
//! - `store`: registries, installer, options, and the store itself
//! - `reactive`: tracked state tree and cached derived values
//! - `plugins`: logging and persistence plugins
//! - `component`: explicit store propagation through a component tree
//!
//! # Example
//!
//! ```rust
//! use arbor_core::{ModuleDefinition, Store};
//! use serde_json::json;
//!
//! let store = Store::new(
//!     ModuleDefinition::new()
//!         .state(json!({ "age": 28 }))
//!         .getter("getAge", |state| json!(state["age"].as_i64().unwrap_or(0) + 10))
//!         .mutation("changeAge", |state, payload| {
//!             let age = state["age"].as_i64().unwrap_or(0);
//!             state["age"] = json!(age + payload.as_i64().unwrap_or(0));
//!         })
//!         .action("changeAge", |store, payload| store.commit("changeAge", payload)),
//! )?;
//!
//! store.dispatch("changeAge", json!(2))?;
//! assert_eq!(store.getter("getAge")?, json!(40));
//! # Ok::<(), arbor_core::StoreError>(())
//! ```

pub mod component;
pub mod error;
pub mod module;
pub mod plugins;
pub mod reactive;
pub mod store;

pub use component::Component;
pub use error::{Result, StoreError};
pub use module::{ModuleCollection, ModuleDefinition, ModuleId};
pub use reactive::{Reactivity, StateTree};
pub use store::{MutationRecord, Plugin, Store, StoreOptions};
