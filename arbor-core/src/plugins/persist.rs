//! State persistence to a key-value string store.
//!
//! On install the plugin restores any saved state with
//! [`Store::replace_state`]; afterwards it saves the serialized state after
//! every applied mutation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::{Plugin, Store};

/// A string key-value store.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
}

/// Process-local [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        self.items.write().insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Storage key the serialized state is kept under.
    pub key: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            key: "arbor".to_string(),
        }
    }
}

pub struct Persist<S: Storage> {
    storage: Arc<S>,
    config: PersistConfig,
}

impl<S: Storage> Persist<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_config(storage, PersistConfig::default())
    }

    pub fn with_config(storage: Arc<S>, config: PersistConfig) -> Self {
        Self { storage, config }
    }
}

impl<S: Storage + 'static> Plugin for Persist<S> {
    fn install(self: Box<Self>, store: &Store) -> Result<()> {
        let Persist { storage, config } = *self;

        if let Some(saved) = storage.get_item(&config.key) {
            let state: Value = serde_json::from_str(&saved)?;
            debug!(key = %config.key, "restoring persisted state");
            store.replace_state(state);
        }

        store.subscribe(move |_record, state| match serde_json::to_string(state) {
            Ok(encoded) => storage.set_item(&config.key, encoded),
            Err(err) => warn!(key = %config.key, error = %err, "failed to persist state"),
        });
        Ok(())
    }
}
