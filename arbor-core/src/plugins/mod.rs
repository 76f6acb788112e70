//! Built-in plugins.
//!
//! A plugin is anything implementing [`Plugin`](crate::Plugin), including
//! plain `FnOnce(&Store) -> Result<()>` closures. Plugins run once, after
//! the store is fully constructed, and usually hook in with
//! [`Store::subscribe`](crate::Store::subscribe).

mod logger;
mod persist;

pub use logger::Logger;
pub use persist::{MemoryStorage, Persist, PersistConfig, Storage};
