//! Error types for the store and its collaborators.

use thiserror::Error;

/// Errors returned by store, module and state-tree operations.
///
/// `Clone + PartialEq` so that results can be cached by derived values
/// and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `commit` was called with a type that has no registered mutation.
    #[error("unknown mutation type: {0}")]
    UnknownMutation(String),

    /// `dispatch` was called with a type that has no registered action.
    #[error("unknown action type: {0}")]
    UnknownAction(String),

    /// No getter is registered under this key.
    #[error("unknown getter: {0}")]
    UnknownGetter(String),

    /// A module path referenced a module that is not registered.
    #[error("module not registered: {0}")]
    ModuleNotFound(String),

    /// A module is already registered at this path.
    #[error("module already registered: {0}")]
    ModuleAlreadyRegistered(String),

    /// The state tree has no value at this path.
    #[error("no state at path: {0}")]
    StatePathNotFound(String),

    /// A property was attached to a state slice that is not an object.
    #[error("state at {0} is not an object")]
    NotAnObject(String),

    /// A component was asked for its store but none was propagated to it.
    #[error("component has no store")]
    NoStore,

    /// State could not be encoded or decoded.
    #[error("state serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Render a module or state path for error messages and logs.
pub(crate) fn render_path<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|segment| segment.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}
