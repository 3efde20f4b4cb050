use thiserror::Error;

/// Errors of store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The node was replaced or removed from its parent and has been dropped
    /// from the store.
    #[error("node is no longer attached to its store")]
    StaleNode,
    /// Objects have a fixed set of fields; use a map to add keys.
    #[error("object has no field '{0}'")]
    UnknownField(String),
    #[error("index {index} is out of bounds for a list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("cannot {operation} on a value of kind {found}")]
    WrongKind {
        operation: &'static str,
        found: &'static str,
    },
    #[error("the root of a store must be an object or a map, not {0}")]
    InvalidRoot(&'static str),
}
