use inv_types::Key;

/// Errors from element store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key does not describe the element being stored.
    #[error("key {key} does not belong to element <{element}>")]
    KeyMismatch { key: Key, element: String },

    /// An element is already stored under this key.
    #[error("an element is already stored under {0}")]
    Occupied(Key),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
