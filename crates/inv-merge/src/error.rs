//! Error types for the merge crate.

/// Errors that can occur during unification.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Neither an alteration nor a base was supplied.
    #[error("cannot unify: both alteration and base are absent")]
    BothInputsAbsent,

    /// An old-version merge strategy could not reconcile two elements.
    #[error("old-version merge of <{element}> failed: {reason}")]
    Strategy { element: String, reason: String },
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
