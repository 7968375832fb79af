use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("document has no root element")]
    EmptyDocument,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("invalid selection {expr:?}: {reason}")]
    InvalidSelection { expr: String, reason: String },

    #[error("document root <{actual}> does not match selection root <{expected}>")]
    RootMismatch { expected: String, actual: String },

    #[error("failed to write XML: {0}")]
    Write(String),

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<CodecError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Attach the path of the file being processed.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
