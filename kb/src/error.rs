//! Error types for knowledge base handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for knowledge base operations.
pub type Result<T> = std::result::Result<T, KnowledgeBaseError>;

/// Errors that can occur while loading or validating a knowledge base.
#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    /// The knowledge base does not match the expected shape.
    #[error("invalid knowledge base schema: {0}")]
    Schema(String),

    /// The knowledge base file could not be read or written.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The knowledge base text is not valid JSON.
    #[error("malformed knowledge base json: {0}")]
    Json(#[from] serde_json::Error),
}

impl KnowledgeBaseError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error reports a schema violation (as opposed to I/O or syntax).
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}
