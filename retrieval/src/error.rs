//! Error types for the retrieval engine.

use std::path::PathBuf;

use qnabot_embeddings::EmbeddingError;
use qnabot_kb::KnowledgeBaseError;
use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Knowledge base could not be loaded or is malformed.
    #[error(transparent)]
    KnowledgeBase(#[from] KnowledgeBaseError),

    /// Embedding model or similarity metric error.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configuration file could not be read or written.
    #[error("io error on {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML for [`crate::BotConfig`].
    #[error("invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Query-time call before a successful fit.
    #[error("QnA bot is not fitted; call fit() with a knowledge base first")]
    NotFitted,
}

impl RetrievalError {
    /// Whether the knowledge base does not match the expected shape.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::KnowledgeBase(e) if e.is_schema())
    }

    /// Whether a configuration value is unsupported or invalid.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Embedding(e) => e.is_configuration(),
            Self::Config(_) | Self::ConfigParse { .. } => true,
            _ => false,
        }
    }

    /// Whether the engine was queried before being fitted.
    pub fn is_not_fitted(&self) -> bool {
        matches!(self, Self::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedding_errors_keep_their_message() {
        let err: RetrievalError = EmbeddingError::Unsupported {
            name: "similarity_metric",
            value: "jaccard".to_string(),
            options: &["cosine", "euclidean"],
        }
        .into();

        assert!(err.is_configuration());
        assert!(!err.is_schema());
        assert_eq!(
            err.to_string(),
            "jaccard is not a valid similarity_metric. Must be either cosine or euclidean"
        );
    }

    #[test]
    fn test_classification() {
        let schema: RetrievalError = KnowledgeBaseError::Schema("x".to_string()).into();
        assert!(schema.is_schema());
        assert!(!schema.is_configuration());

        assert!(RetrievalError::NotFitted.is_not_fitted());
        assert!(RetrievalError::Config("min_score".to_string()).is_configuration());
    }
}
