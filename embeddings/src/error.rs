//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// An identifier outside the supported set.
    #[error("{value} is not a valid {name}. Must be either {}", list_options(.options))]
    Unsupported {
        name: &'static str,
        value: String,
        options: &'static [&'static str],
    },

    /// An option with an invalid value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model used before it was fitted.
    #[error("embedding model is not fitted; call fit_transform() first")]
    NotFitted,

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Whether this error comes from an invalid configuration value.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::InvalidConfig(_))
    }
}

/// Render options as `a, b or c`.
fn list_options(options: &[&str]) -> String {
    match options {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unsupported_message() {
        let err = EmbeddingError::Unsupported {
            name: "model_name",
            value: "tensorflow".to_string(),
            options: &["tfidf", "murmurhash", "count"],
        };
        assert_eq!(
            err.to_string(),
            "tensorflow is not a valid model_name. Must be either tfidf, murmurhash or count"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_list_options() {
        assert_eq!(list_options(&["a", "b"]), "a or b");
        assert_eq!(list_options(&["a"]), "a");
    }
}
