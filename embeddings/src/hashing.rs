//! Feature hashing: tokens are hashed straight into a fixed number of columns.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::analyzer::Analyzer;
use crate::error::{EmbeddingError, Result};
use crate::vector::{EmbeddingMatrix, Norm, SparseEmbedding};

/// Default number of hashed columns (2^20).
pub const DEFAULT_N_FEATURES: usize = 1 << 20;

/// Configuration for the hashing vectorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Number of output columns.
    pub n_features: usize,

    /// Give each token a sign derived from its hash so that collisions tend
    /// to cancel instead of accumulate.
    pub alternate_sign: bool,

    /// Row normalization.
    pub norm: Norm,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            n_features: DEFAULT_N_FEATURES,
            alternate_sign: true,
            norm: Norm::L2,
        }
    }
}

/// Stateless vectorizer mapping tokens to columns by hash.
///
/// There is no vocabulary, so `fit_transform` and `transform` are the same
/// operation and unseen query tokens still land in some column.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    analyzer: Analyzer,
    config: HashingConfig,
}

impl HashingVectorizer {
    /// Create a vectorizer, validating the configuration.
    pub fn new(analyzer: Analyzer, config: HashingConfig) -> Result<Self> {
        if config.n_features == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "n_features must be at least 1".to_string(),
            ));
        }
        Ok(Self { analyzer, config })
    }

    /// Number of output columns.
    pub fn n_features(&self) -> usize {
        self.config.n_features
    }

    /// Embed `texts`.
    pub fn transform(&self, texts: &[&str]) -> Result<EmbeddingMatrix> {
        let rows = texts
            .iter()
            .map(|t| self.embed(t))
            .collect::<Result<Vec<_>>>()?;
        EmbeddingMatrix::from_rows(self.config.n_features, rows)
    }

    fn embed(&self, text: &str) -> Result<SparseEmbedding> {
        let mut columns: BTreeMap<usize, f32> = BTreeMap::new();
        for term in self.analyzer.analyze(text) {
            let (column, sign) = self.bucket(&term);
            *columns.entry(column).or_insert(0.0) += sign;
        }

        let mut vector = SparseEmbedding::from_columns(self.config.n_features, columns)?;
        vector.normalize(self.config.norm);
        Ok(vector)
    }

    fn bucket(&self, term: &str) -> (usize, f32) {
        let hash = hash_term(term);
        let column = (hash % self.config.n_features as u64) as usize;
        let sign = if self.config.alternate_sign && hash >> 63 == 1 {
            -1.0
        } else {
            1.0
        };
        (column, sign)
    }
}

/// Hash a term with the std hasher's fixed keys, so columns are stable
/// across runs of the same build.
fn hash_term(term: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    term.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vectorizer(config: HashingConfig) -> HashingVectorizer {
        HashingVectorizer::new(Analyzer::default(), config).unwrap()
    }

    #[test]
    fn test_default_dimension() {
        let matrix = vectorizer(HashingConfig::default())
            .transform(&["hello world"])
            .unwrap();
        assert_eq!(matrix.shape(), (1, DEFAULT_N_FEATURES));
        assert!((matrix.row(0).unwrap().l2_norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_text_same_vector() {
        let v = vectorizer(HashingConfig::default());
        assert_eq!(
            v.transform(&["who are you"]).unwrap(),
            v.transform(&["who are you"]).unwrap()
        );
    }

    #[test]
    fn test_unseen_tokens_are_embedded() {
        let v = vectorizer(HashingConfig::default());
        let row = v.transform(&["asdkjhasd"]).unwrap().into_first_row().unwrap();
        assert_eq!(row.nnz(), 1);
    }

    #[test]
    fn test_signs_disabled_gives_counts() {
        let v = vectorizer(HashingConfig {
            n_features: 1,
            alternate_sign: false,
            norm: Norm::None,
        });
        let row = v.transform(&["one two three"]).unwrap().into_first_row().unwrap();
        assert_eq!(row.to_dense(), vec![3.0]);
    }

    #[test]
    fn test_zero_features_rejected() {
        let err = HashingVectorizer::new(
            Analyzer::default(),
            HashingConfig {
                n_features: 0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
