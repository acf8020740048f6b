//! Text embedding models.
//!
//! Three interchangeable strategies sit behind the [`TextEmbedder`] trait:
//! TF-IDF, feature hashing and raw counts. [`EmbeddingModel`] is the closed
//! set the rest of the system dispatches over.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{Analyzer, AnalyzerConfig};
use crate::count::CountVectorizer;
use crate::error::{EmbeddingError, Result};
use crate::hashing::{HashingConfig, HashingVectorizer};
use crate::tfidf::{TfidfConfig, TfidfVectorizer};
use crate::vector::EmbeddingMatrix;

/// Anything that turns batches of text into vectors consistently between fit
/// time and query time.
pub trait TextEmbedder: Send + Sync {
    /// Identifier of the strategy.
    fn name(&self) -> &'static str;

    /// Learn whatever the strategy needs from `corpus` and embed it.
    fn fit_transform(&mut self, corpus: &[&str]) -> Result<EmbeddingMatrix>;

    /// Embed `texts` with the fitted state.
    fn transform(&self, texts: &[&str]) -> Result<EmbeddingMatrix>;

    /// Whether `transform` can be called.
    fn is_fitted(&self) -> bool;
}

/// Supported embedding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Vocabulary-weighted TF-IDF.
    #[default]
    #[serde(rename = "tfidf")]
    TfIdf,
    /// Feature hashing.
    MurmurHash,
    /// Raw term counts.
    Count,
}

impl ModelKind {
    /// Every supported identifier, in declaration order.
    pub const NAMES: &[&str] = &["tfidf", "murmurhash", "count"];

    /// All variants.
    pub const ALL: [ModelKind; 3] = [ModelKind::TfIdf, ModelKind::MurmurHash, ModelKind::Count];

    /// The identifier of this strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::TfIdf => "tfidf",
            ModelKind::MurmurHash => "murmurhash",
            ModelKind::Count => "count",
        }
    }
}

impl FromStr for ModelKind {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EmbeddingError::Unsupported {
                name: "model_name",
                value: s.to_string(),
                options: ModelKind::NAMES,
            })
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ModelKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Options forwarded to whichever strategy is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Tokenization options shared by every strategy.
    pub analyzer: AnalyzerConfig,

    /// TF-IDF options.
    pub tfidf: TfidfConfig,

    /// Hashing options.
    pub hashing: HashingConfig,
}

/// A fresh embedding model of one of the supported strategies.
#[derive(Debug, Clone)]
pub enum EmbeddingModel {
    TfIdf(TfidfVectorizer),
    Hashing(HashingVectorizer),
    Count(CountVectorizer),
}

impl EmbeddingModel {
    /// Build an unfitted model.
    pub fn new(kind: ModelKind, config: &VectorizerConfig) -> Result<Self> {
        let analyzer = Analyzer::new(&config.analyzer)?;
        debug!("Building {kind} embedding model");

        Ok(match kind {
            ModelKind::TfIdf => Self::TfIdf(TfidfVectorizer::new(analyzer, config.tfidf)),
            ModelKind::MurmurHash => {
                Self::Hashing(HashingVectorizer::new(analyzer, config.hashing)?)
            }
            ModelKind::Count => Self::Count(CountVectorizer::new(analyzer)),
        })
    }

    /// Strategy of this model.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::TfIdf(_) => ModelKind::TfIdf,
            Self::Hashing(_) => ModelKind::MurmurHash,
            Self::Count(_) => ModelKind::Count,
        }
    }
}

impl TextEmbedder for EmbeddingModel {
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn fit_transform(&mut self, corpus: &[&str]) -> Result<EmbeddingMatrix> {
        match self {
            Self::TfIdf(v) => v.fit_transform(corpus),
            Self::Hashing(v) => v.transform(corpus),
            Self::Count(v) => v.fit_transform(corpus),
        }
    }

    fn transform(&self, texts: &[&str]) -> Result<EmbeddingMatrix> {
        match self {
            Self::TfIdf(v) => v.transform(texts),
            Self::Hashing(v) => v.transform(texts),
            Self::Count(v) => v.transform(texts),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Self::TfIdf(v) => v.idf().is_some(),
            Self::Hashing(_) => true,
            Self::Count(v) => v.vocabulary().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_model_kind() {
        assert_eq!("tfidf".parse::<ModelKind>().unwrap(), ModelKind::TfIdf);
        assert_eq!("murmurhash".parse::<ModelKind>().unwrap(), ModelKind::MurmurHash);
        assert_eq!("count".parse::<ModelKind>().unwrap(), ModelKind::Count);
    }

    #[test]
    fn test_unsupported_model_kind() {
        let err = "tensorflow".parse::<ModelKind>().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "tensorflow is not a valid model_name. Must be either tfidf, murmurhash or count"
        );
    }

    #[test]
    fn test_names_match_variants() {
        let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ModelKind::NAMES);
    }

    #[test]
    fn test_fit_state_per_strategy() {
        let config = VectorizerConfig::default();
        for kind in ModelKind::ALL {
            let mut model = EmbeddingModel::new(kind, &config).unwrap();
            assert_eq!(model.is_fitted(), kind == ModelKind::MurmurHash);

            let matrix = model.fit_transform(&["who are you", "what is your name"]).unwrap();
            assert_eq!(matrix.len(), 2);
            assert!(model.is_fitted());
            assert_eq!(model.name(), kind.as_str());
        }
    }

    #[test]
    fn test_hashing_fit_transform_matches_transform() {
        let mut model = EmbeddingModel::new(ModelKind::MurmurHash, &VectorizerConfig::default())
            .unwrap();
        let fitted = model.fit_transform(&["who are you"]).unwrap();
        assert_eq!(fitted, model.transform(&["who are you"]).unwrap());
    }

    #[test]
    fn test_count_model_is_not_normalized() {
        let mut model = EmbeddingModel::new(ModelKind::Count, &VectorizerConfig::default()).unwrap();
        let matrix = model.fit_transform(&["go go go"]).unwrap();
        assert_eq!(matrix.row(0).unwrap().to_dense(), vec![3.0]);
    }
}
