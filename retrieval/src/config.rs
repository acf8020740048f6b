//! Configuration for the QnA bot.

use std::fs;
use std::path::{Path, PathBuf};

use qnabot_embeddings::{AnalyzerConfig, ModelKind, SimilarityMetric, VectorizerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, RetrievalError};

/// Default minimum score below which the fallback answers are used.
pub const DEFAULT_MIN_SCORE: f32 = 0.25;

/// Configuration for a [`crate::QnaBot`].
///
/// Model and metric are kept as identifiers so that a configuration file
/// with an unsupported value still loads and the error is reported when the
/// engine is built, with the list of supported values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Embedding strategy identifier (`tfidf`, `murmurhash` or `count`).
    pub model_name: String,

    /// Similarity metric identifier (`cosine`, `euclidean`, `manhattan` or
    /// `haversine`).
    pub similarity_metric: String,

    /// Scores strictly below this select a fallback answer.
    pub min_score: f32,

    /// Seed for answer selection. Unset means seeded from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Analyzer and vectorizer options.
    pub vectorizer: VectorizerConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            model_name: ModelKind::default().to_string(),
            similarity_metric: SimilarityMetric::default().to_string(),
            min_score: DEFAULT_MIN_SCORE,
            seed: None,
            vectorizer: VectorizerConfig::default(),
        }
    }
}

impl BotConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding strategy.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    /// Set the similarity metric.
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.similarity_metric = metric.into();
        self
    }

    /// Set the fallback threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Seed answer selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the analyzer options.
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.vectorizer.analyzer = analyzer;
        self
    }

    /// Set all vectorizer options.
    pub fn with_vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    /// Parse the embedding strategy.
    pub fn model_kind(&self) -> Result<ModelKind> {
        Ok(self.model_name.parse()?)
    }

    /// Parse the similarity metric.
    pub fn metric(&self) -> Result<SimilarityMetric> {
        Ok(self.similarity_metric.parse()?)
    }

    /// Check identifiers and the threshold.
    pub fn validate(&self) -> Result<()> {
        self.model_kind()?;
        self.metric()?;
        if !self.min_score.is_finite() {
            return Err(RetrievalError::Config(format!(
                "min_score must be a finite number, {} was given instead",
                self.min_score
            )));
        }
        Ok(())
    }

    /// Default config file location: `<config dir>/qnabot/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qnabot").join("config.toml"))
    }

    /// Read a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RetrievalError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&text).map_err(|source| RetrievalError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded bot config from {}", path.display());
        Ok(config)
    }

    /// Read `path` when given, else the default location when it exists,
    /// else fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => Self::load(path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| RetrievalError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, toml::to_string_pretty(self)?).map_err(io_err)?;
        Ok(())
    }
}
