//! TF-IDF weighting on top of a learned vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::Analyzer;
use crate::count::{CountVectorizer, Vocabulary};
use crate::error::{EmbeddingError, Result};
use crate::vector::{EmbeddingMatrix, Norm, SparseEmbedding};

/// Configuration for TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    /// Add one to document frequencies, as if an extra document contained
    /// every term once. Prevents zero divisions.
    pub smooth_idf: bool,

    /// Replace `tf` with `1 + ln(tf)`.
    pub sublinear_tf: bool,

    /// Row normalization.
    pub norm: Norm,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            smooth_idf: true,
            sublinear_tf: false,
            norm: Norm::L2,
        }
    }
}

/// Term frequency times inverse document frequency, row normalized.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    counts: CountVectorizer,
    config: TfidfConfig,
    idf: Option<Vec<f32>>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(analyzer: Analyzer, config: TfidfConfig) -> Self {
        Self {
            counts: CountVectorizer::new(analyzer),
            config,
            idf: None,
        }
    }

    /// The fitted vocabulary.
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.counts.vocabulary()
    }

    /// Inverse document frequency per column.
    pub fn idf(&self) -> Option<&[f32]> {
        self.idf.as_deref()
    }

    /// Learn vocabulary and IDF weights, and return the weighted corpus.
    pub fn fit_transform(&mut self, corpus: &[&str]) -> Result<EmbeddingMatrix> {
        let counts = self.counts.fit_transform(corpus)?;
        let vocabulary = self.counts.vocabulary().ok_or(EmbeddingError::NotFitted)?;

        let idf = compute_idf(vocabulary, self.config.smooth_idf);
        debug!("Computed IDF weights for {} terms", idf.len());

        let matrix = self.weight(counts, &idf)?;
        self.idf = Some(idf);
        Ok(matrix)
    }

    /// Weight `texts` with the fitted vocabulary and IDF.
    pub fn transform(&self, texts: &[&str]) -> Result<EmbeddingMatrix> {
        let idf = self.idf.as_ref().ok_or(EmbeddingError::NotFitted)?;
        let counts = self.counts.transform(texts)?;
        self.weight(counts, idf)
    }

    fn weight(&self, counts: EmbeddingMatrix, idf: &[f32]) -> Result<EmbeddingMatrix> {
        let dimension = counts.dimension();
        let mut weighted = EmbeddingMatrix::new(dimension);

        for row in counts.rows() {
            let columns: BTreeMap<usize, f32> = row
                .entries()
                .iter()
                .map(|&(column, tf)| {
                    let tf = if self.config.sublinear_tf {
                        1.0 + tf.ln()
                    } else {
                        tf
                    };
                    (column, tf * idf[column])
                })
                .collect();

            let mut vector = SparseEmbedding::from_columns(dimension, columns)?;
            vector.normalize(self.config.norm);
            weighted.push(vector)?;
        }

        Ok(weighted)
    }
}

fn compute_idf(vocabulary: &Vocabulary, smooth: bool) -> Vec<f32> {
    let smoothing = if smooth { 1.0 } else { 0.0 };
    let n = vocabulary.documents() as f64 + smoothing;

    (0..vocabulary.len())
        .map(|column| {
            let df = vocabulary.document_frequency(column) as f64 + smoothing;
            ((n / df).ln() + 1.0) as f32
        })
        .collect()
}
