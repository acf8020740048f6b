//! Similarity computation between a query and a reference matrix.
//!
//! Every metric produces scores where larger means more similar. Cosine is
//! used as-is; the distance metrics are min-max scaled across the reference
//! rows and inverted.

use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};
use crate::vector::{EmbeddingMatrix, SparseEmbedding};

/// Supported similarity metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Cosine of the angle between vectors, in [-1, 1].
    #[default]
    Cosine,
    /// Straight-line distance.
    Euclidean,
    /// L1 distance.
    Manhattan,
    /// Great-circle distance on the first two dimensions, read as
    /// latitude and longitude in radians. Not meaningful for text.
    Haversine,
}

impl SimilarityMetric {
    /// Every supported identifier, in declaration order.
    pub const NAMES: &[&str] = &["cosine", "euclidean", "manhattan", "haversine"];

    /// All variants.
    pub const ALL: [SimilarityMetric; 4] = [
        SimilarityMetric::Cosine,
        SimilarityMetric::Euclidean,
        SimilarityMetric::Manhattan,
        SimilarityMetric::Haversine,
    ];

    /// The identifier of this metric.
    pub fn as_str(self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Euclidean => "euclidean",
            SimilarityMetric::Manhattan => "manhattan",
            SimilarityMetric::Haversine => "haversine",
        }
    }

    /// Whether raw values are distances that need inverting.
    pub fn is_distance(self) -> bool {
        !matches!(self, SimilarityMetric::Cosine)
    }

    /// Raw metric value between two vectors.
    pub fn raw(self, a: &SparseEmbedding, b: &SparseEmbedding) -> Result<f64> {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(a, b),
            SimilarityMetric::Euclidean => euclidean_distance(a, b),
            SimilarityMetric::Manhattan => manhattan_distance(a, b),
            SimilarityMetric::Haversine => haversine_distance(a, b),
        }
    }

    /// Score `query` against every row of `references`.
    pub fn scores(self, query: &SparseEmbedding, references: &EmbeddingMatrix) -> Result<Vec<f32>> {
        if query.dimension() != references.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: references.dimension(),
                actual: query.dimension(),
            });
        }

        let raw = references
            .rows()
            .iter()
            .map(|row| self.raw(query, row))
            .collect::<Result<Vec<_>>>()?;

        if self.is_distance() {
            Ok(invert_distances(&raw))
        } else {
            Ok(raw.into_iter().map(|s| s as f32).collect())
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self> {
        SimilarityMetric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| EmbeddingError::Unsupported {
                name: "similarity_metric",
                value: s.to_string(),
                options: SimilarityMetric::NAMES,
            })
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the cosine similarity between two vectors.
///
/// Returns a value between -1.0 and 1.0. A zero vector on either side gives 0.0.
pub fn cosine_similarity(a: &SparseEmbedding, b: &SparseEmbedding) -> Result<f64> {
    let dot = a.dot(b)?;
    let magnitude = a.l2_norm() * b.l2_norm();

    if magnitude == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / magnitude)
}

/// Compute the euclidean distance between two vectors.
pub fn euclidean_distance(a: &SparseEmbedding, b: &SparseEmbedding) -> Result<f64> {
    let mut sum = 0.0;
    a.for_each_pair(b, |x, y| sum += (x - y).powi(2))?;
    Ok(sum.sqrt())
}

/// Compute the manhattan (L1) distance between two vectors.
pub fn manhattan_distance(a: &SparseEmbedding, b: &SparseEmbedding) -> Result<f64> {
    let mut sum = 0.0;
    a.for_each_pair(b, |x, y| sum += (x - y).abs())?;
    Ok(sum)
}

/// Compute the haversine distance between two vectors, reading dimension 0
/// as latitude and dimension 1 as longitude in radians.
pub fn haversine_distance(a: &SparseEmbedding, b: &SparseEmbedding) -> Result<f64> {
    if a.dimension() != b.dimension() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.dimension(),
            actual: b.dimension(),
        });
    }

    let (lat1, lon1) = (f64::from(a.get(0)), f64::from(a.get(1)));
    let (lat2, lon2) = (f64::from(b.get(0)), f64::from(b.get(1)));

    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    Ok(2.0 * h.sqrt().clamp(0.0, 1.0).asin())
}

/// Relative spread below which distances are treated as equal.
const ZERO_RANGE_TOLERANCE: f64 = 10.0 * f32::EPSILON as f64;

/// Min-max scale distances into [0, 1] and invert them.
///
/// When every distance is equal the range is zero and every row scores 1.0.
/// Embeddings are stored as `f32`, so a range within `f32` rounding of zero
/// counts as zero.
pub fn invert_distances(distances: &[f64]) -> Vec<f32> {
    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let tolerance = ZERO_RANGE_TOLERANCE * max.abs().max(1.0);

    distances
        .iter()
        .map(|&d| {
            if range > tolerance {
                (1.0 - (d - min) / range) as f32
            } else {
                1.0
            }
        })
        .collect()
}

/// A scored reference row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Row in the reference matrix.
    pub row: usize,

    /// Similarity score.
    pub score: f32,
}

impl SimilarityResult {
    pub fn new(row: usize, score: f32) -> Self {
        Self { row, score }
    }
}

/// Row with the highest score. The lowest row wins exact ties.
pub fn argmax(scores: &[f32]) -> Option<SimilarityResult> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<SimilarityResult>, (row, &score)| match best {
            Some(b) if OrderedFloat(score) <= OrderedFloat(b.score) => Some(b),
            _ => Some(SimilarityResult::new(row, score)),
        })
}

/// The `k` highest-scoring rows, best first. Ties keep row order.
pub fn find_top_k(scores: &[f32], k: usize) -> Vec<SimilarityResult> {
    let mut ranked: Vec<SimilarityResult> = scores
        .iter()
        .enumerate()
        .map(|(row, &score)| SimilarityResult::new(row, score))
        .collect();

    // Stable sort, so equal scores stay in row order
    ranked.sort_by(|a, b| OrderedFloat(b.score).cmp(&OrderedFloat(a.score)));
    ranked.truncate(k);
    ranked
}
