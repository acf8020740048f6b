//! Sparse embedding vectors and matrices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Row normalization applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    /// Divide by the sum of absolute values.
    L1,
    /// Divide by the euclidean length.
    #[default]
    L2,
    /// Leave the row as is.
    None,
}

/// A sparse vector: sorted `(column, value)` pairs over a fixed dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseEmbedding {
    dimension: usize,
    entries: Vec<(usize, f32)>,
}

impl SparseEmbedding {
    /// An all-zero vector.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build from column values. Zero values are dropped.
    pub fn from_columns(dimension: usize, columns: BTreeMap<usize, f32>) -> Result<Self> {
        if let Some((&column, _)) = columns.last_key_value() {
            if column >= dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: column + 1,
                });
            }
        }

        Ok(Self {
            dimension,
            entries: columns.into_iter().filter(|(_, v)| *v != 0.0).collect(),
        })
    }

    /// Build from a dense slice.
    pub fn from_dense(values: &[f32]) -> Self {
        Self {
            dimension: values.len(),
            entries: values
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, v)| *v != 0.0)
                .collect(),
        }
    }

    /// Declared dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored non-zero values.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Whether every value is zero.
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored `(column, value)` pairs in column order.
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    /// Value at a column (zero when not stored).
    pub fn get(&self, column: usize) -> f32 {
        self.entries
            .binary_search_by_key(&column, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Expand to a dense vector.
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0f32; self.dimension];
        for &(column, value) in &self.entries {
            dense[column] = value;
        }
        dense
    }

    /// Dot product with another vector of the same dimension.
    pub fn dot(&self, other: &Self) -> Result<f64> {
        self.check_dimension(other)?;

        let mut sum = 0.0f64;
        let (mut i, mut j) = (0, 0);
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, va) = self.entries[i];
            let (cb, vb) = other.entries[j];
            match ca.cmp(&cb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += f64::from(va) * f64::from(vb);
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(sum)
    }

    /// Euclidean length.
    pub fn l2_norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|(_, v)| f64::from(*v) * f64::from(*v))
            .sum::<f64>()
            .sqrt()
    }

    /// Sum of absolute values.
    pub fn l1_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| f64::from(v.abs())).sum()
    }

    /// Scale the vector in place to unit norm. Zero vectors are left alone.
    pub fn normalize(&mut self, norm: Norm) {
        let magnitude = match norm {
            Norm::L1 => self.l1_norm(),
            Norm::L2 => self.l2_norm(),
            Norm::None => return,
        };

        if magnitude > 0.0 {
            for (_, value) in &mut self.entries {
                *value = (f64::from(*value) / magnitude) as f32;
            }
        }
    }

    /// Apply `f` to every aligned pair of values where at least one side is non-zero.
    pub fn for_each_pair(&self, other: &Self, mut f: impl FnMut(f64, f64)) -> Result<()> {
        self.check_dimension(other)?;

        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            let ca = a.get(i).map(|(c, _)| *c).unwrap_or(usize::MAX);
            let cb = b.get(j).map(|(c, _)| *c).unwrap_or(usize::MAX);
            if ca < cb {
                f(f64::from(a[i].1), 0.0);
                i += 1;
            } else if cb < ca {
                f(0.0, f64::from(b[j].1));
                j += 1;
            } else {
                f(f64::from(a[i].1), f64::from(b[j].1));
                i += 1;
                j += 1;
            }
        }
        Ok(())
    }

    fn check_dimension(&self, other: &Self) -> Result<()> {
        if self.dimension != other.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }
        Ok(())
    }
}

/// Rows of sparse embeddings sharing one dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dimension: usize,
    rows: Vec<SparseEmbedding>,
}

impl EmbeddingMatrix {
    /// An empty matrix with the given column count.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: Vec::new(),
        }
    }

    /// Build from rows, checking that every row has `dimension` columns.
    pub fn from_rows(dimension: usize, rows: Vec<SparseEmbedding>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.dimension() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.dimension(),
            });
        }
        Ok(Self { dimension, rows })
    }

    /// Append a row.
    pub fn push(&mut self, row: SparseEmbedding) -> Result<()> {
        if row.dimension() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: row.dimension(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column count.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.dimension)
    }

    /// Borrow a row.
    pub fn row(&self, index: usize) -> Option<&SparseEmbedding> {
        self.rows.get(index)
    }

    /// All rows.
    pub fn rows(&self) -> &[SparseEmbedding] {
        &self.rows
    }

    /// Take the first row, for single-text batches.
    pub fn into_first_row(self) -> Option<SparseEmbedding> {
        self.rows.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_dense_drops_zeros() {
        let v = SparseEmbedding::from_dense(&[0.0, 2.0, 0.0, -1.0]);
        assert_eq!(v.dimension(), 4);
        assert_eq!(v.entries(), &[(1, 2.0), (3, -1.0)]);
        assert_eq!(v.get(3), -1.0);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, -1.0]);
    }

    #[test]
    fn test_from_columns_rejects_out_of_range() {
        let columns = BTreeMap::from([(5usize, 1.0f32)]);
        assert!(SparseEmbedding::from_columns(3, columns).is_err());
    }

    #[test]
    fn test_dot() {
        let a = SparseEmbedding::from_dense(&[1.0, 0.0, 3.0]);
        let b = SparseEmbedding::from_dense(&[2.0, 5.0, 1.0]);
        assert_eq!(a.dot(&b).unwrap(), 5.0);
    }

    #[test]
    fn test_dot_dimension_mismatch() {
        let a = SparseEmbedding::from_dense(&[1.0, 0.0]);
        let b = SparseEmbedding::from_dense(&[1.0, 0.0, 0.0]);
        assert!(a.dot(&b).is_err());
    }

    #[test]
    fn test_normalize_l2() {
        let mut v = SparseEmbedding::from_dense(&[3.0, 4.0]);
        v.normalize(Norm::L2);
        assert!((v.get(0) - 0.6).abs() < 1e-6);
        assert!((v.get(1) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_l1_and_none() {
        let mut v = SparseEmbedding::from_dense(&[1.0, -3.0]);
        v.normalize(Norm::L1);
        assert_eq!(v.to_dense(), vec![0.25, -0.75]);

        let mut w = SparseEmbedding::from_dense(&[1.0, -3.0]);
        w.normalize(Norm::None);
        assert_eq!(w.to_dense(), vec![1.0, -3.0]);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = SparseEmbedding::zeros(4);
        v.normalize(Norm::L2);
        assert!(v.is_zero());
    }

    #[test]
    fn test_for_each_pair_visits_union() {
        let a = SparseEmbedding::from_dense(&[1.0, 0.0, 2.0, 0.0]);
        let b = SparseEmbedding::from_dense(&[0.0, 3.0, 4.0, 0.0]);

        let mut pairs = Vec::new();
        a.for_each_pair(&b, |x, y| pairs.push((x, y))).unwrap();
        assert_eq!(pairs, vec![(1.0, 0.0), (0.0, 3.0), (2.0, 4.0)]);
    }

    #[test]
    fn test_matrix_rejects_wrong_row_dimension() {
        let mut matrix = EmbeddingMatrix::new(2);
        matrix.push(SparseEmbedding::zeros(2)).unwrap();
        assert!(matrix.push(SparseEmbedding::zeros(3)).is_err());
        assert_eq!(matrix.shape(), (1, 2));
    }
}
