//! Vocabulary building and raw term counts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzer::Analyzer;
use crate::error::{EmbeddingError, Result};
use crate::vector::{EmbeddingMatrix, SparseEmbedding};

/// Terms learned from a corpus, with their document frequencies.
///
/// Columns are assigned in lexicographic term order, so two fits on the same
/// corpus always produce the same layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, usize>,
    document_frequency: Vec<usize>,
    documents: usize,
}

impl Vocabulary {
    /// Learn a vocabulary from already analyzed documents.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let unique: BTreeSet<&str> = documents
            .iter()
            .flat_map(|terms| terms.iter().map(String::as_str))
            .collect();

        let terms: BTreeMap<String, usize> = unique
            .into_iter()
            .enumerate()
            .map(|(column, term)| (term.to_string(), column))
            .collect();

        let mut document_frequency = vec![0usize; terms.len()];
        for doc in documents {
            let seen: BTreeSet<usize> = doc.iter().filter_map(|t| terms.get(t).copied()).collect();
            for column in seen {
                document_frequency[column] += 1;
            }
        }

        Self {
            terms,
            document_frequency,
            documents: documents.len(),
        }
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no terms were learned.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Column of a term.
    pub fn column(&self, term: &str) -> Option<usize> {
        self.terms.get(term).copied()
    }

    /// Number of fit documents containing the term at `column`.
    pub fn document_frequency(&self, column: usize) -> usize {
        self.document_frequency.get(column).copied().unwrap_or(0)
    }

    /// Number of documents the vocabulary was fitted on.
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Terms in column order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Count in-vocabulary terms. Unknown terms are ignored.
    pub fn count(&self, terms: &[String]) -> Result<SparseEmbedding> {
        let mut columns: BTreeMap<usize, f32> = BTreeMap::new();
        for term in terms {
            if let Some(column) = self.column(term) {
                *columns.entry(column).or_insert(0.0) += 1.0;
            }
        }
        SparseEmbedding::from_columns(self.len(), columns)
    }
}

/// Bag-of-words model weighting each term by its raw count.
#[derive(Debug, Clone, Default)]
pub struct CountVectorizer {
    analyzer: Analyzer,
    vocabulary: Option<Vocabulary>,
}

impl CountVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            vocabulary: None,
        }
    }

    /// The fitted vocabulary.
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    /// Learn the vocabulary and return the count matrix of the corpus.
    pub fn fit_transform(&mut self, corpus: &[&str]) -> Result<EmbeddingMatrix> {
        let analyzed: Vec<Vec<String>> = corpus.iter().map(|t| self.analyzer.analyze(t)).collect();
        let vocabulary = Vocabulary::fit(&analyzed);

        if vocabulary.is_empty() {
            warn!("Vocabulary is empty; every text will embed to a zero vector");
        }
        debug!(
            "Fitted vocabulary of {} terms on {} documents",
            vocabulary.len(),
            corpus.len()
        );

        let rows = analyzed
            .iter()
            .map(|terms| vocabulary.count(terms))
            .collect::<Result<Vec<_>>>()?;
        let matrix = EmbeddingMatrix::from_rows(vocabulary.len(), rows)?;
        self.vocabulary = Some(vocabulary);
        Ok(matrix)
    }

    /// Count matrix of `texts` against the fitted vocabulary.
    pub fn transform(&self, texts: &[&str]) -> Result<EmbeddingMatrix> {
        let vocabulary = self.vocabulary.as_ref().ok_or(EmbeddingError::NotFitted)?;
        let rows = texts
            .iter()
            .map(|t| vocabulary.count(&self.analyzer.analyze(t)))
            .collect::<Result<Vec<_>>>()?;
        EmbeddingMatrix::from_rows(vocabulary.len(), rows)
    }
}
