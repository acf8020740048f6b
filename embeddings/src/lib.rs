//! # Embeddings
//!
//! Sparse text embeddings and similarity scoring for QnA Bot.
//!
//! ## Features
//!
//! - **Text Analysis**: Lowercasing, tokenization, stop words and n-grams
//! - **Embedding Models**: TF-IDF, feature hashing and raw counts
//! - **Similarity Metrics**: Cosine plus inverted, min-max scaled distances
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Analyzer ──► EmbeddingModel ──► EmbeddingMatrix                │
//! │                   │                    │                        │
//! │                   ▼                    ▼                        │
//! │      TF-IDF/Hashing/Count      SimilarityMetric ──► argmax      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod analyzer;
pub mod count;
pub mod error;
pub mod hashing;
pub mod model;
pub mod similarity;
pub mod tfidf;
pub mod vector;

pub use analyzer::{Analyzer, AnalyzerConfig};
pub use count::{CountVectorizer, Vocabulary};
pub use error::{EmbeddingError, Result};
pub use hashing::{DEFAULT_N_FEATURES, HashingConfig, HashingVectorizer};
pub use model::{EmbeddingModel, ModelKind, TextEmbedder, VectorizerConfig};
pub use similarity::{SimilarityMetric, SimilarityResult, argmax, cosine_similarity, find_top_k};
pub use tfidf::{TfidfConfig, TfidfVectorizer};
pub use vector::{EmbeddingMatrix, Norm, SparseEmbedding};
