//! # Retrieval Engine
//!
//! Answers questions from a QnA Bot knowledge base:
//!
//! - **Reference Index**: every paraphrase flattened in entry-major order
//! - **Embedding**: paraphrases and queries embedded with one fitted model
//! - **Matching**: best paraphrase by the configured similarity metric
//! - **Answer Selection**: random answer of the matched entry, or a fallback
//!   answer below the minimum score
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          QnaBot                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  KnowledgeBaseSource ──► ReferenceIndex ──► EmbeddingModel      │
//! │                                                  │              │
//! │                                                  ▼              │
//! │  query ──► transform ──► SimilarityMetric ──► argmax            │
//! │                                                  │              │
//! │                                                  ▼              │
//! │                                           AnswerSelector        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qnabot_retrieval::{BotConfig, QnaBot};
//!
//! let mut bot = QnaBot::new(BotConfig::default().with_metric("euclidean"))?;
//! bot.fit(std::path::Path::new("kb.json"))?;
//!
//! let answer = bot.answer("Who are you?")?;
//! println!("{} ({:.2})", answer.text, answer.score);
//! ```

pub mod answer;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;

pub use answer::{Answer, AnswerSelector};
pub use config::{BotConfig, DEFAULT_MIN_SCORE};
pub use engine::{QnaBot, RankedQuestion};
pub use error::{Result, RetrievalError};
pub use index::ReferenceIndex;

// Re-export from dependencies for convenience
pub use qnabot_embeddings::{ModelKind, SimilarityMetric};
pub use qnabot_kb::{KnowledgeBase, KnowledgeBaseSource, SourceStrategy};
