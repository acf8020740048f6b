//! # Knowledge Base
//!
//! Data model and loading for QnA Bot knowledge bases.
//!
//! - **Model**: [`KnowledgeBase`] of [`QnaEntry`] items plus fallback answers
//! - **Validation**: field-level schema checks before typed decoding
//! - **Sources**: [`KnowledgeBaseSource`] keeps a knowledge base in memory or
//!   re-reads it from disk on every load
//!
//! ```rust,ignore
//! use qnabot_kb::{KnowledgeBase, KnowledgeBaseSource, SourceStrategy};
//!
//! let source = KnowledgeBaseSource::from_path("kb.json", SourceStrategy::Owned)?;
//! let kb = source.load()?;
//! println!("{} entries", kb.len());
//! ```

pub mod error;
pub mod knowledge_base;
pub mod schema;
pub mod source;

pub use error::{KnowledgeBaseError, Result};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseBuilder, KnowledgeBaseInfo, QnaEntry};
pub use schema::check_schema;
pub use source::{KnowledgeBaseSource, SourceStrategy};

const DEFAULT_KNOWLEDGE_BASE: &str = include_str!("../assets/default.json");

/// The knowledge base bundled with the crate.
pub fn default_knowledge_base() -> Result<KnowledgeBase> {
    KnowledgeBase::from_json_str(DEFAULT_KNOWLEDGE_BASE)
}
