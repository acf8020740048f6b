//! The knowledge base data model.
//!
//! A knowledge base is a list of entries, each holding one or more paraphrased
//! questions and one or more acceptable answers, plus the fallback answers
//! used when no entry is close enough to a query.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{KnowledgeBaseError, Result};
use crate::schema::check_schema;

/// Descriptive metadata about a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseInfo {
    /// Name of the knowledge base.
    pub name: String,

    /// Version string, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Author, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl KnowledgeBaseInfo {
    /// Create metadata with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            author: None,
        }
    }
}

/// One logical question/answer unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QnaEntry {
    /// Paraphrases of the question, in declaration order.
    #[serde(rename = "q")]
    pub questions: Vec<String>,

    /// Acceptable answers.
    #[serde(rename = "a")]
    pub answers: Vec<String>,
}

impl QnaEntry {
    /// Create an entry from its paraphrases and answers.
    pub fn new<Q, A>(questions: Q, answers: A) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            questions: questions.into_iter().map(Into::into).collect(),
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// A question/answer knowledge base.
///
/// The JSON layout is the one QnA Bot knowledge base files use:
///
/// ```json
/// {
///   "info": {"name": "demo", "version": "1.0", "author": "me"},
///   "qna": [{"q": ["Who are you?"], "a": ["I am QnA Bot!"]}],
///   "idk_answers": ["I don't understand"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Descriptive metadata.
    pub info: KnowledgeBaseInfo,

    /// Entries in declaration order. The position of an entry is its id.
    #[serde(rename = "qna")]
    pub entries: Vec<QnaEntry>,

    /// Answers used when no entry matches well enough.
    #[serde(rename = "idk_answers", alias = "no_answer")]
    pub fallback_answers: Vec<String>,
}

impl KnowledgeBase {
    /// Start building a knowledge base in memory.
    pub fn builder(name: impl Into<String>) -> KnowledgeBaseBuilder {
        KnowledgeBaseBuilder::new(name)
    }

    /// Parse and validate a knowledge base from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Validate and convert an already parsed JSON document.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        check_schema(&value)?;
        let kb: Self =
            serde_json::from_value(value).map_err(|e| KnowledgeBaseError::schema(e.to_string()))?;
        kb.validate()?;
        Ok(kb)
    }

    /// Read, parse and validate a knowledge base file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| KnowledgeBaseError::io(path, e))?;
        let kb = Self::from_json_str(&content)?;

        info!(
            "Loaded knowledge base '{}' ({} entries) from {}",
            kb.info.name,
            kb.entries.len(),
            path.display()
        );
        Ok(kb)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the knowledge base to a file as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_json_pretty()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| KnowledgeBaseError::io(parent, e))?;
        }

        fs::write(path, content).map_err(|e| KnowledgeBaseError::io(path, e))?;
        info!("Saved knowledge base '{}' to {}", self.info.name, path.display());
        Ok(())
    }

    /// Check the structural invariants of an in-memory knowledge base.
    ///
    /// Every entry needs at least one question and one answer, and there must
    /// be at least one entry and one fallback answer.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(KnowledgeBaseError::schema(
                "knowledge base must contain at least one entry in 'qna'",
            ));
        }

        for (id, entry) in self.entries.iter().enumerate() {
            if entry.questions.is_empty() {
                return Err(KnowledgeBaseError::schema(format!(
                    "entry {id} has no questions"
                )));
            }
            if entry.answers.is_empty() {
                return Err(KnowledgeBaseError::schema(format!(
                    "entry {id} has no answers"
                )));
            }
            if entry.questions.iter().any(|q| q.trim().is_empty()) {
                warn!("Entry {id} contains a blank question");
            }
        }

        if self.fallback_answers.is_empty() {
            return Err(KnowledgeBaseError::schema(
                "knowledge base must contain at least one answer in 'idk_answers'",
            ));
        }

        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the knowledge base has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: usize) -> Option<&QnaEntry> {
        self.entries.get(id)
    }

    /// Total number of paraphrases across all entries.
    pub fn question_count(&self) -> usize {
        self.entries.iter().map(|e| e.questions.len()).sum()
    }
}

/// Builder for in-memory knowledge bases.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseBuilder {
    info: KnowledgeBaseInfo,
    entries: Vec<QnaEntry>,
    fallback_answers: Vec<String>,
}

impl KnowledgeBaseBuilder {
    /// Create a builder for a knowledge base with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: KnowledgeBaseInfo::new(name),
            entries: Vec::new(),
            fallback_answers: Vec::new(),
        }
    }

    /// Set the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.info.version = Some(version.into());
        self
    }

    /// Set the author.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.info.author = Some(author.into());
        self
    }

    /// Append an entry.
    pub fn entry<Q, A>(mut self, questions: Q, answers: A) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        self.entries.push(QnaEntry::new(questions, answers));
        self
    }

    /// Append a fallback answer.
    pub fn fallback_answer(mut self, answer: impl Into<String>) -> Self {
        self.fallback_answers.push(answer.into());
        self
    }

    /// Validate and build the knowledge base.
    pub fn build(self) -> Result<KnowledgeBase> {
        let kb = KnowledgeBase {
            info: self.info,
            entries: self.entries,
            fallback_answers: self.fallback_answers,
        };
        kb.validate()?;
        Ok(kb)
    }
}
