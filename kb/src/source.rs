//! Where a knowledge base comes from, and whether it is held in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::knowledge_base::KnowledgeBase;

/// How a knowledge base source is retained between loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Parsed once and kept in memory.
    Owned,
    /// Only the file path is kept; every load re-reads the file.
    #[default]
    ByReference,
}

/// A knowledge base source, either held in memory or re-read from disk.
///
/// The strategy is fixed at construction: [`KnowledgeBaseSource::load`]
/// hands out the cached copy for `Owned` and re-reads the file for
/// `ByReference`, so edits to the file become visible on the next load.
#[derive(Debug, Clone)]
pub enum KnowledgeBaseSource {
    /// An in-memory knowledge base.
    Owned(Arc<KnowledgeBase>),
    /// A knowledge base file that is read on every load.
    ByReference(PathBuf),
}

impl KnowledgeBaseSource {
    /// Wrap an in-memory knowledge base.
    pub fn owned(kb: KnowledgeBase) -> Self {
        Self::Owned(Arc::new(kb))
    }

    /// Refer to a knowledge base file without reading it yet.
    pub fn by_reference(path: impl Into<PathBuf>) -> Self {
        Self::ByReference(path.into())
    }

    /// Open a knowledge base file with the given strategy.
    ///
    /// `Owned` reads and validates the file immediately.
    pub fn from_path(path: impl AsRef<Path>, strategy: SourceStrategy) -> Result<Self> {
        let path = path.as_ref();
        match strategy {
            SourceStrategy::Owned => Ok(Self::owned(KnowledgeBase::load(path)?)),
            SourceStrategy::ByReference => Ok(Self::by_reference(path)),
        }
    }

    /// The strategy of this source.
    pub fn strategy(&self) -> SourceStrategy {
        match self {
            Self::Owned(_) => SourceStrategy::Owned,
            Self::ByReference(_) => SourceStrategy::ByReference,
        }
    }

    /// The backing file, for `ByReference` sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Owned(_) => None,
            Self::ByReference(path) => Some(path),
        }
    }

    /// Produce a validated knowledge base snapshot.
    pub fn load(&self) -> Result<Arc<KnowledgeBase>> {
        match self {
            Self::Owned(kb) => {
                kb.validate()?;
                Ok(Arc::clone(kb))
            }
            Self::ByReference(path) => {
                debug!("Reloading knowledge base from {}", path.display());
                Ok(Arc::new(KnowledgeBase::load(path)?))
            }
        }
    }
}

impl From<KnowledgeBase> for KnowledgeBaseSource {
    fn from(kb: KnowledgeBase) -> Self {
        Self::owned(kb)
    }
}

impl From<Arc<KnowledgeBase>> for KnowledgeBaseSource {
    fn from(kb: Arc<KnowledgeBase>) -> Self {
        Self::Owned(kb)
    }
}

impl From<PathBuf> for KnowledgeBaseSource {
    fn from(path: PathBuf) -> Self {
        Self::by_reference(path)
    }
}

impl From<&Path> for KnowledgeBaseSource {
    fn from(path: &Path) -> Self {
        Self::by_reference(path)
    }
}
