//! Domain types shared by the chunker, both indices, fusion and the pipeline.

use serde::{Deserialize, Serialize};

/// Stable, path-like identifier of a repository file (forward slashes,
/// relative to the repository root). The join key for everything downstream.
pub type SourceId = String;

/// A source file as supplied by the document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source_id: SourceId,
    pub content: String,
}

impl Document {
    pub fn new(source_id: impl Into<SourceId>, content: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), content: content.into() }
    }

    /// Extension of the source id without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.source_id.rsplit('/').next().unwrap_or(&self.source_id);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

/// A retrievable piece of exactly one document.
///
/// `source_id` is inherited from the parent document and is not unique
/// across chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_id: SourceId,
    pub content: String,
}

impl Chunk {
    pub fn new(source_id: impl Into<SourceId>, content: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), content: content.into() }
    }
}

/// Indicates which engine produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Dense,
    Sparse,
}

/// One ranked entry returned by an index.
///
/// `score` is engine-specific but higher is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub source_id: SourceId,
    pub score: f32,
    pub source: SourceKind,
}

/// Ordered, duplicate-free list of source ids, most relevant first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    source_ids: Vec<SourceId>,
}

impl RetrievalResult {
    /// Builds a result keeping the first occurrence of every id.
    pub fn from_ranked<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = SourceId>,
    {
        let mut source_ids: Vec<SourceId> = Vec::new();
        for id in ids {
            if !source_ids.contains(&id) {
                source_ids.push(id);
            }
        }
        Self { source_ids }
    }

    pub fn source_ids(&self) -> &[SourceId] {
        &self.source_ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceId> {
        self.source_ids.iter()
    }

    pub fn len(&self) -> usize {
        self.source_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_ids.is_empty()
    }

    pub fn into_inner(self) -> Vec<SourceId> {
        self.source_ids
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a SourceId;
    type IntoIter = std::slice::Iter<'a, SourceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.source_ids.iter()
    }
}

/// Per-request flags controlling the optional pipeline stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub expand_query: bool,
    pub summarize: bool,
    pub verbose: bool,
    pub rebuild_index: bool,
}
