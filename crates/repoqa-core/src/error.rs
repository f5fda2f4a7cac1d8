use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Chunking an empty document, or an empty document pool.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Building an index over zero chunks.
    #[error("Cannot build an index over an empty chunk pool")]
    EmptyIndex,

    #[error("Failed to load index from {}: {reason}", path.display())]
    IndexLoad { path: PathBuf, reason: String },

    /// Dense or sparse search failed; never degraded to the other engine.
    #[error("Retrieval failed: {0}")]
    RetrievalService(String),

    /// Embedding, expansion or synthesis call failed.
    #[error("External service failed: {0}")]
    ExternalService(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn index_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::IndexLoad { path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
