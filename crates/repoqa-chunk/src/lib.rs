//! repoqa-chunk
//!
//! Splits documents into retrievable chunks: syntax-aware for languages with
//! a tree-sitter grammar, recursive text splitting for everything else.

pub mod language;
pub mod recursive;
pub mod structural;

use tracing::{debug, warn};

use repoqa_core::error::{Error, Result};
use repoqa_core::types::{Chunk, Document};

pub use language::{splitter_config, Language, SplitterConfig};

/// Stateless chunker; the extension table it consults is static.
#[derive(Debug, Default, Clone, Copy)]
pub struct Chunker;

impl Chunker {
    pub fn new() -> Self {
        Self
    }

    /// Chunks one document.
    ///
    /// Fails with [`Error::EmptyInput`] on empty content. Any other input
    /// yields at least one chunk, each carrying the document's `source_id`.
    pub fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if document.content.is_empty() {
            return Err(Error::EmptyInput(format!("document {} has no content", document.source_id)));
        }
        let ext = document.extension();
        let language = ext.and_then(Language::from_extension);

        let mut pieces = match language.and_then(|lang| structural::split(&document.content, lang)) {
            Some(pieces) if !pieces.is_empty() => pieces,
            _ => recursive::split(&document.content, splitter_config(ext)),
        };
        if pieces.is_empty() {
            debug!(source_id = %document.source_id, "no split points, keeping whole document");
            pieces.push(document.content.clone());
        }
        Ok(pieces
            .into_iter()
            .map(|content| Chunk { source_id: document.source_id.clone(), content })
            .collect())
    }

    /// Chunks a whole pool, skipping empty documents.
    pub fn chunk_all(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for doc in documents {
            match self.chunk(doc) {
                Ok(mut c) => chunks.append(&mut c),
                Err(Error::EmptyInput(reason)) => warn!(%reason, "skipping document"),
                Err(e) => return Err(e),
            }
        }
        if chunks.is_empty() {
            return Err(Error::EmptyInput("document pool produced no chunks".to_string()));
        }
        debug!(documents = documents.len(), chunks = chunks.len(), "chunked document pool");
        Ok(chunks)
    }
}
