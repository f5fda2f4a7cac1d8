//! Assembles a ready [`Pipeline`] from configuration.
//!
//! Documents are listed and chunked on every open. The sparse index is always
//! rebuilt in memory; the dense index is loaded from disk when it was built
//! from the same chunks (ids and text) and rebuilt, then saved, otherwise.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use repoqa_chunk::Chunker;
use repoqa_core::config::{expand_path, RetrievalSettings, Settings};
use repoqa_core::error::{Error, Result};
use repoqa_core::repository::LocalRepository;
use repoqa_core::traits::{AnswerSynthesizer, ContentProvider, DocumentSource, Embedder, QueryRewriter};
use repoqa_core::types::Chunk;
use repoqa_embed::get_default_embedder;
use repoqa_hybrid::FusionRetriever;
use repoqa_text::SparseIndex;
use repoqa_vector::DenseIndex;

use crate::pipeline::Pipeline;

/// Collaborators an engine is built from.
pub struct EngineParts {
    pub source: Arc<dyn DocumentSource>,
    pub content: Arc<dyn ContentProvider>,
    pub embedder: Arc<dyn Embedder>,
    pub rewriter: Arc<dyn QueryRewriter>,
    pub synthesizer: Arc<dyn AnswerSynthesizer>,
}

/// How the dense index came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenseOrigin {
    Loaded,
    Built,
}

pub struct Engine {
    pipeline: Pipeline,
    documents: usize,
    chunks: usize,
    dense_origin: DenseOrigin,
}

impl Engine {
    /// Opens the engine described by `settings`: local repository, configured
    /// embedder and the chat-completions client.
    pub async fn open(settings: &Settings, rebuild_index: bool) -> Result<Self> {
        settings.validate()?;
        let repo = Arc::new(LocalRepository::new(expand_path(&settings.repo.root)));
        let embedder = get_default_embedder(&settings.embed)
            .map_err(|e| Error::ExternalService(format!("loading embedder: {e:#}")))?;
        let (expander, summarizer) =
            repoqa_llm::from_settings(&settings.llm).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let parts = EngineParts {
            source: repo.clone(),
            content: repo,
            embedder,
            rewriter: Arc::new(expander),
            synthesizer: Arc::new(summarizer),
        };
        let index_dir = expand_path(&settings.index.dir);
        Self::assemble(parts, &settings.retrieval, &index_dir, settings.embed.batch_size, rebuild_index).await
    }

    pub async fn assemble(
        parts: EngineParts,
        retrieval: &RetrievalSettings,
        index_dir: &Path,
        batch_size: usize,
        rebuild_index: bool,
    ) -> Result<Self> {
        let documents = parts.source.list_documents()?;
        if documents.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let chunks = Chunker::new().chunk_all(&documents)?;
        info!(documents = documents.len(), chunks = chunks.len(), "chunked repository");

        let sparse = SparseIndex::build(&chunks)?;
        let (dense, dense_origin) =
            load_or_build(&chunks, parts.embedder, index_dir, batch_size, rebuild_index).await?;
        let retriever = FusionRetriever::from_settings(Arc::new(dense), Arc::new(sparse), retrieval)?;

        Ok(Self {
            pipeline: Pipeline::new(Arc::new(retriever), parts.rewriter, parts.synthesizer, parts.content),
            documents: documents.len(),
            chunks: chunks.len(),
            dense_origin,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn dense_origin(&self) -> DenseOrigin {
        self.dense_origin
    }
}

async fn load_or_build(
    chunks: &[Chunk],
    embedder: Arc<dyn Embedder>,
    index_dir: &Path,
    batch_size: usize,
    rebuild: bool,
) -> Result<(DenseIndex, DenseOrigin)> {
    if !rebuild {
        match DenseIndex::load(index_dir, embedder.clone()).await {
            Ok(index) if index.matches(chunks) => return Ok((index, DenseOrigin::Loaded)),
            Ok(index) => warn!(stored = index.len(), current = chunks.len(), "dense index is stale, rebuilding"),
            Err(e) => warn!(error = %e, "could not load dense index, rebuilding"),
        }
    }
    let index = DenseIndex::build_batched(chunks, embedder, batch_size).await?;
    index.save(index_dir).await?;
    Ok((index, DenseOrigin::Built))
}
