//! Exact flat L2 index over chunk embeddings.
//!
//! Vectors live in one row-major buffer, in chunk order. Search is a linear
//! scan followed by a stable sort on squared distance, so equal distances
//! keep insertion order.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use repoqa_core::error::{Error, Result};
use repoqa_core::traits::{DenseSearcher, Embedder};
use repoqa_core::types::{Chunk, SearchHit, SourceId, SourceKind};

/// Embedded once per build or load to learn the dimensionality.
const SENTINEL: &str = "hello world";

pub const DEFAULT_BATCH_SIZE: usize = 32;

pub struct DenseIndex {
    pub(crate) embedder: Arc<dyn Embedder>,
    pub(crate) dim: usize,
    pub(crate) vectors: Vec<f32>,
    pub(crate) source_ids: Vec<SourceId>,
    /// blake3 of each chunk's text, parallel to `source_ids`.
    pub(crate) content_hashes: Vec<String>,
}

impl fmt::Debug for DenseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseIndex")
            .field("embedder", &self.embedder.model_id())
            .field("dim", &self.dim)
            .field("len", &self.len())
            .finish()
    }
}

impl DenseIndex {
    pub async fn build(chunks: &[Chunk], embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::build_batched(chunks, embedder, DEFAULT_BATCH_SIZE).await
    }

    /// Embeds `chunks` in batches of `batch_size` texts.
    pub async fn build_batched(chunks: &[Chunk], embedder: Arc<dyn Embedder>, batch_size: usize) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let dim = probe_dim(embedder.as_ref()).await?;

        let pb = progress_bar(chunks.len());
        let mut vectors = Vec::with_capacity(chunks.len() * dim);
        let mut source_ids = Vec::with_capacity(chunks.len());
        let mut content_hashes = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| Error::ExternalService(format!("embedding chunks: {e:#}")))?;
            if embeddings.len() != batch.len() {
                return Err(Error::ExternalService(format!(
                    "embedder returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (chunk, embedding) in batch.iter().zip(embeddings) {
                if embedding.len() != dim {
                    return Err(Error::ExternalService(format!(
                        "embedding of {} has dimension {}, expected {dim}",
                        chunk.source_id,
                        embedding.len()
                    )));
                }
                vectors.extend_from_slice(&embedding);
                source_ids.push(chunk.source_id.clone());
                content_hashes.push(content_hash(&chunk.content));
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        info!(chunks = source_ids.len(), dim, embedder = embedder.model_id(), "built dense index");
        Ok(Self { embedder, dim, vectors, source_ids, content_hashes })
    }

    pub fn len(&self) -> usize {
        self.source_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_ids.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embedder_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// True when the index was built from exactly `chunks`: same source ids
    /// and same text, in the same order.
    pub fn matches(&self, chunks: &[Chunk]) -> bool {
        self.len() == chunks.len()
            && chunks
                .iter()
                .zip(self.source_ids.iter().zip(&self.content_hashes))
                .all(|(chunk, (id, hash))| chunk.source_id == *id && content_hash(&chunk.content) == *hash)
    }

    /// Embeds the query once, then ranks by squared L2 distance.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let q = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Error::RetrievalService(format!("embedding query: {e:#}")))?;
        self.search_vec(&q, k)
    }

    /// `k` nearest stored vectors, closest first. Score is `1 / (1 + d)` with `d` the squared L2 distance.
    pub fn search_vec(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::RetrievalService(format!(
                "query vector has dimension {}, index has {}",
                query.len(),
                self.dim
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        let hits: Vec<SearchHit> = scored
            .into_iter()
            .take(k)
            .map(|(i, d)| SearchHit { source_id: self.source_ids[i].clone(), score: 1.0 / (1.0 + d), source: SourceKind::Dense })
            .collect();
        debug!(k, hits = hits.len(), "dense search");
        Ok(hits)
    }
}

#[async_trait]
impl DenseSearcher for DenseIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        DenseIndex::search(self, query, k).await
    }
}

pub(crate) async fn probe_dim(embedder: &dyn Embedder) -> Result<usize> {
    let probe = embedder
        .embed(SENTINEL)
        .await
        .map_err(|e| Error::ExternalService(format!("probing embedder: {e:#}")))?;
    if probe.is_empty() {
        return Err(Error::ExternalService("embedder returned an empty vector".to_string()));
    }
    Ok(probe.len())
}

fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
