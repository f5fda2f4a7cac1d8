//! repoqa-hybrid
//!
//! Weighted reciprocal rank fusion of a dense and a sparse searcher.
//!
//! Every list is collapsed to the first occurrence of each source id and the
//! item at 1-based rank `r` contributes `weight / (60 + r)`. Equal fused
//! scores keep the order in which ids were first seen, dense list first.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use repoqa_core::config::RetrievalSettings;
use repoqa_core::error::{Error, Result};
use repoqa_core::traits::{DenseSearcher, Retriever, SparseSearcher};
use repoqa_core::types::{RetrievalResult, SearchHit, SourceId};

pub const RRF_K: f64 = 60.0;
pub const DEFAULT_RESULT_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    dense: f32,
    sparse: f32,
}

impl FusionWeights {
    pub fn new(dense: f32, sparse: f32) -> Result<Self> {
        for (name, w) in [("dense", dense), ("sparse", sparse)] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} weight must be a non-negative number, got {w}")));
            }
        }
        if dense == 0.0 && sparse == 0.0 {
            return Err(Error::InvalidConfig("at least one fusion weight must be positive".to_string()));
        }
        Ok(Self { dense, sparse })
    }

    pub fn dense(&self) -> f32 {
        self.dense
    }

    pub fn sparse(&self) -> f32 {
        self.sparse
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { dense: 0.5, sparse: 0.5 }
    }
}

/// Fuses ranked lists into at most `k` source ids.
///
/// `lists` pairs each hit list with its weight; lists with zero weight
/// contribute nothing.
pub fn fuse(lists: &[(&[SearchHit], f32)], k: usize) -> Vec<SourceId> {
    struct Candidate<'a> {
        id: &'a str,
        score: f64,
    }

    let mut order: Vec<Candidate<'_>> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for (hits, weight) in lists {
        if *weight <= 0.0 {
            continue;
        }
        let mut rank = 0usize;
        let mut seen_in_list: HashSet<&str> = HashSet::new();
        for hit in hits.iter() {
            let id = hit.source_id.as_str();
            if !seen_in_list.insert(id) {
                continue;
            }
            rank += 1;
            let contribution = f64::from(*weight) / (RRF_K + rank as f64);
            match slot.get(id) {
                Some(&i) => order[i].score += contribution,
                None => {
                    slot.insert(id, order.len());
                    order.push(Candidate { id, score: contribution });
                }
            }
        }
    }
    // stable: ties keep first-seen order
    order.sort_by(|a, b| b.score.total_cmp(&a.score));
    order.into_iter().take(k).map(|c| c.id.to_string()).collect()
}

/// Runs both searchers for a query and fuses their rankings.
pub struct FusionRetriever<D, S> {
    dense: D,
    sparse: S,
    weights: FusionWeights,
    k: usize,
}

impl<D: DenseSearcher, S: SparseSearcher> FusionRetriever<D, S> {
    pub fn new(dense: D, sparse: S) -> Self {
        Self { dense, sparse, weights: FusionWeights::default(), k: DEFAULT_RESULT_SIZE }
    }

    pub fn from_settings(dense: D, sparse: S, settings: &RetrievalSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(dense, sparse)
            .with_weights(FusionWeights::new(settings.dense_weight, settings.sparse_weight)?)
            .with_k(settings.result_size))
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    pub fn k(&self) -> usize {
        self.k
    }

    async fn dense_hits(&self, query: &str) -> Result<Vec<SearchHit>> {
        if self.weights.dense == 0.0 {
            return Ok(Vec::new());
        }
        self.dense.search(query, self.k).await.map_err(|e| as_retrieval("dense", e))
    }

    async fn sparse_hits(&self, query: &str) -> Result<Vec<SearchHit>> {
        if self.weights.sparse == 0.0 {
            return Ok(Vec::new());
        }
        self.sparse.search(query, self.k).map_err(|e| as_retrieval("sparse", e))
    }
}

#[async_trait]
impl<D: DenseSearcher, S: SparseSearcher> Retriever for FusionRetriever<D, S> {
    async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let (dense, sparse) = futures::try_join!(self.dense_hits(query), self.sparse_hits(query))?;
        debug!(dense = dense.len(), sparse = sparse.len(), "fusing hit lists");
        let fused = fuse(&[(dense.as_slice(), self.weights.dense), (sparse.as_slice(), self.weights.sparse)], self.k);
        Ok(RetrievalResult::from_ranked(fused))
    }
}

fn as_retrieval(engine: &str, e: Error) -> Error {
    match e {
        Error::RetrievalService(_) => e,
        other => Error::RetrievalService(format!("{engine} search failed: {other}")),
    }
}
