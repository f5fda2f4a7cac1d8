use std::sync::Arc;

use async_trait::async_trait;
use repoqa_core::config::RetrievalSettings;
use repoqa_core::traits::{DenseSearcher, Retriever, SparseSearcher};
use repoqa_core::{Chunk, Error, SearchHit, SourceKind};
use repoqa_embed::HashEmbedder;
use repoqa_hybrid::{FusionRetriever, FusionWeights};
use repoqa_text::SparseIndex;
use repoqa_vector::DenseIndex;

/// Returns a fixed ranking, or fails.
struct Fixed {
    ids: Vec<&'static str>,
    source: SourceKind,
    fail: bool,
}

impl Fixed {
    fn dense(ids: &[&'static str]) -> Self {
        Self { ids: ids.to_vec(), source: SourceKind::Dense, fail: false }
    }

    fn sparse(ids: &[&'static str]) -> Self {
        Self { ids: ids.to_vec(), source: SourceKind::Sparse, fail: false }
    }

    fn failing(source: SourceKind) -> Self {
        Self { ids: Vec::new(), source, fail: true }
    }

    fn hits(&self, k: usize) -> repoqa_core::Result<Vec<SearchHit>> {
        if self.fail {
            return Err(Error::Operation("backend down".to_string()));
        }
        Ok(self
            .ids
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, id)| SearchHit { source_id: id.to_string(), score: 1.0 / (i as f32 + 1.0), source: self.source })
            .collect())
    }
}

#[async_trait]
impl DenseSearcher for Fixed {
    async fn search(&self, _query: &str, k: usize) -> repoqa_core::Result<Vec<SearchHit>> {
        self.hits(k)
    }
}

impl SparseSearcher for Fixed {
    fn search(&self, _query: &str, k: usize) -> repoqa_core::Result<Vec<SearchHit>> {
        self.hits(k)
    }
}

fn pool() -> Vec<Chunk> {
    vec![
        Chunk::new("a.py", "def f(): pass"),
        Chunk::new("a.py", "def f(): pass  # again"),
        Chunk::new("b.py", "def g(): pass"),
        Chunk::new("c.txt", "hello world"),
    ]
}

async fn real_retriever() -> FusionRetriever<Arc<DenseIndex>, Arc<SparseIndex>> {
    let chunks = pool();
    let dense = DenseIndex::build(&chunks, Arc::new(HashEmbedder::new(64))).await.unwrap();
    let sparse = SparseIndex::build(&chunks).unwrap();
    FusionRetriever::new(Arc::new(dense), Arc::new(sparse))
}

#[tokio::test]
async fn matching_file_ranks_first_without_duplicates() {
    let retriever = real_retriever().await;
    let result = retriever.retrieve("function f").await.unwrap();
    let ids = result.source_ids();
    assert_eq!(ids[0], "a.py");
    assert_eq!(ids.len(), 3);
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn repeated_queries_are_identical() {
    let retriever = real_retriever().await;
    let first = retriever.retrieve("def pass").await.unwrap();
    let second = retriever.retrieve("def pass").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn dense_only_weights_reproduce_dense_order() {
    let retriever = FusionRetriever::new(Fixed::dense(&["x", "y", "x", "z"]), Fixed::sparse(&["q", "y"]))
        .with_weights(FusionWeights::new(1.0, 0.0).unwrap());
    let result = retriever.retrieve("anything").await.unwrap();
    assert_eq!(result.source_ids(), ["x", "y", "z"]);
}

#[tokio::test]
async fn sparse_only_weights_reproduce_sparse_order() {
    let retriever = FusionRetriever::new(Fixed::dense(&["x", "y"]), Fixed::sparse(&["q", "y", "r"]))
        .with_weights(FusionWeights::new(0.0, 1.0).unwrap());
    let result = retriever.retrieve("anything").await.unwrap();
    assert_eq!(result.source_ids(), ["q", "y", "r"]);
}

#[tokio::test]
async fn zero_weight_searcher_is_not_consulted() {
    let retriever = FusionRetriever::new(Fixed::failing(SourceKind::Dense), Fixed::sparse(&["q"]))
        .with_weights(FusionWeights::new(0.0, 1.0).unwrap());
    assert_eq!(retriever.retrieve("anything").await.unwrap().source_ids(), ["q"]);
}

#[tokio::test]
async fn result_is_bounded_by_k() {
    let retriever = FusionRetriever::new(Fixed::dense(&["a", "b", "c"]), Fixed::sparse(&["d", "e", "f"])).with_k(2);
    assert_eq!(retriever.retrieve("anything").await.unwrap().len(), 2);
}

#[tokio::test]
async fn dense_failure_fails_the_whole_retrieval() {
    let retriever = FusionRetriever::new(Fixed::failing(SourceKind::Dense), Fixed::sparse(&["a"]));
    let err = retriever.retrieve("anything").await.unwrap_err();
    assert!(matches!(err, Error::RetrievalService(_)));
}

#[tokio::test]
async fn sparse_failure_fails_the_whole_retrieval() {
    let retriever = FusionRetriever::new(Fixed::dense(&["a"]), Fixed::failing(SourceKind::Sparse));
    let err = retriever.retrieve("anything").await.unwrap_err();
    assert!(matches!(err, Error::RetrievalService(_)));
}

#[test]
fn settings_are_validated() {
    let bad = RetrievalSettings { dense_weight: 0.0, sparse_weight: 0.0, result_size: 10 };
    let err = FusionRetriever::from_settings(Fixed::dense(&[]), Fixed::sparse(&[]), &bad).err().unwrap();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let good = RetrievalSettings { dense_weight: 2.0, sparse_weight: 3.0, result_size: 5 };
    let retriever = FusionRetriever::from_settings(Fixed::dense(&[]), Fixed::sparse(&[]), &good).unwrap();
    assert_eq!(retriever.k(), 5);
    assert_eq!(retriever.weights().sparse(), 3.0);
}
