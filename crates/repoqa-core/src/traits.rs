//! Narrow contracts for the collaborators the engine depends on.
//!
//! External services report failures as `anyhow::Error`; the component that
//! calls them maps the failure into the typed [`crate::error::Error`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Document, RetrievalResult, SearchHit};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model (and version) producing the vectors.
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[async_trait]
pub trait QueryRewriter: Send + Sync {
    async fn rewrite(&self, question: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, question: &str, context: &str) -> anyhow::Result<String>;
}

/// Full content of a document by source id, read from the local checkout.
pub trait ContentProvider: Send + Sync {
    fn get_content(&self, source_id: &str) -> Result<String>;
}

pub trait DocumentSource: Send + Sync {
    fn list_documents(&self) -> Result<Vec<Document>>;
}

/// Lexical search over an already built index; synchronous by contract.
pub trait SparseSearcher: Send + Sync {
    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// Similarity search; suspends only while the query is embedded.
#[async_trait]
pub trait DenseSearcher: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<RetrievalResult>;
}

impl<T: SparseSearcher + ?Sized> SparseSearcher for Arc<T> {
    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        (**self).search(query, k)
    }
}

#[async_trait]
impl<T: DenseSearcher + ?Sized> DenseSearcher for Arc<T> {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        (**self).search(query, k).await
    }
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        (**self).retrieve(query).await
    }
}
