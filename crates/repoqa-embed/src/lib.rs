//! repoqa-embed
//!
//! Embedder implementations: a local candle encoder and a deterministic
//! hashing embedder.

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod tokenize;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use repoqa_core::config::{expand_path, EmbedBackend, EmbedSettings};
use repoqa_core::traits::Embedder;

pub use hash::HashEmbedder;
pub use model::EmbeddingModel;
pub use pool::masked_mean_l2;

/// Builds the configured embedder.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing embedder regardless of the
/// configured backend.
pub fn get_default_embedder(settings: &EmbedSettings) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || settings.backend == EmbedBackend::Hash {
        info!(dim = settings.hash_dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.hash_dim)));
    }
    Ok(Arc::new(EmbeddingModel::new(&expand_path(&settings.model_dir), settings.max_len)?))
}
