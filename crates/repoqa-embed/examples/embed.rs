use std::path::PathBuf;

use repoqa_core::traits::Embedder;
use repoqa_embed::{EmbeddingModel, HashEmbedder};

// Embed a couple of strings and print the batch shape.
// Usage:
//   cargo run -p repoqa-embed --example embed -- [MODEL_DIR]
// Without MODEL_DIR the hashing embedder is used.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let embedder: Box<dyn Embedder> = match std::env::args().nth(1) {
        Some(dir) => Box::new(EmbeddingModel::new(&PathBuf::from(dir), 256)?),
        None => Box::new(HashEmbedder::new(384)),
    };
    let texts = vec!["def parse(path): ...".to_string(), "class Config:".to_string()];
    let embs = embedder.embed_batch(&texts).await?;
    println!("model={} B={} dim={}", embedder.model_id(), embs.len(), embs.first().map_or(0, Vec::len));
    Ok(())
}
