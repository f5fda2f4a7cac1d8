use std::path::PathBuf;

use repoqa_vector::DenseIndex;

// Print the metadata of a saved dense index.
// Usage:
//   cargo run -p repoqa-vector --example status -- ./data/cache/dense

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./data/cache/dense"));
    let meta = DenseIndex::inspect(&path).await?;
    println!("path={}", path.display());
    println!("format_version={} metric={}", meta.format_version, meta.metric);
    println!("count={} dim={}", meta.count, meta.dim);
    println!("embedder_id={}", meta.embedder_id);
    Ok(())
}
