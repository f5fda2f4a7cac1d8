use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use repoqa_core::config::RetrievalSettings;
use repoqa_core::repository::LocalRepository;
use repoqa_core::traits::{AnswerSynthesizer, QueryRewriter};
use repoqa_core::{Error, TaskConfig};
use repoqa_embed::HashEmbedder;
use repoqa_pipeline::{DenseOrigin, Engine, EngineParts};

struct Upper;

#[async_trait]
impl QueryRewriter for Upper {
    async fn rewrite(&self, question: &str) -> anyhow::Result<String> {
        Ok(question.to_uppercase())
    }
}

struct Count;

#[async_trait]
impl AnswerSynthesizer for Count {
    async fn synthesize(&self, _question: &str, context: &str) -> anyhow::Result<String> {
        Ok(format!("{} files", context.matches("Contents of ").count()))
    }
}

fn write_repo(root: &Path) {
    fs::write(root.join("a.py"), "def f(): pass").unwrap();
    fs::write(root.join("b.py"), "def g(): pass").unwrap();
    fs::write(root.join("c.txt"), "hello world").unwrap();
}

fn parts(root: &Path) -> EngineParts {
    let repo = Arc::new(LocalRepository::new(root));
    EngineParts {
        source: repo.clone(),
        content: repo,
        embedder: Arc::new(HashEmbedder::new(64)),
        rewriter: Arc::new(Upper),
        synthesizer: Arc::new(Count),
    }
}

#[tokio::test]
async fn builds_then_reuses_the_dense_index() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let index_dir = cache.path().join("dense");
    let retrieval = RetrievalSettings::default();

    let first = Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    assert_eq!(first.dense_origin(), DenseOrigin::Built);
    assert_eq!(first.documents(), 3);
    assert!(index_dir.is_dir());

    let second = Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    assert_eq!(second.dense_origin(), DenseOrigin::Loaded);

    let a = first.pipeline().run("function f", TaskConfig::default()).await.unwrap();
    let b = second.pipeline().run("function f", TaskConfig::default()).await.unwrap();
    assert_eq!(a.retrieved[0], "a.py");
    assert_eq!(a.retrieved, b.retrieved);
}

#[tokio::test]
async fn rebuild_flag_ignores_saved_index() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let index_dir = cache.path().join("dense");
    let retrieval = RetrievalSettings::default();

    Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    let engine = Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, true).await.unwrap();
    assert_eq!(engine.dense_origin(), DenseOrigin::Built);
}

#[tokio::test]
async fn corrupt_index_directory_is_rebuilt() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let index_dir = cache.path().join("dense");
    fs::create_dir_all(index_dir.join("vectors.lance")).unwrap();
    fs::write(index_dir.join("vectors.lance").join("garbage.bin"), b"not a table").unwrap();

    let engine = Engine::assemble(parts(repo.path()), &RetrievalSettings::default(), &index_dir, 8, false).await.unwrap();
    assert_eq!(engine.dense_origin(), DenseOrigin::Built);
}

#[tokio::test]
async fn changed_repository_rebuilds_the_index() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let index_dir = cache.path().join("dense");
    let retrieval = RetrievalSettings::default();

    Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    fs::write(repo.path().join("d.md"), "notes about the project").unwrap();
    let engine = Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    assert_eq!(engine.dense_origin(), DenseOrigin::Built);
    assert_eq!(engine.documents(), 4);
}

#[tokio::test]
async fn renamed_file_with_same_chunk_count_rebuilds_the_index() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let index_dir = cache.path().join("dense");
    let dense_only = RetrievalSettings { dense_weight: 1.0, sparse_weight: 0.0, ..RetrievalSettings::default() };

    let before = Engine::assemble(parts(repo.path()), &dense_only, &index_dir, 8, false).await.unwrap();
    fs::rename(repo.path().join("a.py"), repo.path().join("renamed.py")).unwrap();
    let after = Engine::assemble(parts(repo.path()), &dense_only, &index_dir, 8, false).await.unwrap();
    assert_eq!(after.dense_origin(), DenseOrigin::Built);
    assert_eq!(after.chunks(), before.chunks());

    let task = TaskConfig { summarize: true, ..TaskConfig::default() };
    let out = after.pipeline().run("def f(): pass", task).await.unwrap();
    assert!(!out.retrieved.contains(&"a.py".to_string()));
    assert_eq!(out.retrieved[0], "renamed.py");
}

#[tokio::test]
async fn edited_file_with_same_chunk_count_rebuilds_the_index() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let index_dir = cache.path().join("dense");
    let retrieval = RetrievalSettings::default();

    Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    fs::write(repo.path().join("b.py"), "def h(): return 1").unwrap();
    let engine = Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    assert_eq!(engine.dense_origin(), DenseOrigin::Built);

    let again = Engine::assemble(parts(repo.path()), &retrieval, &index_dir, 8, false).await.unwrap();
    assert_eq!(again.dense_origin(), DenseOrigin::Loaded);
}

#[tokio::test]
async fn full_run_expands_and_summarizes() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_repo(repo.path());
    let engine = Engine::assemble(parts(repo.path()), &RetrievalSettings::default(), &cache.path().join("dense"), 8, false)
        .await
        .unwrap();

    let task = TaskConfig { expand_query: true, summarize: true, ..TaskConfig::default() };
    let out = engine.pipeline().run("function f", task).await.unwrap();
    assert_eq!(out.question, "FUNCTION F");
    assert_eq!(out.answer, Some(format!("{} files", out.retrieved.len())));
}

#[tokio::test]
async fn empty_repository_has_no_index() {
    let repo = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let result = Engine::assemble(parts(repo.path()), &RetrievalSettings::default(), &cache.path().join("dense"), 8, false).await;
    assert!(matches!(result.err(), Some(Error::EmptyIndex)));
}
