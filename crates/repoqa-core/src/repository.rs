//! Local checkout of a code repository as the document pool.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::traits::{ContentProvider, DocumentSource};
use crate::types::Document;

/// Reads documents from an already materialized repository directory.
///
/// Source ids are forward-slash paths relative to `root`. Hidden entries
/// (`.git`, `.venv`, ...) are skipped, as are files that are empty, not
/// valid UTF-8 or unreadable.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_id_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parts.is_empty() { None } else { Some(parts.join("/")) }
    }

    fn resolve(&self, source_id: &str) -> Result<PathBuf> {
        let rel = Path::new(source_id);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if source_id.is_empty() || escapes {
            return Err(Error::NotFound(source_id.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

impl DocumentSource for LocalRepository {
    fn list_documents(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(Error::NotFound(format!("repository root {}", self.root.display())));
        }
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(source_id) = self.source_id_for(path) else { continue };
            if let Some(doc) = read_document(path, source_id) {
                docs.push(doc);
            }
        }
        docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        debug!(count = docs.len(), root = %self.root.display(), "listed repository documents");
        Ok(docs)
    }
}

fn read_document(path: &Path, source_id: String) -> Option<Document> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(%source_id, error = %e, "skipping unreadable file");
            return None;
        }
    };
    let Ok(content) = String::from_utf8(bytes) else {
        debug!(%source_id, "skipping non-UTF-8 file");
        return None;
    };
    if content.is_empty() {
        debug!(%source_id, "skipping empty file");
        return None;
    }
    Some(Document { source_id, content })
}

impl ContentProvider for LocalRepository {
    fn get_content(&self, source_id: &str) -> Result<String> {
        let path = self.resolve(source_id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(source_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
