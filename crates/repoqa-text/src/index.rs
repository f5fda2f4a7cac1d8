use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::{debug, info};

use repoqa_core::error::{Error, Result};
use repoqa_core::traits::SparseSearcher;
use repoqa_core::types::{Chunk, SearchHit, SourceKind};

use crate::tantivy_utils::{build_schema, register_tokenizer, SOURCE_ID_FIELD, TEXT_FIELD};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// BM25 index over chunk text, held in RAM and rebuilt from the chunk pool on
/// every start.
///
/// A single writer thread and a single commit keep every chunk in one segment
/// in insertion order, so equal scores always resolve the same way.
pub struct SparseIndex {
	index: Index,
	reader: IndexReader,
	source_id_field: Field,
	text_field: Field,
	len: usize,
}

fn build_err(e: tantivy::TantivyError) -> Error {
	Error::Operation(format!("sparse index build: {e}"))
}

fn search_err(e: tantivy::TantivyError) -> Error {
	Error::RetrievalService(format!("sparse search: {e}"))
}

impl SparseIndex {
	pub fn build(chunks: &[Chunk]) -> Result<Self> {
		if chunks.is_empty() { return Err(Error::EmptyIndex); }
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let source_id_field = schema.get_field(SOURCE_ID_FIELD).map_err(build_err)?;
		let text_field = schema.get_field(TEXT_FIELD).map_err(build_err)?;

		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES).map_err(build_err)?;
		for c in chunks {
			writer.add_document(doc!(
				source_id_field => c.source_id.clone(),
				text_field => c.content.clone(),
			)).map_err(build_err)?;
		}
		writer.commit().map_err(build_err)?;

		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(build_err)?;
		info!(chunks = chunks.len(), "built sparse index");
		Ok(Self { index, reader, source_id_field, text_field, len: chunks.len() })
	}

	/// Number of indexed chunks.
	pub fn len(&self) -> usize { self.len }

	pub fn is_empty(&self) -> bool { self.len == 0 }

	/// Top `k` chunks by BM25, reported by their source id.
	///
	/// Punctuation is dropped before parsing (the tokenizer drops it from the
	/// indexed text too), so query syntax characters in a natural-language
	/// question never fail the search.
	pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		let (q, errors) = qp.parse_query_lenient(&sanitize(query));
		if !errors.is_empty() { debug!(?errors, "ignored parts of sparse query"); }
		let top_docs = searcher.search(&q, &TopDocs::with_limit(k)).map_err(search_err)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(search_err)?;
			let source_id = doc
				.get_first(self.source_id_field)
				.and_then(|v| v.as_str())
				.ok_or_else(|| Error::RetrievalService(format!("sparse hit {addr:?} has no source id")))?;
			hits.push(SearchHit { source_id: source_id.to_string(), score, source: SourceKind::Sparse });
		}
		Ok(hits)
	}
}

fn sanitize(query: &str) -> String {
	// lower-cased so that AND / OR / NOT in a question stay plain words
	query.chars().map(|c| if c.is_alphanumeric() { c } else { ' ' }).collect::<String>().to_lowercase()
}

impl SparseSearcher for SparseIndex {
	fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> { Self::search(self, query, k) }
}

#[cfg(test)]
mod tests {
	use super::sanitize;

	#[test]
	fn sanitize_keeps_only_words() {
		assert_eq!(sanitize("a.py: f()?"), "a py  f   ");
		assert_eq!(sanitize("parse_args"), "parse args");
		assert_eq!(sanitize("NOT Working"), "not working");
	}
}
