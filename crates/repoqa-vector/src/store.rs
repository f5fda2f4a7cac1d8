//! LanceDB persistence for [`DenseIndex`].
//!
//! An index directory is a LanceDB database holding a `vectors` table (one row
//! per chunk, `position` giving the insertion order) and a key/value `meta`
//! table describing dimension, row count, metric and embedder. Each vector row
//! also carries the blake3 hash of the chunk text it was embedded from.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{ArrowError, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use tracing::{info, warn};

use repoqa_core::error::{Error, Result};
use repoqa_core::traits::Embedder;

use crate::index::{probe_dim, DenseIndex};
use crate::schema::{build_meta_schema, build_vectors_schema, FORMAT_VERSION, META_TABLE, METRIC, VECTORS_TABLE};

const WRITE_BATCH: usize = 1000;

/// Contents of the `meta` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
	pub format_version: String,
	pub dim: usize,
	pub count: usize,
	pub metric: String,
	pub embedder_id: String,
}

pub async fn open_db(path: &Path) -> std::result::Result<Connection, lancedb::Error> {
	connect(path.to_string_lossy().as_ref()).execute().await
}

fn op_err(context: &str, e: impl std::fmt::Display) -> Error {
	Error::Operation(format!("{context}: {e}"))
}

impl DenseIndex {
	/// Writes the index to `path`, replacing a previously saved index.
	///
	/// Tables are written to a sibling directory first and swapped in once
	/// complete, so a failed save leaves the old index in place. An existing
	/// `path` holding anything but LanceDB tables is refused.
	pub async fn save(&self, path: &Path) -> Result<()> {
		if path.exists() && !is_replaceable(path).await? {
			return Err(Error::Operation(format!(
				"refusing to replace {}: not an index directory",
				path.display()
			)));
		}
		let staging = sibling(path, "tmp")?;
		if staging.exists() {
			tokio::fs::remove_dir_all(&staging).await?;
		}
		tokio::fs::create_dir_all(&staging).await?;
		if let Err(e) = self.write_tables(&staging).await {
			let _ = tokio::fs::remove_dir_all(&staging).await;
			return Err(e);
		}

		if path.exists() {
			let old = sibling(path, "old")?;
			if old.exists() {
				tokio::fs::remove_dir_all(&old).await?;
			}
			tokio::fs::rename(path, &old).await?;
			tokio::fs::rename(&staging, path).await?;
			tokio::fs::remove_dir_all(&old).await?;
		} else {
			tokio::fs::rename(&staging, path).await?;
		}
		info!(path = %path.display(), count = self.len(), dim = self.dim, "saved dense index");
		Ok(())
	}

	async fn write_tables(&self, dir: &Path) -> Result<()> {
		let conn = open_db(dir).await.map_err(|e| op_err("opening index directory", e))?;
		let dim = i32::try_from(self.dim).map_err(|e| op_err("vector dimension", e))?;
		let schema = build_vectors_schema(dim);
		let batches = self.vector_batches(&schema, dim).map_err(|e| op_err("encoding vectors", e))?;
		let reader = RecordBatchIterator::new(batches.into_iter().map(Ok::<_, ArrowError>), schema);
		conn.create_table(VECTORS_TABLE, Box::new(reader))
			.execute()
			.await
			.map_err(|e| op_err("writing vectors table", e))?;

		let meta = self.meta_batch().map_err(|e| op_err("encoding meta", e))?;
		let reader = RecordBatchIterator::new(vec![Ok::<_, ArrowError>(meta)].into_iter(), build_meta_schema());
		conn.create_table(META_TABLE, Box::new(reader))
			.execute()
			.await
			.map_err(|e| op_err("writing meta table", e))?;
		Ok(())
	}

	/// Restores an index written by [`DenseIndex::save`].
	///
	/// `embedder` must produce vectors of the stored dimension; a different
	/// model id only warns.
	pub async fn load(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
		let fail = |reason: String| Error::index_load(path, reason);
		let (conn, meta) = open_and_read_meta(path).await?;

		if meta.embedder_id != embedder.model_id() {
			warn!(stored = %meta.embedder_id, current = embedder.model_id(), "index was built with a different embedder");
		}
		let probed = probe_dim(embedder.as_ref()).await.map_err(|e| fail(e.to_string()))?;
		if probed != meta.dim {
			return Err(fail(format!("embedder produces dimension {probed}, index has {}", meta.dim)));
		}

		let table = conn.open_table(VECTORS_TABLE).execute().await.map_err(|e| fail(e.to_string()))?;
		let rows = table.count_rows(None).await.map_err(|e| fail(e.to_string()))?;
		if rows != meta.count {
			return Err(fail(format!("vectors table has {rows} rows, meta says {}", meta.count)));
		}
		let mut stream = table.query().limit(rows).execute().await.map_err(|e| fail(e.to_string()))?;

		let mut entries: Vec<VectorRow> = Vec::with_capacity(rows);
		while let Some(batch) = stream.try_next().await.map_err(|e| fail(e.to_string()))? {
			read_vector_rows(&batch, meta.dim, &mut entries).map_err(fail)?;
		}
		if entries.len() != meta.count {
			return Err(fail(format!("read {} rows, meta says {}", entries.len(), meta.count)));
		}
		entries.sort_by_key(|row| row.position);

		let mut vectors = Vec::with_capacity(meta.count * meta.dim);
		let mut source_ids = Vec::with_capacity(meta.count);
		let mut content_hashes = Vec::with_capacity(meta.count);
		for (expected, row) in entries.into_iter().enumerate() {
			if usize::try_from(row.position).ok() != Some(expected) {
				return Err(fail(format!("positions are not contiguous at {expected}")));
			}
			vectors.extend_from_slice(&row.vector);
			source_ids.push(row.source_id);
			content_hashes.push(row.content_hash);
		}
		info!(path = %path.display(), count = source_ids.len(), dim = meta.dim, "loaded dense index");
		Ok(Self { embedder, dim: meta.dim, vectors, source_ids, content_hashes })
	}

	/// Reads only the `meta` table of a saved index.
	pub async fn inspect(path: &Path) -> Result<IndexMeta> {
		open_and_read_meta(path).await.map(|(_, meta)| meta)
	}

	fn vector_batches(&self, schema: &Arc<Schema>, dim: i32) -> std::result::Result<Vec<RecordBatch>, ArrowError> {
		let mut batches = Vec::new();
		let mut start = 0usize;
		while start < self.len() {
			let end = (start + WRITE_BATCH).min(self.len());
			let positions = Int64Array::from_iter_values((start..end).map(|i| i as i64));
			let ids = StringArray::from_iter_values(self.source_ids[start..end].iter());
			let hashes = StringArray::from_iter_values(self.content_hashes[start..end].iter());
			let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
				self.vectors[start * self.dim..end * self.dim]
					.chunks_exact(self.dim)
					.map(|v| Some(v.iter().copied().map(Some))),
				dim,
			);
			batches.push(RecordBatch::try_new(
				schema.clone(),
				vec![Arc::new(positions), Arc::new(ids), Arc::new(hashes), Arc::new(vectors)],
			)?);
			start = end;
		}
		Ok(batches)
	}

	fn meta_batch(&self) -> std::result::Result<RecordBatch, ArrowError> {
		let entries = [
			("format_version", FORMAT_VERSION.to_string()),
			("dim", self.dim.to_string()),
			("count", self.len().to_string()),
			("metric", METRIC.to_string()),
			("embedder_id", self.embedder_id().to_string()),
		];
		RecordBatch::try_new(
			build_meta_schema(),
			vec![
				Arc::new(StringArray::from_iter_values(entries.iter().map(|(k, _)| *k))),
				Arc::new(StringArray::from_iter_values(entries.iter().map(|(_, v)| v.as_str()))),
			],
		)
	}
}

async fn open_and_read_meta(path: &Path) -> Result<(Connection, IndexMeta)> {
	let fail = |reason: String| Error::index_load(path, reason);
	if !path.is_dir() {
		return Err(fail("index directory does not exist".to_string()));
	}
	let conn = open_db(path).await.map_err(|e| fail(e.to_string()))?;
	let names = conn.table_names().execute().await.map_err(|e| fail(e.to_string()))?;
	for table in [VECTORS_TABLE, META_TABLE] {
		if !names.iter().any(|n| n == table) {
			return Err(fail(format!("missing table {table}")));
		}
	}

	let table = conn.open_table(META_TABLE).execute().await.map_err(|e| fail(e.to_string()))?;
	let rows = table.count_rows(None).await.map_err(|e| fail(e.to_string()))?;
	let mut stream = table.query().limit(rows.max(1)).execute().await.map_err(|e| fail(e.to_string()))?;
	let mut kv: HashMap<String, String> = HashMap::new();
	while let Some(batch) = stream.try_next().await.map_err(|e| fail(e.to_string()))? {
		let keys = string_column(&batch, "key").map_err(fail)?;
		let values = string_column(&batch, "value").map_err(fail)?;
		for i in 0..batch.num_rows() {
			kv.insert(keys.value(i).to_string(), values.value(i).to_string());
		}
	}

	let mut take = |key: &str| kv.remove(key).ok_or_else(|| fail(format!("meta key {key} missing")));
	let format_version = take("format_version")?;
	let dim = take("dim")?;
	let count = take("count")?;
	let metric = take("metric")?;
	let embedder_id = take("embedder_id")?;

	if format_version != FORMAT_VERSION {
		return Err(fail(format!("unsupported format version {format_version}")));
	}
	if metric != METRIC {
		return Err(fail(format!("unsupported metric {metric}")));
	}
	let dim: usize = dim.parse().map_err(|_| fail(format!("invalid dim {dim:?}")))?;
	let count: usize = count.parse().map_err(|_| fail(format!("invalid count {count:?}")))?;
	if dim == 0 || count == 0 {
		return Err(fail(format!("degenerate index (dim={dim}, count={count})")));
	}
	Ok((conn, IndexMeta { format_version, dim, count, metric, embedder_id }))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> std::result::Result<&'a StringArray, String> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| format!("column {name} missing or not utf8"))
}

struct VectorRow {
	position: i64,
	source_id: String,
	content_hash: String,
	vector: Vec<f32>,
}

fn read_vector_rows(batch: &RecordBatch, dim: usize, out: &mut Vec<VectorRow>) -> std::result::Result<(), String> {
	let positions = batch
		.column_by_name("position")
		.and_then(|c| c.as_any().downcast_ref::<Int64Array>())
		.ok_or_else(|| "column position missing or not int64".to_string())?;
	let ids = string_column(batch, "source_id")?;
	let hashes = string_column(batch, "content_hash")?;
	let vectors = batch
		.column_by_name("vector")
		.and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
		.ok_or_else(|| "column vector missing or not a fixed size list".to_string())?;
	if usize::try_from(vectors.value_length()).ok() != Some(dim) {
		return Err(format!("stored vectors have dimension {}, meta says {dim}", vectors.value_length()));
	}
	for i in 0..batch.num_rows() {
		let list = vectors.value(i);
		let values = list
			.as_primitive_opt::<Float32Type>()
			.ok_or_else(|| "vector items are not float32".to_string())?;
		out.push(VectorRow {
			position: positions.value(i),
			source_id: ids.value(i).to_string(),
			content_hash: hashes.value(i).to_string(),
			vector: values.values().to_vec(),
		});
	}
	Ok(())
}

/// `<parent>/.<name>.<suffix>`, next to `path` so a rename stays on one filesystem.
fn sibling(path: &Path, suffix: &str) -> Result<PathBuf> {
	let name = path
		.file_name()
		.ok_or_else(|| Error::Operation(format!("index path {} has no file name", path.display())))?;
	let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
	Ok(parent.join(format!(".{}.{suffix}", name.to_string_lossy())))
}

/// An existing index path may only be replaced when it is a saved index, an
/// empty directory, or holds nothing but `*.lance` table directories.
async fn is_replaceable(path: &Path) -> Result<bool> {
	if !path.is_dir() {
		return Ok(false);
	}
	if open_and_read_meta(path).await.is_ok() {
		return Ok(true);
	}
	let mut entries = tokio::fs::read_dir(path).await?;
	while let Some(entry) = entries.next_entry().await? {
		let is_table = entry.file_type().await?.is_dir() && entry.path().extension().is_some_and(|ext| ext == "lance");
		if !is_table {
			return Ok(false);
		}
	}
	Ok(true)
}
