use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const VECTORS_TABLE: &str = "vectors";
pub const META_TABLE: &str = "meta";

/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: &str = "2";
pub const METRIC: &str = "l2";

pub fn build_vectors_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("position", DataType::Int64, false),
		Field::new("source_id", DataType::Utf8, false),
		Field::new("content_hash", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), false),
	]))
}

// Simple key/value table describing the index
pub fn build_meta_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("key", DataType::Utf8, false),
		Field::new("value", DataType::Utf8, false),
	]))
}
