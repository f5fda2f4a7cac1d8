//! repoqa-text
//!
//! Tantivy-based sparse (BM25) index over chunk text.

pub mod index;
pub mod tantivy_utils;

pub use index::SparseIndex;
