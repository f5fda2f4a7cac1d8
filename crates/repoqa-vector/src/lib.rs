//! repoqa-vector
//!
//! Dense similarity index over chunk embeddings. Search runs in memory over an
//! exact flat L2 scan; the index can be saved to and loaded from a LanceDB
//! directory so embeddings are not recomputed between runs.

pub mod index;
pub mod schema;
pub mod store;

pub use index::{DenseIndex, DEFAULT_BATCH_SIZE};
pub use store::IndexMeta;
