//! repoqa-core
//!
//! Domain types, the error taxonomy, collaborator traits and configuration
//! shared by every repoqa crate.

pub mod config;
pub mod error;
pub mod repository;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{Chunk, Document, RetrievalResult, SearchHit, SourceId, SourceKind, TaskConfig};
