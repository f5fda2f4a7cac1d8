//! repoqa-pipeline
//!
//! The question-answering state machine: optional query expansion, fused
//! retrieval, optional answer synthesis. Also assembles the whole engine from
//! configuration.

pub mod context;
pub mod engine;
pub mod pipeline;
pub mod stage;
pub mod state;

pub use context::make_context;
pub use engine::{DenseOrigin, Engine, EngineParts};
pub use pipeline::Pipeline;
pub use stage::{next_stage, Stage};
pub use state::{PipelineOutput, PipelineState};
pub use tokio_util::sync::CancellationToken;
