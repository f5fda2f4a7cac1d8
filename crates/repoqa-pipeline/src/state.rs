use repoqa_core::types::{SourceId, TaskConfig};

use crate::stage::Stage;

/// Mutable record threaded through one pipeline run.
///
/// After a failed run it holds whatever the completed stages produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub question: String,
    pub retrieved: Vec<SourceId>,
    pub answer: Option<String>,
    pub task_config: TaskConfig,
    /// Stages executed so far, in order.
    pub visited: Vec<Stage>,
}

impl PipelineState {
    pub fn new(question: impl Into<String>, task_config: TaskConfig) -> Self {
        Self { question: question.into(), retrieved: Vec::new(), answer: None, task_config, visited: Vec::new() }
    }
}

/// What a completed run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// The question retrieval ran with (expanded, if expansion was on).
    pub question: String,
    pub retrieved: Vec<SourceId>,
    pub answer: Option<String>,
}

impl From<PipelineState> for PipelineOutput {
    fn from(state: PipelineState) -> Self {
        Self { question: state.question, retrieved: state.retrieved, answer: state.answer }
    }
}
