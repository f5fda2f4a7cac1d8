//! Driver loop of the question-answering state machine.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use repoqa_core::error::{Error, Result};
use repoqa_core::traits::{AnswerSynthesizer, ContentProvider, QueryRewriter, Retriever};
use repoqa_core::types::TaskConfig;

use crate::context::make_context;
use crate::stage::{next_stage, Stage};
use crate::state::{PipelineOutput, PipelineState};

/// Sequences expansion, retrieval and synthesis for one question at a time.
///
/// Holds no per-run state; the same pipeline serves any number of runs.
#[derive(Clone)]
pub struct Pipeline {
    retriever: Arc<dyn Retriever>,
    rewriter: Arc<dyn QueryRewriter>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    content: Arc<dyn ContentProvider>,
}

impl Pipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        rewriter: Arc<dyn QueryRewriter>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self { retriever, rewriter, synthesizer, content }
    }

    pub async fn run(&self, question: &str, task: TaskConfig) -> Result<PipelineOutput> {
        self.run_until_cancelled(question, task, &CancellationToken::new()).await
    }

    pub async fn run_until_cancelled(&self, question: &str, task: TaskConfig, cancel: &CancellationToken) -> Result<PipelineOutput> {
        let mut state = PipelineState::new(question, task);
        self.drive(&mut state, cancel).await?;
        Ok(state.into())
    }

    /// Runs `state` from `Start` to `End`.
    ///
    /// On error `state` keeps the effects of every stage that completed, and
    /// `visited` lists exactly those stages.
    pub async fn drive(&self, state: &mut PipelineState, cancel: &CancellationToken) -> Result<()> {
        let mut stage = Stage::Start;
        state.visited.push(stage);
        loop {
            stage = next_stage(stage, state);
            if stage == Stage::End {
                state.visited.push(stage);
                debug!(visited = ?state.visited, "pipeline finished");
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            debug!(%stage, "entering stage");
            match stage {
                Stage::Expand => self.expand(state, cancel).await?,
                Stage::Retrieve => self.retrieve(state, cancel).await?,
                Stage::Summarize => self.summarize(state, cancel).await?,
                Stage::Start | Stage::End => {}
            }
            state.visited.push(stage);
        }
    }

    async fn expand(&self, state: &mut PipelineState, cancel: &CancellationToken) -> Result<()> {
        let rewritten = until_cancelled(cancel, self.rewriter.rewrite(&state.question))
            .await?
            .map_err(|e| Error::ExternalService(format!("query expansion failed: {e:#}")))?;
        if state.task_config.verbose {
            info!(expanded = %rewritten, "expanded query");
        }
        state.question = rewritten;
        Ok(())
    }

    async fn retrieve(&self, state: &mut PipelineState, cancel: &CancellationToken) -> Result<()> {
        let result = until_cancelled(cancel, self.retriever.retrieve(&state.question)).await??;
        if state.task_config.verbose {
            info!(retrieved = ?result.source_ids(), "retrieved files");
        }
        state.retrieved = result.into_inner();
        state.answer = None;
        Ok(())
    }

    async fn summarize(&self, state: &mut PipelineState, cancel: &CancellationToken) -> Result<()> {
        let context = make_context(self.content.as_ref(), &state.retrieved)?;
        let answer = until_cancelled(cancel, self.synthesizer.synthesize(&state.question, &context))
            .await?
            .map_err(|e| Error::ExternalService(format!("answer synthesis failed: {e:#}")))?;
        state.answer = Some(answer);
        Ok(())
    }
}

async fn until_cancelled<T>(cancel: &CancellationToken, fut: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        out = fut => Ok(out),
    }
}
