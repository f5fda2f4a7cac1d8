//! Pipeline stages and the transition function between them.

use std::fmt;

use crate::state::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Start,
    Expand,
    Retrieve,
    Summarize,
    End,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Expand => "expand",
            Stage::Retrieve => "retrieve",
            Stage::Summarize => "summarize",
            Stage::End => "end",
        };
        f.write_str(name)
    }
}

/// The stage following `stage`. Depends only on the task flags.
pub fn next_stage(stage: Stage, state: &PipelineState) -> Stage {
    let task = &state.task_config;
    match stage {
        Stage::Start if task.expand_query => Stage::Expand,
        Stage::Start | Stage::Expand => Stage::Retrieve,
        Stage::Retrieve if task.summarize => Stage::Summarize,
        Stage::Retrieve | Stage::Summarize | Stage::End => Stage::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoqa_core::TaskConfig;

    fn walk(task: TaskConfig) -> Vec<Stage> {
        let state = PipelineState::new("q", task);
        let mut stage = Stage::Start;
        let mut path = vec![stage];
        while stage != Stage::End {
            stage = next_stage(stage, &state);
            path.push(stage);
        }
        path
    }

    #[test]
    fn plain_retrieval() {
        assert_eq!(walk(TaskConfig::default()), vec![Stage::Start, Stage::Retrieve, Stage::End]);
    }

    #[test]
    fn expansion_only() {
        let task = TaskConfig { expand_query: true, ..TaskConfig::default() };
        assert_eq!(walk(task), vec![Stage::Start, Stage::Expand, Stage::Retrieve, Stage::End]);
    }

    #[test]
    fn summarize_only() {
        let task = TaskConfig { summarize: true, ..TaskConfig::default() };
        assert_eq!(walk(task), vec![Stage::Start, Stage::Retrieve, Stage::Summarize, Stage::End]);
    }

    #[test]
    fn full_path() {
        let task = TaskConfig { expand_query: true, summarize: true, ..TaskConfig::default() };
        assert_eq!(walk(task), vec![Stage::Start, Stage::Expand, Stage::Retrieve, Stage::Summarize, Stage::End]);
    }

    #[test]
    fn end_is_terminal() {
        let state = PipelineState::new("q", TaskConfig { summarize: true, expand_query: true, ..TaskConfig::default() });
        assert_eq!(next_stage(Stage::End, &state), Stage::End);
    }
}
