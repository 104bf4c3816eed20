//! Staged diff to commit message, end to end.

use tracing::debug;

use crate::commit::diff::{DiffSource, StagedDiff};
use crate::commit::message::{CommitMessage, MessageGenerator};
use crate::error::PipelineError;
use crate::llm::CompletionService;

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub diff: StagedDiff,
    pub message: CommitMessage,
}

/// Runs a diff source and then a message generator.
pub struct Pipeline<D, S> {
    source: D,
    generator: MessageGenerator<S>,
}

impl<D: DiffSource, S: CompletionService> Pipeline<D, S> {
    pub fn new(source: D, generator: MessageGenerator<S>) -> Self {
        Self { source, generator }
    }

    /// Collect the staged diff and generate a message for it.
    ///
    /// The completion service is only contacted when something is staged.
    pub async fn run(&self, context: Option<&str>) -> Result<PipelineOutput, PipelineError> {
        let diff = self.source.staged_diff()?;
        if diff.text.is_empty() {
            return Err(PipelineError::NoStagedChanges);
        }

        debug!(
            "Diff: {} files, {} additions, {} deletions, truncated={}, focused={}",
            diff.changed_files.len(),
            diff.additions,
            diff.deletions,
            diff.truncated,
            diff.focused
        );

        let message = self.generator.generate(&diff.text, context).await?;
        Ok(PipelineOutput { diff, message })
    }
}
