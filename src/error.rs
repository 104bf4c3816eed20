//! Error types for autocommit modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading the repository and delegating to git.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Not a git repository (or any parent directory): {0}")]
    NotARepository(#[source] git2::Error),

    #[error("No staged changes to commit. Use 'git add <files>' first.")]
    NoStagedChanges,

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("git executable not found in PATH. Install git and try again.")]
    GitNotInstalled,

    #[error("{0}")]
    GitFailed(String),
}

/// Errors from the completion service and message normalization.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("No API key configured. Set API_KEY (or GEMINI_API_KEY) in the environment or a .env file")]
    MissingApiKey,

    #[error("Refusing to generate a message for an empty diff")]
    EmptyDiff,

    #[error("Request to completion service failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Completion service timed out after {0} seconds")]
    Timeout(u64),

    #[error("Completion service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Completion service returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Completion service returned an empty message")]
    EmptyResponse,

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GenerationError>),
}

impl GenerationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Request(_) | GenerationError::Timeout(_) => true,
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors from loading the instruction template.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to read prompt file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt file {0} is empty")]
    Empty(PathBuf),
}

/// Terminal failures of the diff-to-message pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No staged changes to commit. Use 'git add <files>' first.")]
    NoStagedChanges,

    #[error("Could not generate a commit message: {0}. Retry, or write the message manually.")]
    GenerationFailed(#[source] GenerationError),

    #[error(transparent)]
    Repository(CommitError),
}

impl PipelineError {
    /// Process exit status for this failure. Always non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::NoStagedChanges => 2,
            PipelineError::GenerationFailed(_) => 3,
            PipelineError::Repository(_) => 1,
        }
    }
}

impl From<CommitError> for PipelineError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::NoStagedChanges => PipelineError::NoStagedChanges,
            other => PipelineError::Repository(other),
        }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        PipelineError::GenerationFailed(err)
    }
}
