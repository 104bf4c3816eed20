//! autocommit - Generate a conventional commit message for the staged changes.
//!
//! # Overview
//!
//! autocommit reads the staged diff from the local repository with libgit2,
//! sends it to a text-completion service wrapped in a fixed instruction prompt,
//! and returns a single-line message. The binary then lets the user accept,
//! edit or reject it before delegating to `git commit`.

pub mod commit;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;

// Re-export commonly used types
pub use commit::{CommitMessage, DiffCollector, DiffSource, DiffText, MessageGenerator, PromptTemplate, StagedDiff};
pub use config::GeneratorConfig;
pub use error::{CommitError, GenerationError, PipelineError, PromptError};
pub use llm::{CompletionService, GeminiClient};
pub use pipeline::{Pipeline, PipelineOutput};
