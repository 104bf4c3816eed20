//! Staged diff collection, prompt construction and commit message generation.

pub mod diff;
pub mod finalize;
pub mod message;
pub mod prompt;

pub use diff::{ChangedFile, DiffCollector, DiffSource, DiffText, FileStatus, StagedDiff};
pub use finalize::{Decision, check_git_installed, commit_with_message, prompt_decision};
pub use message::{CommitMessage, CommitType, ConventionalHeader, MessageGenerator, normalize_response};
pub use prompt::{PromptSource, PromptTemplate};
