//! Prompt construction for AI-generated commit messages.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::commit::diff::DiffText;
use crate::error::PromptError;

/// File name looked up at the work-tree root for a project-specific template.
pub const PROJECT_PROMPT_FILE: &str = ".autocommit-prompt.txt";

/// Instruction text used when no template file is found.
pub const DEFAULT_INSTRUCTIONS: &str = "You are an expert programmer writing a Git commit message.
Your task is to generate a concise and descriptive commit message in English, following the Conventional Commits specification.
The commit message must start with a type like 'feat:', 'fix:', 'refactor:', 'chore:', 'docs:', 'test:', 'perf:', 'build:', 'ci:' or 'style:', optionally followed by a scope in parentheses, e.g. 'feat(parser): ...'.
Use the imperative mood and keep the summary objective, highlighting the main change.
Do not include any explanations, quotes or markdown, just the commit message itself.";

const DIFF_START_MARKER: &str = "--- GIT DIFF ---";
const DIFF_END_MARKER: &str = "--- END OF GIT DIFF ---";
const SINGLE_LINE_REQUEST: &str =
    "Answer with a single line in the form `type(scope): summary`. Generate the commit message now:";

/// Where the instruction text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Path given on the command line or in the environment.
    Configured(PathBuf),
    /// Template checked into the repository.
    Project(PathBuf),
    BuiltIn,
}

/// Fixed instruction text wrapped around every diff.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    instructions: String,
    source: PromptSource,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    pub fn builtin() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            source: PromptSource::BuiltIn,
        }
    }

    pub fn from_text(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            source: PromptSource::BuiltIn,
        }
    }

    /// Resolve the template.
    ///
    /// Lookup order: `configured` path (must be readable), then
    /// [`PROJECT_PROMPT_FILE`] under `workdir`, then the built-in text.
    pub fn load(configured: Option<&Path>, workdir: Option<&Path>) -> Result<Self, PromptError> {
        if let Some(path) = configured {
            let instructions = read_template(path)?;
            debug!("Using prompt template from {}", path.display());
            return Ok(Self {
                instructions,
                source: PromptSource::Configured(path.to_path_buf()),
            });
        }

        if let Some(dir) = workdir {
            let path = dir.join(PROJECT_PROMPT_FILE);
            if path.is_file() {
                let instructions = read_template(&path)?;
                debug!("Using project prompt template {}", path.display());
                return Ok(Self {
                    instructions,
                    source: PromptSource::Project(path),
                });
            }
        }

        Ok(Self::builtin())
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn source(&self) -> &PromptSource {
        &self.source
    }

    /// Build the full prompt for one diff.
    ///
    /// The diff is embedded verbatim between the start and end markers.
    pub fn render(&self, diff: &DiffText, context: Option<&str>) -> String {
        let mut prompt = String::with_capacity(self.instructions.len() + diff.len() + 256);

        prompt.push_str(self.instructions.trim_end());
        prompt.push('\n');

        if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str("It's important to bear the following in mind: ");
            prompt.push_str(context);
            prompt.push('\n');
        }

        prompt.push('\n');
        prompt.push_str(DIFF_START_MARKER);
        prompt.push('\n');
        prompt.push_str(diff.as_str());
        if !diff.as_str().ends_with('\n') {
            prompt.push('\n');
        }
        prompt.push_str(DIFF_END_MARKER);
        prompt.push_str("\n\n");
        prompt.push_str(SINGLE_LINE_REQUEST);

        prompt
    }
}

fn read_template(path: &Path) -> Result<String, PromptError> {
    let text = fs::read_to_string(path).map_err(|source| PromptError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(PromptError::Empty(path.to_path_buf()));
    }
    Ok(text)
}
