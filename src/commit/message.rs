//! Commit message generation through a completion service.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::commit::diff::DiffText;
use crate::commit::prompt::PromptTemplate;
use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::llm::{CompletionService, GeminiClient, retry_with_backoff};

/// Pattern: type(scope)!: description, type!: description, type(scope): description or type: description
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:\(([^)]+)\))?(!)?\s*:\s*").expect("header pattern is valid"));

/// Conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "perf" => Ok(Self::Perf),
            "test" => Ok(Self::Test),
            "build" => Ok(Self::Build),
            "ci" => Ok(Self::Ci),
            "chore" => Ok(Self::Chore),
            _ => Err(format!("Unknown commit type: {}", s)),
        }
    }
}

/// Parsed `type(scope)!:` prefix of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalHeader {
    pub commit_type: Option<CommitType>,
    pub scope: Option<String>,
    pub breaking: bool,
}

/// A single-line commit message produced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage(String);

impl CommitMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the conventional commit header, if the message has one.
    ///
    /// A header with an unknown type still parses, with `commit_type` set to
    /// `None`. Messages are never rejected on this basis.
    pub fn conventional(&self) -> Option<ConventionalHeader> {
        let caps = HEADER_RE.captures(&self.0)?;
        let commit_type = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<CommitType>().ok());
        let scope = caps.get(2).map(|m| m.as_str().to_string());
        let breaking = caps.get(3).is_some() || self.0.contains("BREAKING CHANGE:");

        Some(ConventionalHeader {
            commit_type,
            scope,
            breaking,
        })
    }

    /// True when the header names one of the known conventional types.
    pub fn is_conventional(&self) -> bool {
        self.conventional()
            .is_some_and(|header| header.commit_type.is_some())
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn a raw model answer into a commit message.
///
/// Every line-break character and backtick is removed, then surrounding
/// whitespace is trimmed. Returns `None` when nothing is left.
pub fn normalize_response(raw: &str) -> Option<CommitMessage> {
    let cleaned: String = raw
        .chars()
        .filter(|&c| c != '`' && !is_line_break(c))
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(CommitMessage(trimmed.to_string()))
    }
}

/// LF, CR, VT, FF, NEL and the Unicode line and paragraph separators.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Builds the prompt, calls the service and normalizes the answer.
pub struct MessageGenerator<S> {
    service: S,
    template: PromptTemplate,
    max_attempts: u32,
}

impl MessageGenerator<GeminiClient> {
    /// Build a generator backed by the Gemini HTTP client.
    pub fn from_config(
        config: &GeneratorConfig,
        template: PromptTemplate,
    ) -> Result<Self, GenerationError> {
        let client = GeminiClient::new(config)?;
        Ok(MessageGenerator::new(client, template).with_max_attempts(config.max_attempts))
    }
}

impl<S: CompletionService> MessageGenerator<S> {
    pub fn new(service: S, template: PromptTemplate) -> Self {
        Self {
            service,
            template,
            max_attempts: 1,
        }
    }

    /// Total attempts for transient failures. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Generate a commit message for `diff`.
    pub async fn generate(
        &self,
        diff: &DiffText,
        context: Option<&str>,
    ) -> Result<CommitMessage, GenerationError> {
        if diff.is_empty() {
            return Err(GenerationError::EmptyDiff);
        }

        let prompt = self.template.render(diff, context);
        debug!(
            "Commit prompt length: {} chars ({} diff chars)",
            prompt.len(),
            diff.len()
        );

        let raw = retry_with_backoff(
            self.max_attempts,
            || self.service.complete(&prompt),
            GenerationError::is_transient,
            |e| GenerationError::RetriesExhausted(Box::new(e)),
        )
        .await?;

        debug!("Raw response: {} chars", raw.len());
        let message = normalize_response(&raw).ok_or(GenerationError::EmptyResponse)?;

        if !message.is_conventional() {
            warn!("Generated message is not a conventional commit: {}", message);
        }

        Ok(message)
    }
}
