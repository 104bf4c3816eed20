//! Staged diff collection using git2.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{Delta, Diff, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use tracing::{debug, warn};

use crate::config::{DEFAULT_MAX_DIFF_CHARS, GeneratorConfig};
use crate::error::CommitError;

/// Status of a changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
        }
    }
}

/// A file with staged changes.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
}

/// The unified diff of staged changes, passed through to the prompt untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffText(String);

impl DiffText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Length in characters, the unit of the size limit.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// True when the text holds nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for DiffText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DiffText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Staged changes collected from the index.
#[derive(Debug, Clone)]
pub struct StagedDiff {
    pub text: DiffText,
    pub changed_files: Vec<ChangedFile>,
    pub additions: usize,
    pub deletions: usize,
    /// The text was cut to the size limit.
    pub truncated: bool,
    /// The text was narrowed to the configured focus paths.
    pub focused: bool,
}

/// Anything that can produce the staged change set.
pub trait DiffSource {
    fn staged_diff(&self) -> Result<StagedDiff, CommitError>;
}

/// Reads the staging area of a local repository.
pub struct DiffCollector {
    repo: Repository,
    max_chars: usize,
    focus_paths: Vec<String>,
}

impl DiffCollector {
    /// Discover the repository containing `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CommitError> {
        let repo = Repository::discover(path.as_ref()).map_err(CommitError::NotARepository)?;
        Ok(Self::from_repository(repo))
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo,
            max_chars: DEFAULT_MAX_DIFF_CHARS,
            focus_paths: Vec::new(),
        }
    }

    /// Apply the size limit and focus paths from the configuration.
    pub fn with_config(self, config: &GeneratorConfig) -> Self {
        self.with_limits(config.max_diff_chars, config.focus_paths.clone())
    }

    pub fn with_limits(mut self, max_chars: usize, focus_paths: Vec<String>) -> Self {
        self.max_chars = max_chars;
        self.focus_paths = focus_paths;
        self
    }

    /// Root of the work tree, `None` for bare repositories.
    pub fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    /// Collect the staged diff, narrowing or truncating it if it is too large.
    pub fn collect(&self) -> Result<StagedDiff, CommitError> {
        let full = collect_staged_diff(&self.repo, &[])?;
        let full_len = full.text.char_count();

        if full_len <= self.max_chars {
            return Ok(full);
        }

        if !self.focus_paths.is_empty() {
            debug!(
                "Staged diff is {} chars (limit {}), retrying with focus paths {:?}",
                full_len, self.max_chars, self.focus_paths
            );
            match collect_staged_diff(&self.repo, &self.focus_paths) {
                Ok(mut focused) if focused.text.char_count() <= self.max_chars => {
                    focused.focused = true;
                    return Ok(focused);
                }
                Ok(_) => debug!("Focused diff is still over the limit"),
                Err(CommitError::NoStagedChanges) => debug!("No staged changes under focus paths"),
                Err(e) => return Err(e),
            }
        }

        warn!(
            "Staged diff is {} chars, truncating to {} for the prompt",
            full_len, self.max_chars
        );
        Ok(truncate_diff(full, self.max_chars))
    }
}

impl DiffSource for DiffCollector {
    fn staged_diff(&self) -> Result<StagedDiff, CommitError> {
        self.collect()
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(CommitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(CommitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Diff HEAD against the index, optionally restricted to `pathspecs`.
///
/// In a repository without commits every index entry shows up as added.
pub fn collect_staged_diff(
    repo: &Repository,
    pathspecs: &[String],
) -> Result<StagedDiff, CommitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut opts = DiffOptions::new();
    for p in pathspecs {
        opts.pathspec(p);
    }
    let mut staged = repo
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(CommitError::DiffFailed)?;
    staged.find_similar(None).map_err(CommitError::DiffFailed)?;

    let changed_files = collect_files_from_diff(&staged);
    if changed_files.is_empty() {
        return Err(CommitError::NoStagedChanges);
    }

    let (text, additions, deletions) = render_patch(&staged)?;

    Ok(StagedDiff {
        text: DiffText::new(text),
        changed_files,
        additions,
        deletions,
        truncated: false,
        focused: false,
    })
}

/// Collect changed file entries from a diff.
fn collect_files_from_diff(diff: &Diff<'_>) -> Vec<ChangedFile> {
    let mut files = Vec::new();

    for delta in diff.deltas() {
        let status = match delta.status() {
            Delta::Added | Delta::Untracked => FileStatus::Added,
            Delta::Modified => FileStatus::Modified,
            Delta::Deleted => FileStatus::Deleted,
            Delta::Renamed => FileStatus::Renamed,
            _ => FileStatus::Modified,
        };

        let new_path = delta
            .new_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());
        let old_path = delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());

        let (path, old_path) = match status {
            FileStatus::Renamed => (new_path.clone().or_else(|| old_path.clone()).unwrap_or_default(), old_path),
            _ => (new_path.or(old_path).unwrap_or_default(), None),
        };

        if !path.is_empty() {
            files.push(ChangedFile { path, status, old_path });
        }
    }

    files
}

/// Render a diff as unified patch text with addition/deletion counts.
fn render_patch(diff: &Diff<'_>) -> Result<(String, usize, usize), CommitError> {
    let mut text = String::new();
    let mut additions = 0usize;
    let mut deletions = 0usize;

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        match origin {
            '+' => additions += 1,
            '-' => deletions += 1,
            _ => {}
        }

        // File and hunk headers carry their own text; content lines need the marker.
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));

        true
    })
    .map_err(CommitError::DiffFailed)?;

    Ok((text, additions, deletions))
}

/// Keep the first `max_chars` characters of the diff text and mark the cut.
fn truncate_diff(mut diff: StagedDiff, max_chars: usize) -> StagedDiff {
    let original = diff.text.as_str();
    let total = diff.text.char_count();
    let kept = max_chars.min(total);

    let end = original
        .char_indices()
        .nth(kept)
        .map(|(idx, _)| idx)
        .unwrap_or(original.len());

    let mut text = original[..end].to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&format!("[diff truncated: {} of {} characters shown]\n", kept, total));

    diff.text = DiffText::new(text);
    diff.truncated = true;
    diff
}
