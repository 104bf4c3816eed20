//! User decision on the generated message and delegation to `git commit`.
//!
//! Commit creation shells out to the system `git` binary so the user's hooks,
//! signing config and editor are honored.

use std::path::Path;
use std::process::Command;

use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use tracing::debug;

use crate::error::CommitError;

/// What to do with a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Edit,
    Reject,
}

impl Decision {
    const CHOICES: [&'static str; 3] = ["Yes, commit it", "Edit before committing", "No, discard it"];

    fn from_index(index: usize) -> Self {
        match index {
            0 => Decision::Accept,
            1 => Decision::Edit,
            _ => Decision::Reject,
        }
    }
}

/// Ask whether to use the message. An interrupted prompt counts as `Reject`.
pub fn prompt_decision() -> Decision {
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Use this commit message?")
        .items(&Decision::CHOICES)
        .default(0)
        .interact_opt();

    match selection {
        Ok(Some(index)) => Decision::from_index(index),
        Ok(None) => Decision::Reject,
        Err(e) => {
            debug!("Decision prompt failed: {}", e);
            Decision::Reject
        }
    }
}

/// Fail early when no `git` executable is on PATH.
pub fn check_git_installed() -> Result<(), CommitError> {
    if which::which("git").is_err() {
        return Err(CommitError::GitNotInstalled);
    }
    Ok(())
}

/// Create a commit from the staged changes in `workdir`.
///
/// With `edit`, git opens the configured editor pre-filled with `message`;
/// stdio is inherited so the editor can take over the terminal.
pub fn commit_with_message(workdir: &Path, message: &str, edit: bool) -> Result<(), CommitError> {
    let workdir = workdir.to_string_lossy();
    let mut args = vec!["-C", &*workdir, "commit", "-m", message];

    if edit {
        args.push("--edit");
        return run_git_interactive(&args, "commit");
    }

    run_git(&args, "commit")
}

/// Run a git command and return success or a descriptive error.
fn run_git(args: &[&str], operation: &str) -> Result<(), CommitError> {
    debug!("Running git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|e| CommitError::GitFailed(format!("Failed to run git {}: {}", operation, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(CommitError::GitFailed(format!(
            "git {} failed: {}",
            operation, detail
        )));
    }

    Ok(())
}

/// Like [`run_git`] but with the terminal handed over to git.
fn run_git_interactive(args: &[&str], operation: &str) -> Result<(), CommitError> {
    debug!("Running git {} (interactive)", args.join(" "));
    let status = Command::new("git")
        .args(args)
        .status()
        .map_err(|e| CommitError::GitFailed(format!("Failed to run git {}: {}", operation, e)))?;

    if !status.success() {
        return Err(CommitError::GitFailed(format!(
            "git {} failed: {}",
            operation, status
        )));
    }

    Ok(())
}
