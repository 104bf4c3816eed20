//! autocommit - CLI entry point.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use autocommit::commit::{Decision, check_git_installed, commit_with_message, prompt_decision};
use autocommit::{CommitMessage, DiffCollector, GeneratorConfig, MessageGenerator, Pipeline, PipelineError, PromptTemplate};

/// Generate a conventional commit message for the staged changes.
#[derive(Parser, Debug)]
#[command(name = "autocommit")]
#[command(about = "Generate a conventional commit message for the staged changes")]
#[command(version)]
struct Cli {
    /// Extra instruction for the model, e.g. a ticket number or intent
    context: Option<String>,

    /// Repository path
    #[arg(short = 'C', long = "path", default_value = ".")]
    path: PathBuf,

    /// Model name (overrides AUTOCOMMIT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Instruction template file (overrides AUTOCOMMIT_PROMPT_FILE)
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Print the message and exit without committing
    #[arg(long)]
    print_only: bool,

    /// Commit without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("error:").red().bold(), e);
        let code = e
            .downcast_ref::<PipelineError>()
            .map(PipelineError::exit_code)
            .unwrap_or(1);
        process::exit(code);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("autocommit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = GeneratorConfig::from_env();
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(prompt_file) = cli.prompt_file {
        config.prompt_file = Some(prompt_file);
    }

    let committing = !cli.print_only;
    if committing {
        check_git_installed().map_err(PipelineError::from)?;
    }

    let collector = DiffCollector::open(&cli.path)
        .map_err(PipelineError::from)?
        .with_config(&config);
    let workdir = collector.workdir();
    let commit_dir = commit_target(workdir.as_deref(), committing)?;

    let template = PromptTemplate::load(config.prompt_file.as_deref(), workdir.as_deref())
        .context("Failed to load prompt template")?;
    let generator = MessageGenerator::from_config(&config, template).map_err(PipelineError::from)?;
    let pipeline = Pipeline::new(collector, generator);

    eprintln!(
        "{}",
        style(format!("Generating commit message with {}...", config.model)).dim()
    );

    let output = pipeline.run(cli.context.as_deref()).await?;
    let message = output.message;

    if output.diff.truncated {
        eprintln!(
            "{}",
            style("Note: the staged diff was truncated before sending.").yellow()
        );
    } else if output.diff.focused {
        eprintln!(
            "{}",
            style("Note: only the focus paths of the staged diff were sent.").yellow()
        );
    }

    write_message(&mut io::stdout().lock(), &message).context("Failed to write message")?;

    let Some(workdir) = commit_dir else {
        return Ok(());
    };

    let decision = if cli.yes {
        Decision::Accept
    } else {
        prompt_decision()
    };

    match decision {
        Decision::Accept => {
            commit_with_message(&workdir, message.as_str(), false).map_err(PipelineError::from)?;
            eprintln!("{}", style("Committed.").green());
        }
        Decision::Edit => {
            commit_with_message(&workdir, message.as_str(), true).map_err(PipelineError::from)?;
            eprintln!("{}", style("Committed.").green());
        }
        Decision::Reject => {
            eprintln!("{}", style("Commit message discarded.").yellow());
        }
    }

    Ok(())
}

/// Work tree to commit in, or `None` when only printing.
///
/// Fails before any completion request when the repository has no work tree.
fn commit_target(workdir: Option<&Path>, committing: bool) -> Result<Option<PathBuf>> {
    if !committing {
        return Ok(None);
    }
    match workdir {
        Some(dir) => Ok(Some(dir.to_path_buf())),
        None => bail!("Cannot commit in a bare repository"),
    }
}

/// The message is the only thing written to stdout.
fn write_message(out: &mut impl Write, message: &CommitMessage) -> io::Result<()> {
    writeln!(out, "{}", message)?;
    out.flush()
}
