//! Skiff CLI
//!
//! Binary entry point. One-shot mode runs a single prompt through the
//! agent; with no prompt, an interactive shell accepts one prompt per
//! line, each processed as a full run.

mod render;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use skiff_core::config::DEFAULT_MAX_STEPS;
use skiff_core::{Agent, FileConfig, RunConfig, RunOutcome, DEFAULT_MODEL};
use skiff_provider_gemini::GeminiClient;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "skiff",
    version,
    about = "Local AI coding agent powered by Gemini",
    long_about = "skiff is a local coding agent for file operations and script execution.\n\
                  It sends your request to the Gemini API and executes the model's\n\
                  function calls inside a sandboxed working directory.\n\n\
                  Examples:\n  \
                  skiff \"Create a hello world program in Python\"\n  \
                  skiff --dir ./myproject \"List all files in this directory\"\n  \
                  skiff --verbose --allow-run \"Execute my test script\""
)]
struct Cli {
    /// Instruction for the agent; omit to enter interactive mode
    prompt: Option<String>,

    /// Working directory (default: current directory)
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Maximum agent loop iterations
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show what would be done without making changes
    #[arg(long)]
    dry_run: bool,

    /// Allow execution of programs
    #[arg(long)]
    allow_run: bool,

    /// Apply file changes without showing a diff preview
    #[arg(long)]
    apply: bool,

    /// Show information about skiff
    #[arg(long)]
    info: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // All logging goes to stderr; user-facing output owns stdout.
    // Disable ANSI color codes when stderr is not a real terminal.
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_ansi(is_tty)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("❌ skiff fatal error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("   caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.info {
        render::print_banner();
        render::print_info();
        return Ok(());
    }

    let file_config = FileConfig::load_default()?;
    let api_key = file_config.require_api_key()?;
    let model = cli
        .model
        .clone()
        .or_else(|| file_config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let root = match &cli.dir {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("invalid working directory: {}", dir.display()))?,
        None => std::env::current_dir()
            .context("failed to get working directory")?
            .canonicalize()?,
    };

    let config = RunConfig {
        root,
        model,
        max_steps: cli.max_steps,
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        allow_run: cli.allow_run,
        auto_apply: cli.apply,
    };

    info!(root = %config.root.display(), model = %config.model, "starting skiff");

    match &cli.prompt {
        Some(prompt) => run_once(&config, &api_key, prompt).await,
        None => {
            render::print_banner();
            render::print_info();
            shell::run_shell(&config, &api_key).await
        }
    }
}

/// One full agent run for one prompt.
pub(crate) async fn run_once(config: &RunConfig, api_key: &str, prompt: &str) -> Result<()> {
    let client = Arc::new(GeminiClient::new(api_key, &config.model));
    let agent = Agent::new(config.clone(), client, Some(render::event_sink()));

    let report = agent.run(prompt).await?;

    match report.outcome {
        RunOutcome::Completed => {}
        RunOutcome::RepeatedCall => {
            eprintln!("⚠ model kept repeating the same function call; stopping.");
        }
        RunOutcome::StepBudgetExhausted => {
            eprintln!("⚠ reached maximum steps ({})", config.max_steps);
        }
    }
    Ok(())
}
