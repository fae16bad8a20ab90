//! redacto: review-and-burn PDF redaction from the terminal
//!
//! Analyze a document against the redaction service, review what it found,
//! approve or reject each detection, and write the sanitized
//! `REDACTED_<name>` copy.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use redacto_core::config::{self, ClientConfig, ENV_API_URL, ENV_THEME, ENV_TIMEOUT_SECS};

mod commands;
mod render;
mod review;

const DEFAULT_CONFIG_FILE: &str = "redacto.toml";

#[derive(Parser, Debug)]
#[command(name = "redacto")]
#[command(version, about = "Review-and-burn PDF redaction client")]
struct Cli {
    /// Base URL of the redaction service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Configuration file (defaults to ./redacto.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Color theme: cyber, midnight, amber or light
    #[arg(long, global = true)]
    theme: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect sensitive content and print the audit log
    Analyze(AnalyzeArgs),
    /// Analyze, review, and write a permanently redacted copy
    Redact(RedactArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// PDF document to analyze
    pub file: PathBuf,

    /// Print detections as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the highlighted preview to this path
    #[arg(long)]
    pub preview_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// PDF document to redact
    pub file: PathBuf,

    /// Directory for the REDACTED_ output
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Positions (1-based) of detections to leave unredacted
    #[arg(long, value_delimiter = ',')]
    pub reject: Vec<usize>,

    /// Entity type to leave unredacted (repeatable)
    #[arg(long = "reject-type")]
    pub reject_type: Vec<String>,

    /// Review detections interactively before burning
    #[arg(short, long)]
    pub interactive: bool,

    /// Write the highlighted preview to this path
    #[arg(long)]
    pub preview_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries results; logs go to stderr
    let default_level = if cli.verbose { "redacto=debug" } else { "redacto=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(&cli)?;
    tracing::debug!(api_base = %config.api_base, timeout_secs = ?config.timeout_secs, "configuration resolved");
    config::init(config);

    match cli.command {
        Command::Analyze(args) => commands::analyze(args).await,
        Command::Redact(args) => commands::redact(args).await,
    }
}

/// Defaults, then the config file, then environment, then flags
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let base = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            ClientConfig::from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?
        }
        None => ClientConfig::default(),
    };

    let config = base
        .with_env()
        .context("Invalid REDACTO_* environment variable")?;

    let flags = cli_overrides(cli);
    config
        .with_overrides(|key| flags.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone()))
        .context("Invalid command-line option")
}

fn cli_overrides(cli: &Cli) -> Vec<(&'static str, String)> {
    let mut flags = Vec::new();
    if let Some(url) = &cli.api_url {
        flags.push((ENV_API_URL, url.clone()));
    }
    if let Some(secs) = cli.timeout_secs {
        flags.push((ENV_TIMEOUT_SECS, secs.to_string()));
    }
    if let Some(theme) = &cli.theme {
        flags.push((ENV_THEME, theme.clone()));
    }
    flags
}
