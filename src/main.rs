//! Blockwall content feed updater — binary entrypoint.
//! Refreshes substack.json from the Substack RSS feed, then sniffs the shape
//! of every tracked data file.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blockwall_feeds::ingest::providers::substack_rss::SubstackRssProvider;
use blockwall_feeds::validate::{default_targets, validate_all, FileStatus, ValidationReport};
use blockwall_feeds::{update_substack, FeedsConfig, UpdateOutcome};

#[derive(Parser, Debug)]
#[command(name = "blockwall-feeds")]
#[command(about = "Blockwall Content Feed Updater", long_about = None)]
#[command(version)]
struct Cli {
    /// Update the Substack feed (the default when no mode flag is given)
    #[arg(long)]
    substack: bool,

    /// Validate JSON files only; no fetch
    #[arg(long)]
    validate: bool,

    /// Exit with status 1 when validation finds a broken file
    #[arg(long)]
    strict: bool,

    /// Config file (TOML); defaults to $FEEDS_CONFIG_PATH or config/feeds.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the JSON data files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// RSS/Atom feed URL
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// Read the feed from a local file instead of HTTP
    #[arg(long, value_name = "PATH", conflicts_with = "feed_url")]
    feed_file: Option<PathBuf>,
}

/// Logs go to stderr so stdout carries only the status lines.
/// Filter comes from RUST_LOG, default `blockwall_feeds=info,warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blockwall_feeds=info,feeds=info,validate=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Never fails: a broken config file falls back to defaults so validation
/// still runs.
fn load_config(cli: &Cli) -> FeedsConfig {
    let mut cfg = FeedsConfig::load_or_default(cli.config.as_deref());
    if let Some(dir) = &cli.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(url) = &cli.feed_url {
        cfg.substack_url = url.clone();
    }
    cfg
}

async fn run_update(cli: &Cli, cfg: &FeedsConfig) {
    let provider = match &cli.feed_file {
        Some(path) => SubstackRssProvider::from_file(path),
        None => match SubstackRssProvider::from_url(&cfg.substack_url, &cfg.user_agent) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = ?e, "cannot build feed client");
                println!("  INFO  Using existing substack.json (client setup failed: {e:#})");
                return;
            }
        },
    };

    println!("Fetching Substack RSS: {}", provider.origin());
    match update_substack(&provider, cfg).await {
        out @ UpdateOutcome::Written { .. } => println!("  OK    {out}"),
        out @ UpdateOutcome::KeptExisting { .. } => println!("  INFO  {out}"),
    }
}

fn print_report(report: &ValidationReport) {
    println!();
    println!("Validating JSON files...");
    for file in &report.files {
        let tag = match &file.status {
            s if s.is_fatal() => "FAIL",
            FileStatus::Valid(_) => "OK",
            FileStatus::Empty => "INFO",
            FileStatus::NotFound | FileStatus::MissingFields(_) => "WARN",
            _ => "INFO",
        };
        println!("  {tag:<5} {file}");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = load_config(&cli);
    tracing::debug!(?cfg, "config resolved");

    let targets = default_targets(&cfg.data_dir);

    // --validate wins over --substack; otherwise an update always runs.
    let update = !cli.validate;
    tracing::debug!(substack = cli.substack, validate = cli.validate, update, "mode");
    if update {
        run_update(&cli, &cfg).await;
    }

    let report = validate_all(&targets);
    print_report(&report);

    if update {
        println!();
        println!("Feed update complete.");
        println!();
        println!("Note: LinkedIn feed requires manual curation.");
        println!("Edit {} to add posts/reposts.", cfg.linkedin_json().display());
    }

    if cli.strict && !report.all_valid {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
