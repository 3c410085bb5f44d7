//! Daily Commit Runner
//!
//! Runs the keep-alive commit once and exits. Meant for cron jobs and CI
//! schedules that do not need the HTTP server.
//!
//! ## Usage
//! ```bash
//! # With command line arguments
//! daily-commit \
//!   --app-id 123456 \
//!   --private-key-path ./key.pem \
//!   --target-repo octo/keepalive
//!
//! # With environment variables, JSON output
//! APP_ID=123456 \
//! PRIVATE_KEY_PATH=./key.pem \
//! TARGET_REPO=octo/keepalive \
//! daily-commit --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::info;

use contrib_bot::logging::{self, LogFormat};
use contrib_bot::{BotConfig, CommitStatus, DailyCommitter, GitHubClient};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the daily keep-alive commit once
#[derive(Parser, Debug)]
#[command(name = "daily-commit")]
#[command(about = "Append today's keep-alive entry unless it already exists")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: BotConfig,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(LogFormat::Text, if args.verbose { "debug" } else { "info" });

    let job = args.config.resolve()?;
    let github = GitHubClient::new(args.config.github_api_url.clone())
        .context("Failed to create GitHub client")?;

    info!("🔐 Committing to {} ({})", job.target, job.branch);
    let outcome = DailyCommitter::new(Arc::new(github))
        .run(&job)
        .await
        .context("Daily commit failed")?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => match outcome.status {
            CommitStatus::Committed => {
                let sha = outcome
                    .result
                    .as_ref()
                    .map(|r| r.commit.sha.as_str())
                    .unwrap_or("unknown");
                println!("✅ Committed {} to {} ({})", outcome.timestamp, job.branch, sha);
            }
            CommitStatus::AlreadyDone => {
                println!("ℹ️  Already committed today (UTC): {}", outcome.timestamp);
            }
        },
    }

    Ok(())
}
