//! Contribution Keep-Alive Server
//!
//! Serves `POST /commit` and `GET /status` for an external scheduler.
//!
//! ## Usage
//! ```bash
//! APP_ID=123456 \
//! PRIVATE_KEY="$(cat key.pem)" \
//! TARGET_REPO=octo/keepalive \
//! INVOCATION_SECRET=s3cret \
//! contrib-bot-server
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use contrib_bot::logging::{self, LogFormat};
use contrib_bot::server::{router, AppState};
use contrib_bot::{BotConfig, GitHubClient};

/// Contribution keep-alive HTTP server
#[derive(Parser, Debug)]
#[command(name = "contrib-bot-server")]
#[command(about = "Serve the daily keep-alive commit over HTTP")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: BotConfig,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Log output format
    #[arg(long, value_enum, default_value = "json")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_format, "info");

    info!("🚀 Starting contrib-bot server");

    if let Err(e) = args.config.resolve() {
        warn!("{} (requests will fail until fixed)", e);
    }
    if args.config.invocation_secret().is_none() {
        warn!("INVOCATION_SECRET not set; /commit is open to anyone who can reach it");
    }

    let github = GitHubClient::new(args.config.github_api_url.clone())
        .context("Failed to create GitHub client")?;
    let state = AppState::new(args.config, Arc::new(github));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("📡 Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
