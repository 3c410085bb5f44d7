//! Bot Configuration
//!
//! Settings come from command-line flags with environment variable fallbacks.
//! Required values are checked when a job is built, not at startup, so a
//! misconfigured server still comes up and reports the problem per request.

use base64::{engine::general_purpose, Engine as _};
use clap::Args;
use std::fs;

use crate::auth::AppCredentials;
use crate::error::BotError;
use crate::github::{CommitterIdentity, GITHUB_API};
use crate::orchestrator::DailyCommitJob;

pub const DEFAULT_BOT_BRANCH: &str = "contrib-bot";
pub const DEFAULT_LOG_PATH: &str = "contributions/keep_alive.md";
pub const DEFAULT_COMMIT_NAME: &str = "contrib-bot";
pub const DEFAULT_COMMIT_EMAIL: &str = "noreply@github.com";

/// GitHub App and target repository settings
#[derive(Args, Debug, Clone)]
pub struct BotConfig {
    /// GitHub App ID
    #[arg(long, env = "APP_ID")]
    pub app_id: Option<String>,

    /// GitHub App private key (PEM, literal `\n` escapes allowed)
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// GitHub App private key, base64-encoded PEM
    #[arg(long, env = "PRIVATE_KEY_B64", hide_env_values = true)]
    pub private_key_b64: Option<String>,

    /// Path to the GitHub App private key PEM file
    #[arg(long, env = "PRIVATE_KEY_PATH")]
    pub private_key_path: Option<String>,

    /// Repository to commit to, in format owner/repo
    #[arg(long, env = "TARGET_REPO")]
    pub target_repo: Option<String>,

    /// Branch that receives the bot commits
    #[arg(long, env = "BOT_BRANCH", default_value = DEFAULT_BOT_BRANCH)]
    pub bot_branch: String,

    /// Path of the keep-alive log inside the repository
    #[arg(long, env = "LOG_PATH", default_value = DEFAULT_LOG_PATH)]
    pub log_path: String,

    /// Committer name
    #[arg(long, env = "COMMIT_NAME", default_value = DEFAULT_COMMIT_NAME)]
    pub commit_name: String,

    /// Committer email
    #[arg(long, env = "COMMIT_EMAIL", default_value = DEFAULT_COMMIT_EMAIL)]
    pub commit_email: String,

    /// Shared secret expected in the X-APP-KEY header (disabled when unset)
    #[arg(long, env = "INVOCATION_SECRET", hide_env_values = true)]
    pub invocation_secret: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API)]
    pub github_api_url: String,
}

impl BotConfig {
    /// Build the commit job, failing with [`BotError::Config`] on missing settings
    pub fn resolve(&self) -> Result<DailyCommitJob, BotError> {
        let app_id = non_empty(&self.app_id);
        let private_key = self.load_private_key()?;
        let target_repo = non_empty(&self.target_repo);

        let (Some(app_id), Some(private_key), Some(target_repo)) =
            (app_id, private_key, target_repo)
        else {
            return Err(BotError::Config(
                "APP_ID, PRIVATE_KEY and TARGET_REPO required".to_string(),
            ));
        };

        Ok(DailyCommitJob {
            credentials: AppCredentials::new(app_id, private_key),
            target: target_repo.parse()?,
            branch: self.bot_branch.clone(),
            path: self.log_path.clone(),
            committer: Some(CommitterIdentity {
                name: self.commit_name.clone(),
                email: self.commit_email.clone(),
            }),
        })
    }

    /// The configured invocation secret, ignoring an empty value
    pub fn invocation_secret(&self) -> Option<&str> {
        non_empty(&self.invocation_secret)
    }

    /// Private key from the first source that is set: inline, base64, file
    fn load_private_key(&self) -> Result<Option<String>, BotError> {
        if let Some(pem) = non_empty(&self.private_key) {
            return Ok(Some(pem.to_string()));
        }

        if let Some(encoded) = non_empty(&self.private_key_b64) {
            let decoded = general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| BotError::Config(format!("PRIVATE_KEY_B64 is not base64: {e}")))?;
            let pem = String::from_utf8(decoded)
                .map_err(|_| BotError::Config("PRIVATE_KEY_B64 is not UTF-8".to_string()))?;
            return Ok(Some(pem));
        }

        if let Some(path) = non_empty(&self.private_key_path) {
            let pem = fs::read_to_string(path).map_err(|e| {
                BotError::Config(format!("Failed to read private key {}: {}", path, e))
            })?;
            return Ok(Some(pem));
        }

        Ok(None)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
