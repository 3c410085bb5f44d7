//! Contribution Keep-Alive Bot
//!
//! Records one commit per UTC day to a target repository as a GitHub App.
//!
//! ## Binaries
//!
//! - `contrib-bot-server`: HTTP service exposing `POST /commit` and `GET /status`
//! - `daily-commit`: run the daily commit once and exit (cron, CI schedules)
//!
//! ## Flow
//!
//! 1. Sign a short-lived App JWT ([`auth`])
//! 2. Resolve the installation for the target repo and mint an installation token ([`github`])
//! 3. Read the keep-alive log and stop if today already has an entry ([`commit_log`])
//! 4. Append a timestamp and write it back against the revision that was read ([`orchestrator`])
//!
//! The server brackets each run with a per-process daily quota ([`rate_limit`]).
//!
//! ## Example
//!
//! ```bash
//! APP_ID=123456 \
//! PRIVATE_KEY_PATH=./key.pem \
//! TARGET_REPO=octo/keepalive \
//! INVOCATION_SECRET=s3cret \
//! contrib-bot-server --port 3000
//!
//! curl -X POST -H "X-APP-KEY: s3cret" http://localhost:3000/commit
//! ```

pub mod auth;
pub mod commit_log;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod orchestrator;
pub mod rate_limit;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::BotConfig;
pub use error::BotError;
pub use github::{GitHubApi, GitHubClient};
pub use orchestrator::{CommitOutcome, CommitStatus, DailyCommitJob, DailyCommitter};
pub use rate_limit::DailyRateLimiter;
