//! Daily Commit Orchestrator
//!
//! Runs the whole keep-alive flow:
//!
//! 1. Sign the App JWT, resolve the installation, mint an installation token
//! 2. Read the log file from the bot branch
//! 3. Stop if the last entry is already from today (UTC)
//! 4. Otherwise append a new entry and write it back, based on the revision
//!    that was read, so a concurrent change makes the write fail instead of
//!    being overwritten
//!
//! Every step returns a `Result` and the first failure ends the run. Nothing
//! is written unless all earlier steps succeeded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{sign_app_jwt_at, AppCredentials};
use crate::commit_log::{self, LogState};
use crate::error::BotError;
use crate::github::{
    CommitterIdentity, FileUpdate, GitHubApi, InstallationToken, RemoteFile, RepoTarget,
    WriteResult,
};

/// Everything needed to run the keep-alive commit once
#[derive(Debug, Clone)]
pub struct DailyCommitJob {
    pub credentials: AppCredentials,
    pub target: RepoTarget,
    pub branch: String,
    pub path: String,
    pub committer: Option<CommitterIdentity>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitStatus {
    Committed,
    AlreadyDone,
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub status: CommitStatus,
    pub branch: String,
    /// Timestamp of the entry that covers today
    pub timestamp: String,
    /// Commit metadata, present only when something was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WriteResult>,
}

impl CommitOutcome {
    pub fn message(&self) -> &'static str {
        match self.status {
            CommitStatus::Committed => "Committed daily contribution",
            CommitStatus::AlreadyDone => "Already committed today (UTC)",
        }
    }
}

/// Runs the keep-alive flow against a [`GitHubApi`]
#[derive(Clone)]
pub struct DailyCommitter {
    github: Arc<dyn GitHubApi>,
}

impl DailyCommitter {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }

    /// Run the flow with the current time
    pub async fn run(&self, job: &DailyCommitJob) -> Result<CommitOutcome, BotError> {
        self.run_at(job, Utc::now()).await
    }

    /// Run the flow as if the clock read `now`
    pub async fn run_at(
        &self,
        job: &DailyCommitJob,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, BotError> {
        let token = self.authenticate(job, now).await?;

        let existing = self
            .github
            .read_file(&job.target, &job.path, &job.branch, &token)
            .await?;
        let prior_text = existing.as_ref().map(RemoteFile::text).transpose()?;

        match commit_log::inspect(prior_text.as_deref().unwrap_or_default(), now) {
            LogState::Today(at) => {
                info!(
                    repo = %job.target,
                    branch = %job.branch,
                    last_entry = %commit_log::format_timestamp(at),
                    "Already committed today (UTC), skipping write"
                );
                return Ok(CommitOutcome {
                    status: CommitStatus::AlreadyDone,
                    branch: job.branch.clone(),
                    timestamp: commit_log::format_timestamp(at),
                    result: None,
                });
            }
            LogState::Malformed(malformed) => {
                warn!(
                    repo = %job.target,
                    path = %job.path,
                    error = %malformed,
                    "Last log line unreadable, appending anyway"
                );
            }
            LogState::Empty | LogState::OtherDay(_) => {}
        }

        let timestamp = commit_log::format_timestamp(now);
        let update = FileUpdate {
            path: job.path.clone(),
            branch: job.branch.clone(),
            content: commit_log::append_entry(prior_text.as_deref(), now).into_bytes(),
            message: format!("chore: daily contribution {}", timestamp),
            base_revision: existing.and_then(|file| file.revision),
            committer: job.committer.clone(),
        };

        let result = self
            .github
            .write_file(&job.target, &update, &token)
            .await?;

        info!(
            repo = %job.target,
            branch = %job.branch,
            commit = %result.commit.sha,
            "Committed daily contribution"
        );

        Ok(CommitOutcome {
            status: CommitStatus::Committed,
            branch: job.branch.clone(),
            timestamp,
            result: Some(result),
        })
    }

    /// Last non-blank line of the log, or `None` when there is no log yet
    pub async fn last_entry(&self, job: &DailyCommitJob) -> Result<Option<String>, BotError> {
        let token = self.authenticate(job, Utc::now()).await?;

        let existing = self
            .github
            .read_file(&job.target, &job.path, &job.branch, &token)
            .await?;

        let Some(file) = existing else {
            return Ok(None);
        };
        let text = file.text()?;
        Ok(commit_log::last_line(&text).map(str::to_string))
    }

    async fn authenticate(
        &self,
        job: &DailyCommitJob,
        now: DateTime<Utc>,
    ) -> Result<InstallationToken, BotError> {
        let assertion = sign_app_jwt_at(&job.credentials, now)?;
        let installation = self
            .github
            .resolve_installation(&assertion, &job.target)
            .await?;

        info!(
            repo = %job.target,
            installation_id = %installation,
            "Resolved App installation"
        );

        self.github.exchange_token(&assertion, installation).await
    }
}
