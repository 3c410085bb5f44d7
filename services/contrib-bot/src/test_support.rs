//! Shared test fixtures: an RSA key pair and an in-memory GitHub.

use async_trait::async_trait;
use clap::{CommandFactory, Parser};
use std::sync::Mutex;

use crate::auth::{AppCredentials, SignedAssertion};
use crate::config::{
    BotConfig, DEFAULT_BOT_BRANCH, DEFAULT_COMMIT_EMAIL, DEFAULT_COMMIT_NAME, DEFAULT_LOG_PATH,
};
use crate::error::BotError;
use crate::github::types::{WrittenCommit, WrittenContent};
use crate::github::{
    CommitterIdentity, GITHUB_API, FileUpdate, GitHubApi, InstallationId, InstallationToken, RemoteFile,
    RepoTarget, RevisionTag, WriteResult,
};
use crate::orchestrator::DailyCommitJob;

pub const TEST_APP_KEY: &str = include_str!("../tests/fixtures/app_key.pem");
pub const TEST_APP_PUBLIC_KEY: &str = include_str!("../tests/fixtures/app_key.pub.pem");

pub const TEST_PATH: &str = "contributions/keep_alive.md";
pub const TEST_BRANCH: &str = "contrib-bot";

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    config: BotConfig,
}

/// The clap command the binaries flatten [`BotConfig`] into
pub fn config_command() -> clap::Command {
    TestCli::command()
}

/// A [`BotConfig`] holding only defaults, built without consulting the
/// process environment
pub fn bot_config() -> BotConfig {
    BotConfig {
        app_id: None,
        private_key: None,
        private_key_b64: None,
        private_key_path: None,
        target_repo: None,
        bot_branch: DEFAULT_BOT_BRANCH.into(),
        log_path: DEFAULT_LOG_PATH.into(),
        commit_name: DEFAULT_COMMIT_NAME.into(),
        commit_email: DEFAULT_COMMIT_EMAIL.into(),
        invocation_secret: None,
        github_api_url: GITHUB_API.into(),
    }
}

pub fn test_job() -> DailyCommitJob {
    DailyCommitJob {
        credentials: AppCredentials::new("123456", TEST_APP_KEY),
        target: RepoTarget {
            owner: "octo".into(),
            repo: "keepalive".into(),
        },
        branch: TEST_BRANCH.into(),
        path: TEST_PATH.into(),
        committer: Some(CommitterIdentity {
            name: "contrib-bot".into(),
            email: "noreply@github.com".into(),
        }),
    }
}

#[derive(Default)]
struct FakeState {
    file: Option<RemoteFile>,
    revisions: u32,
    writes: Vec<FileUpdate>,
    calls: Vec<&'static str>,
}

/// In-memory GitHub that enforces revision checks on write
pub struct FakeGitHub {
    installed: bool,
    change_before_write: bool,
    state: Mutex<FakeState>,
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self {
            installed: true,
            change_before_write: false,
            state: Mutex::new(FakeState::default()),
        }
    }
}

impl FakeGitHub {
    pub fn with_log(text: &str) -> Self {
        let github = Self::default();
        {
            let mut state = github.state.lock().unwrap();
            state.revisions = 1;
            state.file = Some(RemoteFile {
                path: TEST_PATH.into(),
                branch: TEST_BRANCH.into(),
                content: text.as_bytes().to_vec(),
                revision: Some(RevisionTag::from_remote("rev-1".into())),
            });
        }
        github
    }

    /// Repository without the App installed
    pub fn uninstalled(mut self) -> Self {
        self.installed = false;
        self
    }

    /// Someone else commits between our read and our write
    pub fn changing_before_write(mut self) -> Self {
        self.change_before_write = true;
        self
    }

    pub fn writes(&self) -> Vec<FileUpdate> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn log_text(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .file
            .as_ref()
            .map(|file| file.text().unwrap())
    }

    pub fn current_revision(&self) -> Option<RevisionTag> {
        self.state
            .lock()
            .unwrap()
            .file
            .as_ref()
            .and_then(|file| file.revision.clone())
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn resolve_installation(
        &self,
        _assertion: &SignedAssertion,
        target: &RepoTarget,
    ) -> Result<InstallationId, BotError> {
        self.state.lock().unwrap().calls.push("resolve_installation");
        if !self.installed {
            return Err(BotError::InstallationNotFound {
                owner: target.owner.clone(),
                repo: target.repo.clone(),
                body: "{\"message\":\"Not Found\"}".into(),
            });
        }
        Ok(InstallationId(42))
    }

    async fn exchange_token(
        &self,
        _assertion: &SignedAssertion,
        installation: InstallationId,
    ) -> Result<InstallationToken, BotError> {
        self.state.lock().unwrap().calls.push("exchange_token");
        assert_eq!(installation, InstallationId(42));
        Ok(InstallationToken::new("ghs_test", None))
    }

    async fn read_file(
        &self,
        _target: &RepoTarget,
        path: &str,
        branch: &str,
        token: &InstallationToken,
    ) -> Result<Option<RemoteFile>, BotError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("read_file");
        assert_eq!(token.as_str(), "ghs_test");

        let file = state.file.clone().filter(|f| f.path == path && f.branch == branch);
        if self.change_before_write {
            state.revisions += 1;
            let revision = RevisionTag::from_remote(format!("rev-{}", state.revisions));
            if let Some(current) = state.file.as_mut() {
                current.revision = Some(revision);
            }
        }
        Ok(file)
    }

    async fn write_file(
        &self,
        _target: &RepoTarget,
        update: &FileUpdate,
        token: &InstallationToken,
    ) -> Result<WriteResult, BotError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("write_file");
        assert_eq!(token.as_str(), "ghs_test");

        let current = state.file.as_ref().and_then(|file| file.revision.clone());
        if current != update.base_revision {
            return Err(BotError::Upstream {
                action: "create/update file",
                status: 409,
                body: format!("{} does not match", update.path),
            });
        }

        state.revisions += 1;
        let sha = format!("rev-{}", state.revisions);
        state.file = Some(RemoteFile {
            path: update.path.clone(),
            branch: update.branch.clone(),
            content: update.content.clone(),
            revision: Some(RevisionTag::from_remote(sha.clone())),
        });
        state.writes.push(update.clone());

        Ok(WriteResult {
            content: Some(WrittenContent {
                path: update.path.clone(),
                sha,
                html_url: None,
            }),
            commit: WrittenCommit {
                sha: format!("commit-{}", state.revisions),
                html_url: None,
                message: Some(update.message.clone()),
            },
        })
    }
}
