//! GitHub REST Client
//!
//! Thin wrapper over the handful of REST endpoints the bot needs:
//! installation lookup, installation token exchange, and the contents API.
//! The orchestrator talks to GitHub through the [`GitHubApi`] trait so the
//! transport can be swapped out in tests.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use crate::auth::SignedAssertion;
use crate::error::BotError;

mod contents;
mod installation;
pub mod types;

pub use types::{
    CommitterIdentity, FileUpdate, InstallationId, InstallationToken, RemoteFile, RepoTarget,
    RevisionTag, WriteResult,
};

/// Default public GitHub API base URL
pub const GITHUB_API: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("contrib-bot/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// The GitHub operations the daily commit pipeline is built from
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Look up the App installation covering a repository
    async fn resolve_installation(
        &self,
        assertion: &SignedAssertion,
        target: &RepoTarget,
    ) -> Result<InstallationId, BotError>;

    /// Mint an installation token from the App JWT
    async fn exchange_token(
        &self,
        assertion: &SignedAssertion,
        installation: InstallationId,
    ) -> Result<InstallationToken, BotError>;

    /// Read a file; `Ok(None)` when it does not exist on the branch
    async fn read_file(
        &self,
        target: &RepoTarget,
        path: &str,
        branch: &str,
        token: &InstallationToken,
    ) -> Result<Option<RemoteFile>, BotError>;

    /// Create or update a file
    async fn write_file(
        &self,
        target: &RepoTarget,
        update: &FileUpdate,
        token: &InstallationToken,
    ) -> Result<WriteResult, BotError>;
}

/// GitHub REST API client
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
}

impl GitHubClient {
    /// Create a client against the given API base URL
    pub fn new(api_url: impl Into<String>) -> Result<Self, BotError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(http, api_url))
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_client(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Attach the headers every GitHub call carries
    fn authorized(&self, builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder
            .bearer_auth(bearer)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

/// Build an [`BotError::Upstream`] from a non-success response
async fn upstream_error(action: &'static str, response: Response) -> BotError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BotError::Upstream {
        action,
        status,
        body,
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn resolve_installation(
        &self,
        assertion: &SignedAssertion,
        target: &RepoTarget,
    ) -> Result<InstallationId, BotError> {
        self.get_repo_installation(assertion, target).await
    }

    async fn exchange_token(
        &self,
        assertion: &SignedAssertion,
        installation: InstallationId,
    ) -> Result<InstallationToken, BotError> {
        self.create_installation_token(assertion, installation)
            .await
    }

    async fn read_file(
        &self,
        target: &RepoTarget,
        path: &str,
        branch: &str,
        token: &InstallationToken,
    ) -> Result<Option<RemoteFile>, BotError> {
        self.get_file(target, path, branch, token).await
    }

    async fn write_file(
        &self,
        target: &RepoTarget,
        update: &FileUpdate,
        token: &InstallationToken,
    ) -> Result<WriteResult, BotError> {
        self.put_file(target, update, token).await
    }
}
