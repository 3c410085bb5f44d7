//! GitHub API Types
//!
//! Domain values passed between the orchestrator and the GitHub client, plus
//! the wire shapes of the REST responses we read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BotError;

/// Repository in `owner/repo` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoTarget {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(BotError::Config(format!(
                "Invalid repository format: {}. Expected: owner/repo",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Numeric id of an App installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(pub u64);

impl fmt::Display for InstallationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Installation-scoped bearer token, good for one run
#[derive(Clone)]
pub struct InstallationToken {
    token: String,
    /// Expiry reported by GitHub. Informational only.
    pub expires_at: Option<String>,
}

impl InstallationToken {
    pub fn new(token: impl Into<String>, expires_at: Option<String>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Content SHA of a file as last read from GitHub.
///
/// Only ever built from a read response and handed back unchanged on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionTag(String);

impl RevisionTag {
    pub(crate) fn from_remote(sha: String) -> Self {
        Self(sha)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Current state of a tracked file
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub path: String,
    pub branch: String,
    pub content: Vec<u8>,
    pub revision: Option<RevisionTag>,
}

impl RemoteFile {
    /// File content as text. Invalid UTF-8 is an error, never replaced.
    pub fn text(&self) -> Result<String, BotError> {
        String::from_utf8(self.content.clone())
            .map_err(|e| BotError::Decode(format!("{} is not valid UTF-8: {e}", self.path)))
    }
}

/// Name and email recorded as the committer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitterIdentity {
    pub name: String,
    pub email: String,
}

/// A create-or-update request for one file
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub path: String,
    pub branch: String,
    pub content: Vec<u8>,
    pub message: String,
    /// Revision the update is based on; `None` creates the file
    pub base_revision: Option<RevisionTag>,
    pub committer: Option<CommitterIdentity>,
}

/// Metadata of the commit produced by a write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
    pub content: Option<WrittenContent>,
    pub commit: WrittenCommit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenContent {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenCommit {
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================
// Wire Types
// ============================================================

#[derive(Debug, Deserialize)]
pub(crate) struct InstallationResponse {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentsResponse {
    #[serde(default)]
    pub content: Option<String>,
    /// `base64` for inline content; `none` when the file is too large to inline
    #[serde(default)]
    pub encoding: Option<String>,
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutContentsRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<&'a CommitterIdentity>,
}
