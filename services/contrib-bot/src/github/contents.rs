//! Contents API: read and create-or-update a single file.
//!
//! Writes carry the `sha` from the preceding read so GitHub rejects them when
//! the file changed in between.

use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use tracing::debug;

use super::types::{ContentsResponse, PutContentsRequest};
use super::{
    upstream_error, FileUpdate, GitHubClient, InstallationToken, RemoteFile, RepoTarget,
    RevisionTag, WriteResult,
};
use crate::error::BotError;

impl GitHubClient {
    fn contents_url(&self, target: &RepoTarget, path: &str) -> String {
        let encoded_path = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        self.url(&format!(
            "/repos/{}/{}/contents/{}",
            urlencoding::encode(&target.owner),
            urlencoding::encode(&target.repo),
            encoded_path
        ))
    }

    /// `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}`
    pub async fn get_file(
        &self,
        target: &RepoTarget,
        path: &str,
        branch: &str,
        token: &InstallationToken,
    ) -> Result<Option<RemoteFile>, BotError> {
        let url = self.contents_url(target, path);

        debug!(repo = %target, path, branch, "Reading file");

        let response = self
            .authorized(self.http.get(&url), token.as_str())
            .query(&[("ref", branch)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(upstream_error("get file", response).await);
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| BotError::Decode(format!("contents response: {e}")))?;

        Ok(Some(RemoteFile {
            path: path.to_string(),
            branch: branch.to_string(),
            content: file_bytes(&contents)?,
            revision: Some(RevisionTag::from_remote(contents.sha)),
        }))
    }

    /// `PUT /repos/{owner}/{repo}/contents/{path}`
    pub async fn put_file(
        &self,
        target: &RepoTarget,
        update: &FileUpdate,
        token: &InstallationToken,
    ) -> Result<WriteResult, BotError> {
        let url = self.contents_url(target, &update.path);

        let body = PutContentsRequest {
            message: &update.message,
            content: general_purpose::STANDARD.encode(&update.content),
            branch: &update.branch,
            sha: update.base_revision.as_ref().map(RevisionTag::as_str),
            committer: update.committer.as_ref(),
        };

        debug!(
            repo = %target,
            path = %update.path,
            branch = %update.branch,
            has_base_revision = update.base_revision.is_some(),
            "Writing file"
        );

        let response = self
            .authorized(self.http.put(&url), token.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("create/update file", response).await);
        }

        response
            .json::<WriteResult>()
            .await
            .map_err(|e| BotError::Decode(format!("write response: {e}")))
    }
}

/// Inline bytes of a contents response.
///
/// Files over 1 MB come back with `encoding: "none"` and empty `content`; treating
/// that as an empty file would overwrite the whole log.
fn file_bytes(contents: &ContentsResponse) -> Result<Vec<u8>, BotError> {
    match contents.encoding.as_deref() {
        None | Some("base64") => decode_content(contents.content.as_deref().unwrap_or_default()),
        Some(other) => Err(BotError::Decode(format!(
            "file content not inlined (encoding: {other})"
        ))),
    }
}

/// Decode the contents API payload, which wraps base64 at 60 columns
fn decode_content(encoded: &str) -> Result<Vec<u8>, BotError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| BotError::Decode(format!("file content is not base64: {e}")))
}
