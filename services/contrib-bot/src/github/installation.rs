//! Installation lookup and token exchange, both authenticated with the App JWT.

use reqwest::StatusCode;
use tracing::debug;

use super::types::{AccessTokenResponse, InstallationResponse};
use super::{upstream_error, GitHubClient, InstallationId, InstallationToken, RepoTarget};
use crate::auth::SignedAssertion;
use crate::error::BotError;

impl GitHubClient {
    /// `GET /repos/{owner}/{repo}/installation`
    pub async fn get_repo_installation(
        &self,
        assertion: &SignedAssertion,
        target: &RepoTarget,
    ) -> Result<InstallationId, BotError> {
        let url = self.url(&format!(
            "/repos/{}/{}/installation",
            urlencoding::encode(&target.owner),
            urlencoding::encode(&target.repo)
        ));

        debug!(repo = %target, "Resolving App installation");

        let response = self
            .authorized(self.http.get(&url), assertion.as_str())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::InstallationNotFound {
                owner: target.owner.clone(),
                repo: target.repo.clone(),
                body,
            });
        }
        if !response.status().is_success() {
            return Err(upstream_error("get installation id", response).await);
        }

        let installation: InstallationResponse = response
            .json()
            .await
            .map_err(|e| BotError::Decode(format!("installation response: {e}")))?;

        Ok(InstallationId(installation.id))
    }

    /// `POST /app/installations/{id}/access_tokens`
    pub async fn create_installation_token(
        &self,
        assertion: &SignedAssertion,
        installation: InstallationId,
    ) -> Result<InstallationToken, BotError> {
        let url = self.url(&format!(
            "/app/installations/{}/access_tokens",
            installation
        ));

        debug!(installation_id = %installation, "Exchanging JWT for installation token");

        let response = self
            .authorized(self.http.post(&url), assertion.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("create installation token", response).await);
        }

        let token: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| BotError::Decode(format!("access token response: {e}")))?;

        Ok(InstallationToken::new(token.token, token.expires_at))
    }
}
