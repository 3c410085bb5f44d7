//! Error Types
//!
//! One error enum for the whole commit pipeline. The HTTP layer maps each
//! variant to a status code via [`BotError::status_code`].

use thiserror::Error;

/// Errors that can occur while running the daily commit pipeline
#[derive(Debug, Error)]
pub enum BotError {
    /// Required settings are missing or unusable
    #[error("Server misconfigured: {0}")]
    Config(String),

    /// Invocation secret missing or wrong
    #[error("Unauthorized (missing X-APP-KEY)")]
    Unauthorized,

    /// Daily quota already used up
    #[error("Rate limit: max {max} commits per day reached ({count}/{max})")]
    RateLimitExceeded { count: u32, max: u32 },

    /// The App JWT could not be produced
    #[error("Failed to sign App JWT: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The App is not installed on the target repository
    #[error("Installation not found for repo {owner}/{repo}: {body}")]
    InstallationNotFound {
        owner: String,
        repo: String,
        body: String,
    },

    /// GitHub answered with a non-success status
    #[error("Failed to {action}: {status} {body}")]
    Upstream {
        action: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a usable response
    #[error("Request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GitHub returned a payload we could not decode
    #[error("Unexpected response from GitHub: {0}")]
    Decode(String),
}

impl BotError {
    /// HTTP status code the server answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BotError::Unauthorized => 401,
            BotError::RateLimitExceeded { .. } => 429,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BotError::Unauthorized.status_code(), 401);
        assert_eq!(
            BotError::RateLimitExceeded { count: 7, max: 7 }.status_code(),
            429
        );
        assert_eq!(BotError::Config("APP_ID".into()).status_code(), 500);
        assert_eq!(
            BotError::Upstream {
                action: "get file",
                status: 502,
                body: String::new(),
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_rate_limit_message() {
        let err = BotError::RateLimitExceeded { count: 7, max: 7 };
        assert_eq!(
            err.to_string(),
            "Rate limit: max 7 commits per day reached (7/7)"
        );
    }

    #[test]
    fn test_upstream_message_carries_status_and_body() {
        let err = BotError::Upstream {
            action: "create installation token",
            status: 403,
            body: "{\"message\":\"Forbidden\"}".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Failed to create installation token: 403"));
        assert!(text.contains("Forbidden"));
    }
}
