//! GitHub App Authentication
//!
//! Produces the short-lived RS256 JWT that identifies the App itself. The JWT
//! is only ever used to look up the installation and mint an installation
//! token, so it is created fresh for every run and never stored.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BotError;

/// How far `iat` is backdated to absorb clock skew with GitHub
pub const JWT_BACKDATE_SECS: i64 = 60;

/// How long after "now" the JWT stays valid
pub const JWT_LIFETIME_SECS: i64 = 540;

/// GitHub App identity used to sign JWTs
#[derive(Clone)]
pub struct AppCredentials {
    /// The GitHub App ID
    pub app_id: String,
    private_key_pem: String,
}

impl AppCredentials {
    /// Create credentials, normalizing a PEM that was pasted with literal `\n`
    pub fn new(app_id: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            private_key_pem: normalize_private_key(&private_key_pem.into()),
        }
    }

    pub fn private_key_pem(&self) -> &[u8] {
        self.private_key_pem.as_bytes()
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// JWT claims for GitHub App authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer (GitHub App ID)
    pub iss: String,
}

impl GitHubAppClaims {
    pub fn new(app_id: &str, now: DateTime<Utc>) -> Self {
        let now = now.timestamp();
        Self {
            iat: now - JWT_BACKDATE_SECS,
            exp: now + JWT_LIFETIME_SECS,
            iss: app_id.to_string(),
        }
    }
}

/// A signed App JWT
#[derive(Clone)]
pub struct SignedAssertion(String);

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedAssertion(<redacted>)")
    }
}

/// Generate a JWT for GitHub App authentication, valid for the next 9 minutes
pub fn sign_app_jwt(credentials: &AppCredentials) -> Result<SignedAssertion, BotError> {
    sign_app_jwt_at(credentials, Utc::now())
}

/// Generate a JWT as if the clock read `now`
pub fn sign_app_jwt_at(
    credentials: &AppCredentials,
    now: DateTime<Utc>,
) -> Result<SignedAssertion, BotError> {
    let claims = GitHubAppClaims::new(&credentials.app_id, now);
    let encoding_key = EncodingKey::from_rsa_pem(credentials.private_key_pem())?;
    let header = Header::new(Algorithm::RS256);

    Ok(SignedAssertion(encode(&header, &claims, &encoding_key)?))
}

/// Turn literal `\n` escapes into newlines when the key has none of its own.
///
/// Hosting dashboards often flatten multi-line secrets into one line.
pub fn normalize_private_key(key: &str) -> String {
    if key.contains('\n') {
        key.to_string()
    } else {
        key.replace("\\n", "\n")
    }
}
