//! Credential providers.
//!
//! Every upstream call starts by asking a [`TokenSource`] for a short-lived
//! bearer token. Tokens are requested per operation and never cached, so no
//! state outlives a single request.

mod client_credentials;
mod service_account;

pub use client_credentials::ClientCredentials;
pub use service_account::{ServiceAccount, GOOGLE_TOKEN_URL};

use crate::error::{ImageSwapError, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// A short-lived bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            token: token.into(),
            expires_in,
        }
    }

    /// Returns the raw token.
    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Lifetime in seconds as reported by the issuer.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Returns the `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchanges long-lived credentials for a bearer token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetches a fresh access token.
    async fn access_token(&self) -> Result<AccessToken>;
}

// OAuth2 token endpoint response, shared by both grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl From<TokenResponse> for AccessToken {
    fn from(resp: TokenResponse) -> Self {
        AccessToken::new(resp.access_token, resp.expires_in)
    }
}

/// Posts an OAuth2 form to a token endpoint and decodes the token.
async fn exchange(
    client: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<AccessToken> {
    let response = client.post(token_url).form(form).send().await?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), token_url, "token exchange failed");
        return Err(ImageSwapError::upstream("token endpoint", status.as_u16(), &text));
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.into())
}

/// Static token source, handy for tests and for pre-issued tokens.
#[derive(Debug, Clone)]
pub struct StaticToken(pub AccessToken);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<AccessToken> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("ya29.very-secret", Some(3599));
        let debug = format!("{token:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("3599"));
    }

    #[test]
    fn test_bearer_header() {
        let token = AccessToken::new("abc", None);
        assert_eq!(token.bearer(), "Bearer abc");
        assert_eq!(token.secret(), "abc");
    }

    #[test]
    fn test_token_response_deserialization() {
        let json = r#"{"access_token": "tok", "token_type": "bearer", "expires_in": 86399}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        let token = AccessToken::from(resp);
        assert_eq!(token.secret(), "tok");
        assert_eq!(token.expires_in(), Some(86399));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken(AccessToken::new("fixed", None));
        assert_eq!(source.access_token().await.unwrap().secret(), "fixed");
    }
}
