//! Google service-account credentials (OAuth2 JWT-bearer grant).

use super::{exchange, AccessToken, TokenSource};
use crate::error::{ImageSwapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Google's OAuth2 token endpoint, also the JWT audience.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Scopes needed to read and edit Docs and Sheets.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// A Google service account that signs its own token requests.
pub struct ServiceAccount {
    client: reqwest::Client,
    client_email: String,
    private_key_pem: String,
    scopes: Vec<String>,
    token_url: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("scopes", &self.scopes)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Creates a service account from its email and PEM-encoded private key.
    ///
    /// Literal `\n` sequences in the key are turned into newlines, since keys
    /// pasted into environment variables usually arrive escaped.
    pub fn new(client_email: impl Into<String>, private_key_pem: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_email: client_email.into(),
            private_key_pem: private_key_pem.as_ref().replace("\\n", "\n"),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Reads `GOOGLE_CLIENT_EMAIL` and `GOOGLE_PRIVATE_KEY` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Resolves credentials through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let email = lookup("GOOGLE_CLIENT_EMAIL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ImageSwapError::Config("GOOGLE_CLIENT_EMAIL not set".into()))?;
        let key = lookup("GOOGLE_PRIVATE_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ImageSwapError::Config("GOOGLE_PRIVATE_KEY not set".into()))?;
        Ok(Self::new(email, key))
    }

    /// Overrides the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the token endpoint.
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Uses a preconfigured HTTP client for the token exchange.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the service account email.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Signs the RS256 assertion sent to the token endpoint.
    fn signed_assertion(&self, issued_at: u64) -> Result<String> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.token_url.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .map_err(|e| ImageSwapError::Auth(format!("invalid service account key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ImageSwapError::Auth(format!("JWT signing failed: {}", e)))
    }
}

#[async_trait]
impl TokenSource for ServiceAccount {
    async fn access_token(&self) -> Result<AccessToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ImageSwapError::Auth(format!("system clock error: {}", e)))?
            .as_secs();

        let assertion = self.signed_assertion(now)?;
        tracing::debug!(client_email = %self.client_email, "requesting service account token");

        exchange(
            &self.client,
            &self.token_url,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)],
        )
        .await
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}
