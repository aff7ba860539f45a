//! OAuth2 client-credentials grant.

use super::{exchange, AccessToken, TokenSource};
use crate::error::Result;
use async_trait::async_trait;

/// Exchanges a client id/secret pair for a bearer token.
pub struct ClientCredentials {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
}

impl ClientCredentials {
    /// Creates a client-credentials source for the given token endpoint.
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: None,
        }
    }

    /// Sets the requested scope (comma- or space-separated, issuer specific).
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the client id this source authenticates as.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn form(&self) -> Vec<(&str, &str)> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }
        form
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn access_token(&self) -> Result<AccessToken> {
        tracing::debug!(client_id = %self.client_id, "requesting client-credentials token");
        exchange(&self.client, &self.token_url, &self.form()).await
    }
}
