//! Google Workspace REST plumbing shared by the Docs and Sheets clients.

use crate::auth::{AccessToken, ServiceAccount, TokenSource};
use crate::error::{ImageSwapError, Result};
use crate::replace::{Workspace, WorkspaceSession};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Docs API v1 base URL.
pub const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
/// Sheets API v4 base URL.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
/// Per-request timeout for token and document calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connects to Google Docs and Sheets with a service account.
pub struct GoogleWorkspace {
    client: reqwest::Client,
    token_source: Arc<dyn TokenSource>,
    timeout: Duration,
    docs_base: String,
    sheets_base: String,
}

impl GoogleWorkspace {
    /// Creates a workspace authenticating through `token_source`.
    pub fn new(token_source: Arc<dyn TokenSource>) -> Result<Self> {
        Self::with_timeout(token_source, DEFAULT_TIMEOUT)
    }

    /// Like [`GoogleWorkspace::new`], bounding every Docs and Sheets call by `timeout`.
    pub fn with_timeout(token_source: Arc<dyn TokenSource>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: timed_client(timeout)?,
            token_source,
            timeout,
            docs_base: DOCS_API_BASE.to_string(),
            sheets_base: SHEETS_API_BASE.to_string(),
        })
    }

    /// Uses the service account described by `GOOGLE_CLIENT_EMAIL` and `GOOGLE_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self> {
        let account = ServiceAccount::from_env()?.http_client(timed_client(DEFAULT_TIMEOUT)?);
        Self::new(Arc::new(account))
    }

    /// Overrides the API base URLs.
    pub fn base_urls(mut self, docs: impl Into<String>, sheets: impl Into<String>) -> Self {
        self.docs_base = docs.into();
        self.sheets_base = sheets.into();
        self
    }
}

fn timed_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

#[async_trait]
impl Workspace for GoogleWorkspace {
    async fn connect(&self) -> Result<Box<dyn WorkspaceSession>> {
        let token = self.token_source.access_token().await?;
        Ok(Box::new(GoogleSession {
            client: self.client.clone(),
            token,
            timeout: self.timeout,
            docs_base: self.docs_base.clone(),
            sheets_base: self.sheets_base.clone(),
        }))
    }
}

/// An authenticated connection, valid for one replace request.
pub struct GoogleSession {
    client: reqwest::Client,
    token: AccessToken,
    timeout: Duration,
    pub(crate) docs_base: String,
    pub(crate) sheets_base: String,
}

impl GoogleSession {
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.token.bearer())
            .query(query)
            .send()
            .await
            .map_err(|e| ImageSwapError::from_transport(e, self.timeout))?;
        self.decode(service, response).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .header("Authorization", self.token.bearer())
            .json(body)
            .send()
            .await
            .map_err(|e| ImageSwapError::from_transport(e, self.timeout))?;
        self.decode(service, response).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        service: &'static str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(service, status = status.as_u16(), "Google API request failed");
            return Err(ImageSwapError::upstream(service, status.as_u16(), &text));
        }
        response
            .json()
            .await
            .map_err(|e| ImageSwapError::from_transport(e, self.timeout))
    }
}
