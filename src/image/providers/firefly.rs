//! Adobe Firefly image generation provider.

use crate::auth::{ClientCredentials, TokenSource};
use crate::error::{ImageSwapError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageProviderKind, ImageSize,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

const GENERATE_URL: &str = "https://firefly-api.adobe.io/v3/images/generate";
const IMS_TOKEN_URL: &str = "https://ims-na1.adobelogin.com/ims/token/v3";
const IMS_SCOPE: &str =
    "openid,AdobeID,session,additional_info,read_organizations,firefly_api,ff_apis";

/// Builder for FireflyProvider.
pub struct FireflyProviderBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    token_source: Option<Arc<dyn TokenSource>>,
    endpoint: String,
    timeout: Duration,
}

impl Default for FireflyProviderBuilder {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_source: None,
            endpoint: GENERATE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl FireflyProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client id. Falls back to `FIREFLY_CLIENT_ID` env var.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the client secret. Falls back to `FIREFLY_CLIENT_SECRET` env var.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Replaces the default client-credentials exchange.
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Overrides the generate endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Sets the client-side timeout for a single generation call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the provider, resolving credentials.
    pub fn build(self) -> Result<FireflyProvider> {
        let client_id = self
            .client_id
            .or_else(|| std::env::var("FIREFLY_CLIENT_ID").ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ImageSwapError::Config("FIREFLY_CLIENT_ID not set and no client id provided".into())
            })?;

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let token_source: Arc<dyn TokenSource> = match self.token_source {
            Some(source) => source,
            None => {
                let secret = self
                    .client_secret
                    .or_else(|| std::env::var("FIREFLY_CLIENT_SECRET").ok())
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        ImageSwapError::Config(
                            "FIREFLY_CLIENT_SECRET not set and no client secret provided".into(),
                        )
                    })?;
                Arc::new(
                    ClientCredentials::new(IMS_TOKEN_URL, client_id.clone(), secret)
                        .scope(IMS_SCOPE)
                        .http_client(client.clone()),
                )
            }
        };

        Ok(FireflyProvider {
            client,
            client_id,
            token_source,
            endpoint: self.endpoint,
            timeout: self.timeout,
        })
    }
}

/// Adobe Firefly image generation provider.
pub struct FireflyProvider {
    client: reqwest::Client,
    client_id: String,
    token_source: Arc<dyn TokenSource>,
    endpoint: String,
    timeout: Duration,
}

impl FireflyProvider {
    /// Creates a new `FireflyProviderBuilder`.
    pub fn builder() -> FireflyProviderBuilder {
        FireflyProviderBuilder::new()
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn generate_within_deadline(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage> {
        let start = Instant::now();

        let token = self.token_source.access_token().await?;
        let body = FireflyRequest::from_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", token.bearer())
            .header("x-api-key", &self.client_id)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageSwapError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Firefly generation failed");
            return Err(ImageSwapError::upstream("image API", status.as_u16(), &text));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ImageSwapError::from_transport(e, self.timeout))?;

        let mut image = parse_generated(raw)?;
        let duration_ms = start.elapsed().as_millis() as u64;
        image.metadata.duration_ms = Some(duration_ms);
        tracing::debug!(url = %image.image_url, duration_ms, "Firefly generation complete");

        Ok(image)
    }
}

#[async_trait]
impl ImageProvider for FireflyProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.validate()?;

        // The token exchange and the generate call share one deadline
        tokio::time::timeout(self.timeout, self.generate_within_deadline(request))
            .await
            .map_err(|_| ImageSwapError::Timeout(self.timeout))?
    }

    fn kind(&self) -> ImageProviderKind {
        ImageProviderKind::Firefly
    }

    async fn health_check(&self) -> Result<()> {
        // A successful token exchange proves the credentials are valid
        self.token_source.access_token().await?;
        Ok(())
    }
}

/// Pulls the first output's URL out of a Firefly response, keeping the raw body.
fn parse_generated(raw: serde_json::Value) -> Result<GeneratedImage> {
    let parsed: FireflyResponse = serde_json::from_value(raw.clone())?;
    let output = parsed.outputs.into_iter().next().ok_or_else(|| {
        ImageSwapError::UnexpectedResponse("No outputs in Firefly response".into())
    })?;

    Ok(GeneratedImage {
        image_url: output.image.url,
        raw,
        provider: ImageProviderKind::Firefly,
        metadata: GenerationMetadata {
            seed: output.seed,
            duration_ms: None,
        },
    })
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FireflyRequest {
    prompt: String,
    num_variations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<ImageSize>,
}

impl FireflyRequest {
    fn from_request(req: &GenerationRequest) -> Self {
        Self {
            prompt: req.prompt.clone(),
            num_variations: 1,
            size: req.size,
        }
    }
}

// Response types
#[derive(Debug, Deserialize)]
struct FireflyResponse {
    #[serde(default)]
    outputs: Vec<FireflyOutput>,
}

#[derive(Debug, Deserialize)]
struct FireflyOutput {
    #[serde(default)]
    seed: Option<u64>,
    image: FireflyImage,
}

#[derive(Debug, Deserialize)]
struct FireflyImage {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, StaticToken};

    fn static_source() -> Arc<dyn TokenSource> {
        Arc::new(StaticToken(AccessToken::new("tok", None)))
    }

    #[test]
    fn test_builder_with_token_source() {
        let provider = FireflyProviderBuilder::new()
            .client_id("client")
            .token_source(static_source())
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(provider.timeout(), Duration::from_secs(30));
        assert_eq!(provider.kind(), ImageProviderKind::Firefly);
        assert_eq!(provider.name(), "Firefly (Adobe)");
    }

    #[test]
    fn test_builder_explicit_credentials() {
        let provider = FireflyProviderBuilder::new()
            .client_id("client")
            .client_secret("secret")
            .build();
        assert!(provider.is_ok());
    }

    #[test]
    fn test_builder_blank_client_id_is_config_error() {
        let result = FireflyProviderBuilder::new()
            .client_id("  ")
            .token_source(static_source())
            .build();
        assert!(matches!(result, Err(ImageSwapError::Config(_))));
    }

    #[test]
    fn test_request_serialization() {
        let req = GenerationRequest::new("A lighthouse").with_size(2048, 1024);
        let json = serde_json::to_value(FireflyRequest::from_request(&req)).unwrap();
        assert_eq!(json["prompt"], "A lighthouse");
        assert_eq!(json["numVariations"], 1);
        assert_eq!(json["size"]["width"], 2048);
        assert_eq!(json["size"]["height"], 1024);
    }

    #[test]
    fn test_request_serialization_skips_size() {
        let req = GenerationRequest::new("A lighthouse");
        let json = serde_json::to_value(FireflyRequest::from_request(&req)).unwrap();
        assert!(json.get("size").is_none());
    }

    #[test]
    fn test_parse_generated_keeps_raw() {
        let raw = serde_json::json!({
            "size": {"width": 2048, "height": 2048},
            "outputs": [{"seed": 1234, "image": {"url": "https://cdn.example/img.jpg"}}],
            "contentClass": "photo"
        });
        let image = parse_generated(raw.clone()).unwrap();
        assert_eq!(image.image_url, "https://cdn.example/img.jpg");
        assert_eq!(image.metadata.seed, Some(1234));
        assert_eq!(image.raw, raw);
    }

    #[test]
    fn test_parse_generated_without_outputs() {
        let err = parse_generated(serde_json::json!({"outputs": []})).unwrap_err();
        assert!(matches!(err, ImageSwapError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_prompt_before_network() {
        let provider = FireflyProviderBuilder::new()
            .client_id("client")
            .token_source(static_source())
            .endpoint("http://127.0.0.1:9/unreachable")
            .build()
            .unwrap();
        let err = provider
            .generate(&GenerationRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageSwapError::Validation(_)));
    }

    /// Accepts connections and never answers.
    async fn silent_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/v3/images/generate", addr)
    }

    struct HangingToken;

    #[async_trait]
    impl TokenSource for HangingToken {
        async fn access_token(&self) -> Result<AccessToken> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out() {
        let provider = FireflyProviderBuilder::new()
            .client_id("client")
            .token_source(static_source())
            .endpoint(silent_endpoint().await)
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = provider
            .generate(&GenerationRequest::new("a red fox"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageSwapError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_token_exchange_shares_the_deadline() {
        let provider = FireflyProviderBuilder::new()
            .client_id("client")
            .token_source(Arc::new(HangingToken))
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = provider
            .generate(&GenerationRequest::new("a red fox"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageSwapError::Timeout(d) if d == Duration::from_millis(200)));
    }
}
