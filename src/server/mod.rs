//! HTTP service exposing `/generate` and `/replace-image` to the browser plugin.

mod cors;

pub use cors::{preflight_no_content, OriginPolicy};

use crate::error::{ImageSwapError, Result};
use crate::google::GoogleWorkspace;
use crate::image::providers::FireflyProvider;
use crate::image::{GeneratedImage, GenerationRequest, ImageProvider, ImageProviderKind};
use crate::replace::{self, ReplaceOutcome, ReplaceRequest, Workspace, WorkspaceSession};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Listener and policy settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub addr: SocketAddr,
    /// Origins allowed verbatim.
    pub allowed_origins: Vec<String>,
    /// Wildcard origin pattern, e.g. `https://*.example.app`.
    pub origin_pattern: Option<String>,
    /// Client-side bound on a single generation call.
    pub generation_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            allowed_origins: Vec::new(),
            origin_pattern: None,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// The CORS policy these settings describe.
    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::new(&self.allowed_origins, self.origin_pattern.as_deref())
    }
}

/// Shared, immutable handler state.
#[derive(Clone)]
pub struct AppState {
    generator: Arc<dyn ImageProvider>,
    workspace: Arc<dyn Workspace>,
}

impl AppState {
    /// Creates state from explicit backends.
    pub fn new(generator: Arc<dyn ImageProvider>, workspace: Arc<dyn Workspace>) -> Self {
        Self {
            generator,
            workspace,
        }
    }

    /// Builds the Firefly and Google backends from the environment.
    ///
    /// Missing credentials do not fail startup; the affected endpoint answers
    /// with a configuration error instead.
    pub fn from_config(config: &ServerConfig) -> Self {
        let generator: Arc<dyn ImageProvider> = match FireflyProvider::builder()
            .timeout(config.generation_timeout)
            .build()
        {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                tracing::warn!(error = %e, "image generation disabled");
                Arc::new(Unconfigured(e.to_string()))
            }
        };

        let workspace: Arc<dyn Workspace> = match GoogleWorkspace::from_env() {
            Ok(workspace) => Arc::new(workspace),
            Err(e) => {
                tracing::warn!(error = %e, "document replacement disabled");
                Arc::new(Unconfigured(e.to_string()))
            }
        };

        Self::new(generator, workspace)
    }
}

/// Stand-in for a backend whose credentials are missing.
struct Unconfigured(String);

impl Unconfigured {
    fn error(&self) -> ImageSwapError {
        ImageSwapError::Config(self.0.clone())
    }
}

#[async_trait]
impl ImageProvider for Unconfigured {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedImage> {
        Err(self.error())
    }

    fn kind(&self) -> ImageProviderKind {
        ImageProviderKind::Firefly
    }

    async fn health_check(&self) -> Result<()> {
        Err(self.error())
    }
}

#[async_trait]
impl Workspace for Unconfigured {
    async fn connect(&self) -> Result<Box<dyn WorkspaceSession>> {
        Err(self.error())
    }
}

/// Body of a successful `POST /generate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    image_url: String,
    raw: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ImageSwapError {
    fn into_response(self) -> Response {
        match &self {
            Self::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            Self::Validation(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    message: self.to_string(),
                }),
            )
                .into_response(),
            _ => {
                tracing::warn!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        message: self.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>> {
    request.validate()?;
    let image = state.generator.generate(&request).await?;
    tracing::info!(
        provider = %image.provider,
        duration_ms = ?image.metadata.duration_ms,
        "image generated"
    );
    Ok(Json(GenerateResponse {
        image_url: image.image_url,
        raw: image.raw,
    }))
}

async fn replace_image(
    State(state): State<AppState>,
    Json(request): Json<ReplaceRequest>,
) -> Result<Json<ReplaceOutcome>> {
    let outcome = replace::replace_image(state.workspace.as_ref(), &request).await?;
    Ok(Json(outcome))
}

async fn health() -> &'static str {
    "ok"
}

/// Builds the application router with CORS applied.
pub fn router(state: AppState, policy: OriginPolicy) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/replace-image", post(replace_image))
        .route("/health", get(health))
        .with_state(state)
        .layer(policy.layer())
        .layer(middleware::from_fn(preflight_no_content))
}

/// Binds `config.addr` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = router(state, config.origin_policy());
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}
