//! Core types for image generation.

use crate::error::{ImageSwapError, Result};
use serde::{Deserialize, Serialize};

/// Image provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProviderKind {
    /// Adobe Firefly image models.
    Firefly,
}

impl std::fmt::Display for ImageProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Firefly => write!(f, "firefly"),
        }
    }
}

/// Requested output dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Creates a size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Seed reported by the provider.
    pub seed: Option<u64>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A request to generate an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image.
    #[serde(default)]
    pub prompt: String,
    /// Desired output size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: None,
        }
    }

    /// Sets the desired dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(ImageSize::new(width, height));
        self
    }

    /// Rejects requests no provider can serve.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(ImageSwapError::Validation("prompt is required".into()));
        }
        if let Some(size) = self.size {
            if size.width == 0 || size.height == 0 {
                return Err(ImageSwapError::Validation(
                    "size.width and size.height must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A generated image, hosted by the provider.
#[derive(Debug, Clone)]
#[must_use = "generated image URL should be used or returned"]
pub struct GeneratedImage {
    /// Public URL of the generated image.
    pub image_url: String,
    /// Untouched provider response, passed through to callers.
    pub raw: serde_json::Value,
    /// Provider that generated this image.
    pub provider: ImageProviderKind,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_prompt() {
        assert!(GenerationRequest::new("   ").validate().is_err());
        assert!(GenerationRequest::new("a red fox").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let req = GenerationRequest::new("a red fox").with_size(0, 512);
        assert!(matches!(req.validate(), Err(ImageSwapError::Validation(_))));
    }

    #[test]
    fn test_request_deserializes_optional_size() {
        let req: GenerationRequest = serde_json::from_str(r#"{"prompt": "cat"}"#).unwrap();
        assert!(req.size.is_none());

        let req: GenerationRequest =
            serde_json::from_str(r#"{"prompt": "cat", "size": {"width": 1024, "height": 768}}"#)
                .unwrap();
        assert_eq!(req.size, Some(ImageSize::new(1024, 768)));
    }

    #[test]
    fn test_missing_prompt_deserializes_empty() {
        let req: GenerationRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ImageProviderKind::Firefly.to_string(), "firefly");
    }
}
