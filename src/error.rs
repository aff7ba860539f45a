//! Error types for image generation and document replacement.

use std::time::Duration;

/// Maximum number of characters of an upstream body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors that can occur while generating or replacing images.
#[derive(Debug, thiserror::Error)]
pub enum ImageSwapError {
    /// Credentials or settings are missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller supplied an invalid request.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An upstream API (image, token, or document) returned a non-success status.
    #[error("{service} returned {status}: {message}")]
    Upstream {
        /// Which upstream failed, e.g. "docs" or "token endpoint".
        service: &'static str,
        /// HTTP status returned by the upstream.
        status: u16,
        /// Sanitized upstream body.
        message: String,
    },

    /// Credential material could not be used (e.g. a malformed private key).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Operation timed out.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream answered successfully but the payload was unusable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ImageSwapError {
    /// Builds an [`ImageSwapError::Upstream`] from a raw response body.
    pub fn upstream(service: &'static str, status: u16, body: &str) -> Self {
        Self::Upstream {
            service,
            status,
            message: sanitize_error_message(body),
        }
    }

    /// Returns true if the caller sent something we could not act on.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Maps a transport error, surfacing client-side timeouts as [`ImageSwapError::Timeout`].
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err)
        }
    }
}

/// Result type alias for imageswap operations.
pub type Result<T> = std::result::Result<T, ImageSwapError>;

/// Trims an upstream body for inclusion in an error message and redacts bearer tokens.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let text = text.trim();
    let mut redacted = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("Bearer ") {
        let (head, tail) = rest.split_at(pos + "Bearer ".len());
        redacted.push_str(head);
        redacted.push_str("[redacted]");
        let token_len = tail
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(tail.len());
        rest = &tail[token_len..];
    }
    redacted.push_str(rest);

    if redacted.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = redacted.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{truncated}...")
    } else {
        redacted
    }
}
