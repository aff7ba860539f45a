//! Cross-origin policy: an explicit allow-list plus one wildcard host pattern.

use axum::extract::Request;
use axum::http::{header, request::Parts, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    exact: Vec<String>,
    pattern: Option<Regex>,
}

impl OriginPolicy {
    /// Builds a policy from exact origins and an optional wildcard pattern.
    ///
    /// In the pattern, `*` stands for one DNS label, so
    /// `https://*.example.app` matches `https://preview-42.example.app` but
    /// not `https://example.app` or `https://a.b.example.app`.
    pub fn new<I, S>(exact: I, pattern: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exact: exact
                .into_iter()
                .map(|o| o.as_ref().trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            pattern: pattern
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(wildcard_regex),
        }
    }

    /// True if `origin` may receive CORS headers.
    pub fn allows(&self, origin: &str) -> bool {
        self.exact.iter().any(|o| o == origin)
            || self.pattern.as_ref().is_some_and(|p| p.is_match(origin))
    }

    /// Builds the tower-http layer enforcing this policy.
    pub fn layer(self) -> CorsLayer {
        let policy = Arc::new(self);
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| {
                    origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
                },
            ))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(Duration::from_secs(86400))
    }
}

fn wildcard_regex(pattern: &str) -> Regex {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[A-Za-z0-9-]+");
    // Escaped literals joined by a character class always form a valid regex
    Regex::new(&format!("^{}$", body)).expect("escaped wildcard pattern")
}

/// Answers successful preflight requests with `204 No Content`.
pub async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_preflight = request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = next.run(request).await;
    if is_preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
