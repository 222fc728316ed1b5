//! Lookup of direct media URLs through third-party services

use std::time::Duration;

use serde_json::Value;

use crate::error::{EndpointFailure, FailureReason, ResolveError};

/// Lookup services queried by default, in order of preference
///
/// `{url}` is replaced with the percent-encoded TikTok page URL.
pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://www.tikwm.com/api/?url={url}",
    "https://api.tikmate.app/api/lookup?url={url}",
];

/// Per-endpoint request timeout
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

const URL_PLACEHOLDER: &str = "{url}";

/// Queries an ordered list of lookup services until one yields a media URL
#[derive(Debug, Clone)]
pub struct Resolver {
    client: reqwest::Client,
    endpoints: Vec<String>,
    timeout: Duration,
}

impl Resolver {
    /// Create a resolver for the given endpoint templates
    pub fn new(client: reqwest::Client, endpoints: Vec<String>) -> Self {
        Self {
            client,
            endpoints,
            timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Override the per-endpoint timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Find a direct media URL for a TikTok page
    ///
    /// # Errors
    /// Returns [`ResolveError::NotFound`] with the reason every endpoint
    /// failed when none of them produced a URL.
    pub async fn resolve(&self, page_url: &str) -> Result<String, ResolveError> {
        let mut failures = Vec::with_capacity(self.endpoints.len());

        for endpoint in &self.endpoints {
            match self.query(endpoint, page_url).await {
                Ok(media_url) => {
                    tracing::info!("Resolved {} via {}", page_url, endpoint);
                    return Ok(media_url);
                }
                Err(reason) => {
                    tracing::warn!("Lookup endpoint {} failed for {}: {}", endpoint, page_url, reason);
                    failures.push(EndpointFailure {
                        endpoint: endpoint.clone(),
                        reason,
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            url: page_url.to_string(),
            failures,
        })
    }

    async fn query(&self, endpoint: &str, page_url: &str) -> Result<String, FailureReason> {
        let request_url = render_endpoint(endpoint, page_url);

        let response = self
            .client
            .get(&request_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FailureReason::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FailureReason::Decode(e.to_string()))?;

        extract_media_url(&body)
            .map(ToOwned::to_owned)
            .ok_or(FailureReason::NoMatch)
    }
}

/// Substitute the encoded page URL into an endpoint template
///
/// Templates without a placeholder get the URL appended as a `url` query
/// parameter.
pub fn render_endpoint(template: &str, page_url: &str) -> String {
    let encoded = urlencoding::encode(page_url);
    if template.contains(URL_PLACEHOLDER) {
        template.replace(URL_PLACEHOLDER, &encoded)
    } else {
        let sep = if template.contains('?') { '&' } else { '?' };
        format!("{}{}url={}", template, sep, encoded)
    }
}

/// Pull a media URL out of a lookup response
///
/// Known shapes, highest priority first:
/// 1. `{"data": {"play": "..."}}`
/// 2. `{"url": "..."}`
/// 3. `{"success": true, "video_url": "..."}`
/// 4. `{"items": [{"url": "..."}, ...]}`
///
/// Empty strings and non-string values don't count as a match.
pub fn extract_media_url(body: &Value) -> Option<&str> {
    let success_video_url = || {
        if body.get("success").and_then(Value::as_bool) == Some(true) {
            body.get("video_url")
        } else {
            None
        }
    };

    let candidates = [
        body.pointer("/data/play"),
        body.get("url"),
        success_video_url(),
        body.pointer("/items/0/url"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|url| !url.is_empty())
}
