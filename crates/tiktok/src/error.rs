//! Error types for lookup and download failures

use std::fmt;

/// Why a single lookup endpoint did not produce a media URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Request could not be sent or the connection broke
    Transport(String),
    /// Endpoint answered with a non-success status code
    Status(u16),
    /// Response body was not valid JSON
    Decode(String),
    /// JSON was valid but contained none of the known shapes
    NoMatch,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Transport(msg) => write!(f, "transport error: {}", msg),
            FailureReason::Status(code) => write!(f, "HTTP status {}", code),
            FailureReason::Decode(msg) => write!(f, "invalid JSON: {}", msg),
            FailureReason::NoMatch => write!(f, "no media URL in response"),
        }
    }
}

/// A lookup endpoint together with the reason it was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    /// Endpoint template as configured, without the page URL filled in
    pub endpoint: String,
    pub reason: FailureReason,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no lookup endpoint returned a media URL for {url} ({} tried)", failures.len())]
    NotFound {
        url: String,
        failures: Vec<EndpointFailure>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The media is bigger than the upload limit
    ///
    /// `declared` is set when the server announced the size up front,
    /// `received` is the number of bytes read before giving up.
    #[error("media exceeds the {limit} byte limit (declared: {declared:?}, received: {received})")]
    TooLarge {
        limit: u64,
        declared: Option<u64>,
        received: u64,
    },

    #[error("media host answered with HTTP status {status}")]
    Status { status: u16 },

    #[error("failed to download media: {0}")]
    Network(#[from] reqwest::Error),
}
