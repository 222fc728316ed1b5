use std::sync::Arc;
use std::time::Duration;

use crate::error::{FetchError, ResolveError};
use crate::fetcher::Fetcher;
use crate::resolver::Resolver;

/// Wrapper bundling the resolver and the fetcher behind one cheap handle
#[derive(Clone)]
pub struct TikTokApi {
    pub resolver: Arc<Resolver>,
    pub fetcher: Arc<Fetcher>,
}

impl TikTokApi {
    /// Create a new TikTokApi sharing one HTTP client between lookup and download
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(endpoints: Vec<String>, max_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self::from_parts(
            Resolver::new(client.clone(), endpoints),
            Fetcher::new(client, max_bytes),
        ))
    }

    pub fn from_parts(resolver: Resolver, fetcher: Fetcher) -> Self {
        Self {
            resolver: Arc::new(resolver),
            fetcher: Arc::new(fetcher),
        }
    }

    /// Resolve a TikTok page link to a direct media URL
    pub async fn resolve(&self, page_url: &str) -> Result<String, ResolveError> {
        self.resolver.resolve(page_url).await.map_err(|e| {
            tracing::error!("Failed to resolve {}: {}", page_url, e);
            e
        })
    }

    /// Download a resolved media URL
    pub async fn fetch(&self, media_url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetcher.fetch(media_url).await.map_err(|e| {
            tracing::error!("Failed to download media: {}", e);
            e
        })
    }
}
