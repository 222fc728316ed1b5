use async_trait::async_trait;
use tiktok::{FetchError, ResolveError, TikTokApi};

/// Turns a page link into video bytes
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Find a direct media URL for a page link
    async fn resolve(&self, page_url: &str) -> Result<String, ResolveError>;

    /// Download a direct media URL
    async fn fetch(&self, media_url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl MediaSource for TikTokApi {
    async fn resolve(&self, page_url: &str) -> Result<String, ResolveError> {
        TikTokApi::resolve(self, page_url).await
    }

    async fn fetch(&self, media_url: &str) -> Result<Vec<u8>, FetchError> {
        TikTokApi::fetch(self, media_url).await
    }
}
