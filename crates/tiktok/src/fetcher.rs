//! Size-capped media download

use std::time::Duration;

use crate::error::FetchError;

/// Default payload cap, kept below the Bot API's 50 MB upload limit
pub const DEFAULT_MAX_BYTES: u64 = 45 * 1024 * 1024;

/// Whole-download timeout
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for the buffer allocated before any bytes arrive
const INITIAL_CAPACITY: usize = 1024 * 1024;

/// Downloads media URLs into memory, refusing anything over the cap
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    /// Download the media at `url`
    ///
    /// The declared `Content-Length` is checked before the body is read.
    /// The body is then read chunk by chunk and the download stops as soon
    /// as the cap is crossed, whether or not a length was declared.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self.client.get(url).timeout(FETCH_TIMEOUT).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let declared = response.content_length();
        if let Some(len) = declared {
            if len > self.max_bytes {
                tracing::warn!("Refusing {} byte download from {}", len, url);
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                    declared,
                    received: 0,
                });
            }
        }

        let mut buffer = CappedBuffer::new(self.max_bytes, declared);
        while let Some(chunk) = response.chunk().await? {
            buffer.push(&chunk)?;
        }

        let data = buffer.into_inner();
        tracing::info!("Downloaded {} bytes from {}", data.len(), url);
        Ok(data)
    }
}

/// Accumulates chunks until they would exceed a byte limit
struct CappedBuffer {
    limit: u64,
    declared: Option<u64>,
    data: Vec<u8>,
}

impl CappedBuffer {
    fn new(limit: u64, declared: Option<u64>) -> Self {
        // The declared length is untrusted, so only a bounded prefix is reserved
        let capacity = declared.unwrap_or(0).min(limit).min(INITIAL_CAPACITY as u64) as usize;
        Self {
            limit,
            declared,
            data: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), FetchError> {
        let received = (self.data.len() as u64).saturating_add(chunk.len() as u64);
        if received > self.limit {
            return Err(FetchError::TooLarge {
                limit: self.limit,
                declared: self.declared,
                received,
            });
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
