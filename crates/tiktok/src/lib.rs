//! TikTok media lookup client
//!
//! This crate turns a TikTok page link into downloadable video bytes. It
//! recognizes supported link shapes, asks third-party lookup services for a
//! direct media URL and downloads that URL with a hard size cap.

pub mod api;
pub mod error;
pub mod fetcher;
pub mod link;
pub mod resolver;

pub use api::TikTokApi;
pub use error::{EndpointFailure, FailureReason, FetchError, ResolveError};
pub use fetcher::{Fetcher, DEFAULT_MAX_BYTES};
pub use link::is_tiktok_url;
pub use resolver::{extract_media_url, Resolver, DEFAULT_ENDPOINTS};
