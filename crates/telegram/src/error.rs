use tiktok::{FetchError, ResolveError};

use crate::constants::emoji;
use crate::utils;

/// Custom error type for telegram bot operations
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// No lookup service produced a media URL
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Media download failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Sending the video to the chat failed
    #[error("failed to upload video: {0}")]
    Upload(#[source] teloxide::RequestError),
    /// Telegram API error outside the upload step
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Helper trait to convert errors into user-friendly messages
pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for BotError {
    fn user_message(&self) -> String {
        match self {
            BotError::Resolve(_) => {
                format!("{} Could not download this video. Please check the link and try again.", emoji::ERROR)
            }
            BotError::Fetch(FetchError::TooLarge { limit, .. }) => format!(
                "{} The video is too large to send (limit {}).",
                emoji::ERROR,
                utils::format_size(*limit)
            ),
            BotError::Fetch(FetchError::Status { status }) => format!(
                "{} The video host refused the download (HTTP {}).",
                emoji::ERROR,
                status
            ),
            BotError::Fetch(FetchError::Network(_)) => {
                format!("{} Network error while downloading the video. Please try again.", emoji::ERROR)
            }
            BotError::Upload(e) | BotError::Telegram(e) => format!("{} Error: {}", emoji::ERROR, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::{ApiError, RequestError};

    #[test]
    fn test_user_message_too_large() {
        let err = BotError::Fetch(FetchError::TooLarge {
            limit: 45 * 1024 * 1024,
            declared: Some(60 * 1024 * 1024),
            received: 0,
        });
        assert_eq!(
            err.user_message(),
            "❌ The video is too large to send (limit 45.00 MB)."
        );
    }

    #[test]
    fn test_user_message_not_found() {
        let err = BotError::Resolve(ResolveError::NotFound {
            url: "https://vm.tiktok.com/x".to_string(),
            failures: Vec::new(),
        });
        assert!(err.user_message().starts_with("❌ Could not download"));
    }

    #[test]
    fn test_user_message_upload() {
        let err = BotError::Upload(RequestError::Api(ApiError::Unknown("Bad Request: file is too big".to_string())));
        assert!(err.user_message().starts_with("❌ Error: "));
    }
}
