//! Download pipeline for a single inbound message
//!
//! Validate → cooldown → placeholder → resolve → fetch → upload → count.
//! The placeholder message is edited in place as the run progresses and
//! every run ends in exactly one [`Outcome`].

use std::sync::Arc;

use stats::{Snapshot, StatsStore};
use teloxide::types::{ChatId, MessageId};

use crate::chat::ChatSurface;
use crate::constants::{emoji, text};
use crate::error::{BotError, UserMessage};
use crate::media::MediaSource;
use crate::rate_limit::{CoolingDown, RateLimiter};
use crate::types::Incoming;

/// How a pipeline run ended
#[derive(Debug)]
pub enum Outcome {
    /// Text was not a supported link; the usage hint was sent
    InvalidLink,
    /// User is still cooling down; the wait time was sent
    CoolingDown(CoolingDown),
    /// A stage failed after the request was accepted
    Failed(BotError),
    /// Video was uploaded and counted
    Delivered(Snapshot),
}

/// Shared state and services for processing download requests
#[derive(Clone)]
pub struct Pipeline {
    media: Arc<dyn MediaSource>,
    limiter: Arc<RateLimiter>,
    stats: StatsStore,
}

impl Pipeline {
    pub fn new(media: Arc<dyn MediaSource>, limiter: Arc<RateLimiter>, stats: StatsStore) -> Self {
        Self {
            media,
            limiter,
            stats,
        }
    }

    /// Run one message through every stage
    pub async fn handle(&self, chat: &dyn ChatSurface, incoming: &Incoming) -> Outcome {
        let Incoming {
            user_id,
            chat_id,
            message_id,
            text: body,
        } = incoming;
        let (user_id, chat_id, message_id) = (*user_id, *chat_id, *message_id);
        let url = body.trim();

        if !tiktok::is_tiktok_url(url) {
            notify(chat, chat_id, message_id, text::USAGE).await;
            return Outcome::InvalidLink;
        }

        if let Err(cooldown) = self.limiter.check(user_id) {
            tracing::debug!("User {} is cooling down for {}s", user_id, cooldown.remaining_secs);
            let message = format!(
                "{} Please wait {} seconds before sending another link.",
                emoji::WAIT,
                cooldown.remaining_secs
            );
            notify(chat, chat_id, message_id, &message).await;
            return Outcome::CoolingDown(cooldown);
        }

        if let Err(e) = chat.typing(chat_id).await {
            tracing::debug!("Failed to send typing action: {}", e);
        }
        let placeholder = match chat.reply(chat_id, message_id, text::PROCESSING).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to send placeholder to chat {}: {}", chat_id, e);
                return Outcome::Failed(BotError::Telegram(e));
            }
        };
        let progress = Progress {
            chat,
            chat_id,
            placeholder,
        };

        let media_url = match self.media.resolve(url).await {
            Ok(media_url) => media_url,
            Err(e) => return progress.fail(e.into()).await,
        };

        progress.update(text::DOWNLOADING).await;

        let video = match self.media.fetch(&media_url).await {
            Ok(video) => video,
            Err(e) => return progress.fail(e.into()).await,
        };

        progress.update(text::UPLOADING).await;

        tracing::info!("Uploading {} bytes to chat {}", video.len(), chat_id);
        if let Err(e) = chat.send_video(chat_id, video, text::CAPTION).await {
            let err = BotError::Upload(e);
            tracing::error!("Upload to chat {} failed: {}", chat_id, err);

            let message = err.user_message();
            if let Err(edit_err) = chat.edit(chat_id, placeholder, &message).await {
                tracing::debug!("Failed to edit placeholder, replying instead: {}", edit_err);
                notify(chat, chat_id, message_id, &message).await;
            }
            return Outcome::Failed(err);
        }

        let snapshot = self.stats.record_download(user_id);
        if let Err(e) = self.stats.persist().await {
            tracing::error!("Failed to save stats: {}", e);
        }

        progress.update(text::DONE).await;
        Outcome::Delivered(snapshot)
    }
}

/// The placeholder message of an accepted request
struct Progress<'a> {
    chat: &'a dyn ChatSurface,
    chat_id: ChatId,
    placeholder: MessageId,
}

impl Progress<'_> {
    /// Edit the placeholder, ignoring failures
    async fn update(&self, text: &str) {
        if let Err(e) = self.chat.edit(self.chat_id, self.placeholder, text).await {
            tracing::debug!("Failed to update placeholder in chat {}: {}", self.chat_id, e);
        }
    }

    async fn fail(&self, err: BotError) -> Outcome {
        tracing::warn!("Request in chat {} failed: {}", self.chat_id, err);
        self.update(&err.user_message()).await;
        Outcome::Failed(err)
    }
}

/// Reply to the user's message, ignoring failures
async fn notify(chat: &dyn ChatSurface, chat_id: ChatId, to: MessageId, text: &str) {
    if let Err(e) = chat.reply(chat_id, to, text).await {
        tracing::warn!("Failed to reply in chat {}: {}", chat_id, e);
    }
}
