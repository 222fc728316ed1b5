//! Outbound chat operations used by the download pipeline

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatAction, InputFile, MessageId},
    RequestError,
};

use crate::constants::VIDEO_FILE_NAME;

/// The subset of the Bot API the pipeline needs
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Send `text` as a reply to `to`, returning the new message's id
    async fn reply(&self, chat: ChatId, to: MessageId, text: &str) -> Result<MessageId, RequestError>;

    /// Replace the text of a message previously sent by the bot
    async fn edit(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError>;

    /// Show the "typing" indicator
    async fn typing(&self, chat: ChatId) -> Result<(), RequestError>;

    /// Upload an MP4 video with a caption
    async fn send_video(&self, chat: ChatId, video: Vec<u8>, caption: &str) -> Result<(), RequestError>;
}

#[async_trait]
impl ChatSurface for Bot {
    async fn reply(&self, chat: ChatId, to: MessageId, text: &str) -> Result<MessageId, RequestError> {
        let sent = self
            .send_message(chat, text)
            .reply_to_message_id(to)
            .allow_sending_without_reply(true)
            .await?;
        Ok(sent.id)
    }

    async fn edit(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError> {
        self.edit_message_text(chat, message, text).await?;
        Ok(())
    }

    async fn typing(&self, chat: ChatId) -> Result<(), RequestError> {
        self.send_chat_action(chat, ChatAction::Typing).await?;
        Ok(())
    }

    async fn send_video(&self, chat: ChatId, video: Vec<u8>, caption: &str) -> Result<(), RequestError> {
        let file = InputFile::memory(video).file_name(VIDEO_FILE_NAME);
        Requester::send_video(self, chat, file)
            .caption(caption)
            .supports_streaming(true)
            .await?;
        Ok(())
    }
}
