use teloxide::{
    macros::BotCommands,
    types::{ChatId, Message, MessageId},
};

/// Type alias for handler result types
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Available bot commands
#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "Show how to use the bot")]
    Start,
    #[command(description = "Display help information")]
    Help,
    #[command(description = "Show bot statistics")]
    Stats,
}

/// A text message from a user, as seen by the download pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub user_id: u64,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
}

impl Incoming {
    /// Extract the pipeline input from a Telegram message
    ///
    /// Returns `None` for messages without text or without a sender.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let user = msg.from()?;
        let text = msg.text()?;
        Some(Self {
            user_id: user.id.0,
            chat_id: msg.chat.id,
            message_id: msg.id,
            text: text.to_string(),
        })
    }
}
