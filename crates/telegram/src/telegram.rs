use crate::commands;
use crate::types::Command;
use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};

/// Register bot commands in Telegram menu
pub async fn set_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(commands::start))
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Stats].endpoint(commands::stats));

    Update::filter_message()
        .branch(command_handler)
        .branch(Message::filter_text().endpoint(commands::download))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::ControlFlow;
    use teloxide::types::Me;

    fn update(message: serde_json::Value) -> Update {
        serde_json::from_value(serde_json::json!({ "update_id": 1, "message": message })).unwrap()
    }

    fn me() -> Me {
        serde_json::from_value(serde_json::json!({
            "id": 1000,
            "is_bot": true,
            "first_name": "TikTok Bot",
            "username": "tiktok_test_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_non_text_messages_are_ignored() {
        let location = update(serde_json::json!({
            "message_id": 5,
            "date": 1700000000,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "location": { "latitude": 11.55, "longitude": 104.92 }
        }));

        let result = schema().dispatch(dptree::deps![location, me()]).await;
        assert!(matches!(result, ControlFlow::Continue(_)));
    }
}
