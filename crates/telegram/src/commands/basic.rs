//! Basic bot commands (start, help, stats)

use crate::constants::{emoji, text};
use crate::types::HandlerResult;
use crate::utils;
use stats::StatsStore;
use teloxide::prelude::*;

/// Welcome message with usage instructions
///
/// Also registers the sender in the user statistics.
pub async fn start(bot: Bot, msg: Message, stats: StatsStore) -> HandlerResult {
    remember_sender(&msg, &stats).await;
    bot.send_message(msg.chat.id, text::HELP)
        .reply_to_message_id(msg.id)
        .await?;
    Ok(())
}

/// Display help message
pub async fn help(bot: Bot, msg: Message, stats: StatsStore) -> HandlerResult {
    start(bot, msg, stats).await
}

/// Show download and user counters
pub async fn stats(bot: Bot, msg: Message, stats: StatsStore) -> HandlerResult {
    bot.send_message(msg.chat.id, format_stats(&stats))
        .reply_to_message_id(msg.id)
        .await?;
    Ok(())
}

fn format_stats(stats: &StatsStore) -> String {
    let snapshot = stats.snapshot();
    format!(
        "{} Bot statistics\n\n\
        👥 Total users: {}\n\
        {} Total downloads: {}\n\
        ⏱️ Uptime: {}",
        emoji::INFO,
        snapshot.total_users,
        emoji::DOWNLOAD,
        snapshot.total_downloads,
        utils::format_uptime(snapshot.uptime_seconds)
    )
}

async fn remember_sender(msg: &Message, stats: &StatsStore) {
    if let Some(user) = msg.from() {
        remember_user(stats, user.id.0).await;
    }
}

/// Add a user to the seen-users set, saving the counters for new users
///
/// Returns whether the user was new.
async fn remember_user(stats: &StatsStore, user_id: u64) -> bool {
    if !stats.record_user(user_id) {
        return false;
    }
    tracing::info!("New user {}", user_id);
    if let Err(e) = stats.persist().await {
        tracing::error!("Failed to save stats: {}", e);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_stats() {
        let dir = TempDir::new().unwrap();
        let stats = StatsStore::fresh(dir.path().join("stats.json"));
        stats.record_download(1);
        stats.record_download(2);
        stats.record_download(2);

        let text = format_stats(&stats);
        assert!(text.contains("Total users: 2"));
        assert!(text.contains("Total downloads: 3"));
        assert!(text.contains("Uptime: 0h 0m"));
    }

    #[tokio::test]
    async fn test_remember_user_saves_new_users() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let stats = StatsStore::fresh(&path);

        assert!(remember_user(&stats, 42).await);
        assert!(stats.counters().total_users.contains(&42));
        assert!(!stats.is_dirty());

        let reloaded = StatsStore::open(&path).await.unwrap();
        assert!(reloaded.counters().total_users.contains(&42));
        assert_eq!(reloaded.counters().total_downloads, 0);
    }

    #[tokio::test]
    async fn test_remember_user_skips_known_users() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let stats = StatsStore::fresh(&path);

        assert!(remember_user(&stats, 7).await);
        std::fs::remove_file(&path).unwrap();

        // A repeat visit changes nothing, so nothing is written
        assert!(!remember_user(&stats, 7).await);
        assert!(!path.exists());
        assert_eq!(stats.snapshot().total_users, 1);
    }
}
