//! Handler for plain messages carrying a TikTok link

use crate::pipeline::{Outcome, Pipeline};
use crate::types::{HandlerResult, Incoming};
use teloxide::prelude::*;

/// Run a text message through the download pipeline
///
/// Messages without a sender, such as channel posts, are ignored.
pub async fn download(bot: Bot, msg: Message, pipeline: Pipeline) -> HandlerResult {
    let Some(incoming) = Incoming::from_message(&msg) else {
        tracing::debug!("Ignoring message {} in chat {} without sender", msg.id.0, msg.chat.id);
        return Ok(());
    };

    match pipeline.handle(&bot, &incoming).await {
        Outcome::Delivered(snapshot) => tracing::info!(
            "Delivered video to user {} ({} downloads total)",
            incoming.user_id,
            snapshot.total_downloads
        ),
        Outcome::Failed(err) => tracing::warn!("Download for user {} failed: {}", incoming.user_id, err),
        Outcome::CoolingDown(cooldown) => tracing::debug!(
            "User {} rate limited for {}s",
            incoming.user_id,
            cooldown.remaining_secs
        ),
        Outcome::InvalidLink => tracing::debug!("User {} sent an invalid link", incoming.user_id),
    }

    Ok(())
}
