mod config;
mod logging;
mod supervisor;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use config::Config;
use stats::{StatsError, StatusServer, StatsStore};
use supervisor::RetryPolicy;
use ::telegram::{telegram, Pipeline, RateLimiter};
use teloxide::prelude::*;
use tiktok::TikTokApi;

/// Timeout for every Bot API request, including video uploads
const BOT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

type Error = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Bot stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let stats = open_stats(&config).await?;
    stats.spawn_flush_task(config.stats_flush_interval);

    let limiter = Arc::new(RateLimiter::new(config.cooldown));
    limiter.spawn_cleanup_task();

    let api = TikTokApi::new(config.lookup_endpoints.clone(), config.max_video_bytes)?;
    tracing::info!(
        "Using {} lookup endpoints, video size cap {} bytes",
        config.lookup_endpoints.len(),
        config.max_video_bytes
    );

    let pipeline = Pipeline::new(Arc::new(api), limiter, stats.clone());

    let server = StatusServer::new(stats.clone());
    let (host, port) = (config.status_host.clone(), config.status_port);
    tokio::spawn(async move {
        if let Err(e) = server.serve(&host, port).await {
            tracing::error!("Status server error: {}", e);
        }
    });

    let client = teloxide::net::default_reqwest_settings()
        .timeout(BOT_REQUEST_TIMEOUT)
        .build()?;
    let bot = Bot::with_client(&config.bot_token, client);

    if let Err(e) = telegram::set_bot_commands(&bot).await {
        tracing::warn!("Failed to register bot commands: {}", e);
    }

    let outcome = supervisor::run(bot, pipeline, stats.clone(), RetryPolicy::default()).await;

    if let Err(e) = stats.persist().await {
        tracing::error!("Failed to save stats on shutdown: {}", e);
    }

    outcome?;
    Ok(())
}

/// Load the counters file, setting a corrupt one aside instead of failing
async fn open_stats(config: &Config) -> Result<StatsStore, StatsError> {
    match StatsStore::open(config.stats_path.clone()).await {
        Ok(stats) => Ok(stats),
        Err(StatsError::Corrupt { path, source }) => {
            tracing::warn!("Stats file {} is corrupt: {}", path.display(), source);
            StatsStore::quarantine(&path).await?;
            Ok(StatsStore::fresh(path))
        }
        Err(e) => Err(e),
    }
}
