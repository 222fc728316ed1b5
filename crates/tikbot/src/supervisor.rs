//! Polling supervisor
//!
//! Before handing the bot over to the dispatcher, the supervisor makes sure
//! the token works, drops any webhook left by an earlier deployment and
//! checks that no other instance is polling the same bot. A conflicting
//! poller usually goes away when the old deployment shuts down, so conflicts
//! get a longer backoff than other failures.

use std::future::Future;
use std::time::Duration;

use stats::StatsStore;
use ::telegram::{telegram, Pipeline};
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("gave up after {attempts} failed attempts to start polling: {source}")]
    GaveUp {
        attempts: u32,
        #[source]
        source: RequestError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub conflict_backoff: Duration,
    pub other_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            conflict_backoff: Duration::from_secs(30),
            other_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// How long to wait after a failed startup attempt
    pub fn backoff_for(&self, error: &RequestError) -> Duration {
        if is_conflict(error) {
            self.conflict_backoff
        } else {
            self.other_backoff
        }
    }
}

/// Another poller or an active webhook holds the update stream
fn is_conflict(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates | ApiError::CantGetUpdates)
    )
}

/// Run `op` until it succeeds or the policy runs out of attempts
async fn retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, SupervisorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(source) if attempt >= max_attempts => {
                tracing::error!("Startup attempt {}/{} failed: {}", attempt, max_attempts, source);
                return Err(SupervisorError::GaveUp { attempts: attempt, source });
            }
            Err(e) => {
                let wait = policy.backoff_for(&e);
                if is_conflict(&e) {
                    tracing::warn!(
                        "Another instance is polling this bot (attempt {}/{}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        wait
                    );
                } else {
                    tracing::warn!(
                        "Startup attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        wait
                    );
                }
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Check the token and claim the update stream without consuming updates
///
/// A webhook blocks `getUpdates`, so it is removed first. Pending updates
/// are kept for the dispatcher.
async fn probe(bot: &Bot) -> Result<(), RequestError> {
    let me = bot.get_me().await?;
    bot.delete_webhook().await?;
    bot.get_updates().timeout(0).limit(1).await?;
    tracing::info!("Authorized as @{}", me.user.username.as_deref().unwrap_or_default());
    Ok(())
}

/// Probe Telegram with retries, then dispatch updates until shutdown
pub async fn run(
    bot: Bot,
    pipeline: Pipeline,
    stats: StatsStore,
    policy: RetryPolicy,
) -> Result<(), SupervisorError> {
    retry(policy, |attempt| {
        let bot = bot.clone();
        async move {
            tracing::debug!("Probing Telegram, attempt {}", attempt);
            probe(&bot).await
        }
    })
    .await?;

    tracing::info!("Bot started, polling for updates");

    Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![pipeline, stats])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Dispatcher stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::path_regex;
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const WEBHOOK_ACTIVE: &str =
        "Conflict: can't use getUpdates method while webhook is active; use deleteWebhook to delete the webhook first";
    const OTHER_POLLER: &str =
        "Conflict: terminated by other getUpdates request; make sure that only one bot instance is running";

    /// Bot API stand-in whose `getUpdates` fails while a webhook is set
    struct FakeApi {
        webhook_set: AtomicBool,
        other_poller: bool,
    }

    struct Method {
        api: Arc<FakeApi>,
        name: &'static str,
    }

    impl Respond for Method {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            match self.name {
                "getme" => ok(json!({
                    "id": 1000,
                    "is_bot": true,
                    "first_name": "TikTok Bot",
                    "username": "tiktok_test_bot",
                    "can_join_groups": true,
                    "can_read_all_group_messages": false,
                    "supports_inline_queries": false
                })),
                "deletewebhook" => {
                    self.api.webhook_set.store(false, Ordering::SeqCst);
                    ok(json!(true))
                }
                _ if self.api.webhook_set.load(Ordering::SeqCst) => conflict_response(WEBHOOK_ACTIVE),
                _ if self.api.other_poller => conflict_response(OTHER_POLLER),
                _ => ok(json!([])),
            }
        }
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": result }))
    }

    fn conflict_response(description: &str) -> ResponseTemplate {
        ResponseTemplate::new(409).set_body_json(json!({
            "ok": false,
            "error_code": 409,
            "description": description
        }))
    }

    async fn fake_bot(webhook_set: bool, other_poller: bool) -> (MockServer, Bot) {
        let server = MockServer::start().await;
        let api = Arc::new(FakeApi {
            webhook_set: AtomicBool::new(webhook_set),
            other_poller,
        });
        for name in ["getme", "deletewebhook", "getupdates"] {
            Mock::given(path_regex(format!("(?i)/{}$", name)))
                .respond_with(Method {
                    api: Arc::clone(&api),
                    name,
                })
                .mount(&server)
                .await;
        }
        let bot = Bot::new("123:abc").set_api_url(server.uri().parse().unwrap());
        (server, bot)
    }

    async fn called_methods(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().rsplit('/').next().unwrap_or_default().to_lowercase())
            .collect()
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            conflict_backoff: Duration::from_millis(5),
            other_backoff: Duration::from_millis(1),
        }
    }

    fn conflict() -> RequestError {
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates)
    }

    fn bad_gateway() -> RequestError {
        RequestError::Api(ApiError::Unknown("Bad Gateway".to_string()))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_for(&conflict()), Duration::from_secs(30));
        assert_eq!(
            policy.backoff_for(&RequestError::Api(ApiError::CantGetUpdates)),
            Duration::from_secs(30)
        );
        assert_eq!(policy.backoff_for(&bad_gateway()), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry(quick_policy(), move |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(conflict())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry(quick_policy(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(bad_gateway()) }
        })
        .await;

        match result {
            Err(SupervisorError::GaveUp { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, RequestError::Api(ApiError::Unknown(_))));
            }
            Ok(()) => panic!("expected failure"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_probe_clears_leftover_webhook() {
        let (server, bot) = fake_bot(true, false).await;

        probe(&bot).await.unwrap();

        assert_eq!(called_methods(&server).await, ["getme", "deletewebhook", "getupdates"]);
    }

    #[tokio::test]
    async fn test_leftover_webhook_does_not_exhaust_retries() {
        let (server, bot) = fake_bot(true, false).await;

        let result = retry(quick_policy(), |_| {
            let bot = bot.clone();
            async move { probe(&bot).await }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(called_methods(&server).await.len(), 3);
    }

    #[tokio::test]
    async fn test_probe_reports_other_poller() {
        let (_server, bot) = fake_bot(false, true).await;

        let err = probe(&bot).await.unwrap_err();
        assert!(matches!(err, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)));
        assert_eq!(RetryPolicy::default().backoff_for(&err), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_retry_first_attempt_no_wait() {
        let policy = RetryPolicy {
            max_attempts: 5,
            conflict_backoff: Duration::from_secs(3600),
            other_backoff: Duration::from_secs(3600),
        };
        let result = tokio::time::timeout(Duration::from_secs(5), retry(policy, |_| async { Ok(()) })).await;
        assert!(result.is_ok());
    }
}
