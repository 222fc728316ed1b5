//! Runtime configuration read from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use telegram::constants::COOLDOWN_SECONDS;

const DEFAULT_STATS_PATH: &str = "bot_stats.json";
const DEFAULT_STATUS_HOST: &str = "0.0.0.0";
const DEFAULT_STATUS_PORT: u16 = 5000;
const DEFAULT_FLUSH_SECONDS: u64 = 60;
const MAX_COOLDOWN_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELOXIDE_TOKEN must be set in the environment or .env file")]
    MissingToken,

    #[error("{name} has invalid value {value:?}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("LOOKUP_ENDPOINTS must contain at least one endpoint")]
    NoEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bot_token: String,
    pub stats_path: PathBuf,
    pub status_host: String,
    pub status_port: u16,
    pub cooldown: Duration,
    pub max_video_bytes: u64,
    pub stats_flush_interval: Duration,
    pub lookup_endpoints: Vec<String>,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = var("TELOXIDE_TOKEN").ok_or(ConfigError::MissingToken)?;

        // Hosting platforms hand out the port through PORT
        let status_port = match var("STATUS_PORT") {
            Some(v) => parse("STATUS_PORT", v, "a port number")?,
            None => match var("PORT") {
                Some(v) => parse("PORT", v, "a port number")?,
                None => DEFAULT_STATUS_PORT,
            },
        };

        let cooldown_secs = parse_or("COOLDOWN_SECONDS", var("COOLDOWN_SECONDS"), COOLDOWN_SECONDS, "whole seconds")?;
        if cooldown_secs > MAX_COOLDOWN_SECONDS {
            return Err(ConfigError::Invalid {
                name: "COOLDOWN_SECONDS",
                value: cooldown_secs.to_string(),
                expected: "at most 86400 seconds",
            });
        }
        let flush_secs = parse_or(
            "STATS_FLUSH_SECONDS",
            var("STATS_FLUSH_SECONDS"),
            DEFAULT_FLUSH_SECONDS,
            "whole seconds",
        )?;
        if flush_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "STATS_FLUSH_SECONDS",
                value: "0".to_string(),
                expected: "a positive number of seconds",
            });
        }

        let max_video_bytes = parse_or(
            "MAX_VIDEO_BYTES",
            var("MAX_VIDEO_BYTES"),
            tiktok::DEFAULT_MAX_BYTES,
            "a byte count",
        )?;

        let lookup_endpoints = match var("LOOKUP_ENDPOINTS") {
            Some(list) => {
                let endpoints: Vec<String> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(ToOwned::to_owned)
                    .collect();
                if endpoints.is_empty() {
                    return Err(ConfigError::NoEndpoints);
                }
                endpoints
            }
            None => tiktok::DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        };

        Ok(Self {
            bot_token,
            stats_path: var("STATS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATS_PATH)),
            status_host: var("STATUS_HOST").unwrap_or_else(|| DEFAULT_STATUS_HOST.to_string()),
            status_port,
            cooldown: Duration::from_secs(cooldown_secs),
            max_video_bytes,
            stats_flush_interval: Duration::from_secs(flush_secs),
            lookup_endpoints,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: String, expected: &'static str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value, expected })
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => parse(name, value, expected),
        None => Ok(default),
    }
}
