//! Usage statistics for the bot
//!
//! This crate owns the persisted download/user counters and a small HTTP
//! server that reports them for health checks.

mod server;
mod store;

pub use server::StatusServer;
pub use store::{Counters, Snapshot, StatsError, StatsStore};

/// Result type alias for status server operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
