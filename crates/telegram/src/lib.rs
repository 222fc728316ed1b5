pub mod chat;
pub mod commands;
pub mod constants;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod rate_limit;
pub mod telegram;
pub mod types;
pub mod utils;

pub use chat::ChatSurface;
pub use error::{BotError, UserMessage};
pub use media::MediaSource;
pub use pipeline::{Outcome, Pipeline};
pub use rate_limit::{CoolingDown, RateLimiter};
pub use teloxide::prelude::Dispatcher;
pub use types::{Command, HandlerResult, Incoming};
