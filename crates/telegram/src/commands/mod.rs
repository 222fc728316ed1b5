//! Command handlers for the Telegram bot
//!
//! This module contains all handler endpoints organized by category:
//! - `basic`: Start, help and stats commands
//! - `download`: Plain messages carrying a TikTok link

mod basic;
mod download;

pub use basic::*;
pub use download::*;
