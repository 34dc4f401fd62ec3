//! Discord bot integration.
//!
//! Parses chat commands, runs them against the registration store and the
//! Blizzard API, and grants member roles.

pub mod client;
pub mod commands;
pub mod dispatch;
pub mod handler;
pub mod roles;

pub use client::{role_guild, DiscordBotBuilder};
pub use dispatch::Dispatcher;
pub use handler::BotHandler;
