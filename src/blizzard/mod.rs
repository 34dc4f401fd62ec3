//! Blizzard game-data API integration.
//!
//! Resolves characters, their guilds and guild ranks, authenticating with an
//! OAuth client-credential token that is cached and refreshed on demand.

pub mod api;
pub mod client;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod slug;
pub mod token;

pub use api::BlizzardApi;
pub use client::BlizzardClient;
