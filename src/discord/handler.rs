//! Discord message event handling.
//!
//! Filters incoming messages, runs commands through the [`Dispatcher`] and
//! sends the replies back to the originating channel.

use std::sync::Arc;

use serenity::model::channel::Message;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use tracing::{debug, error};

use crate::discord::commands::{parse_command, Parsed};
use crate::discord::dispatch::{Dispatcher, Invocation};
use crate::discord::roles::SerenityRoleGateway;
use crate::roles::RoleGateway;

/// Discord's per-message content limit.
const MAX_MESSAGE_LEN: usize = 2000;

/// Per-message handler. Cheap to clone so each message can run in its own task.
#[derive(Clone)]
pub struct BotHandler {
    dispatcher: Arc<Dispatcher>,
    /// Server whose roles are synced; falls back to the message's server.
    role_guild: Option<GuildId>,
}

impl BotHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, role_guild: Option<GuildId>) -> Self {
        Self {
            dispatcher,
            role_guild,
        }
    }

    pub async fn handle_message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.author.id == ctx.cache.current_user().id {
            return;
        }

        let parsed = parse_command(&msg.content);
        if parsed == Parsed::Ignored {
            return;
        }

        let invocation = Invocation {
            author_id: msg.author.id,
            author_name: msg.author.name.clone(),
            is_direct_message: msg.guild_id.is_none(),
        };
        debug!(
            "Command from {} (dm: {}): {}",
            invocation.author_name, invocation.is_direct_message, msg.content
        );

        let gateway = self
            .role_guild
            .or(msg.guild_id)
            .map(|guild_id| SerenityRoleGateway::new(ctx.http.clone(), guild_id));
        let roles = gateway.as_ref().map(|g| g as &dyn RoleGateway);

        let Some(reply) = self.dispatcher.handle(&invocation, parsed, roles).await else {
            return;
        };

        for chunk in split_reply(&reply, MAX_MESSAGE_LEN) {
            if let Err(e) = msg.channel_id.say(&ctx.http, chunk).await {
                error!("Error sending reply to {}: {}", invocation.author_name, e);
                break;
            }
        }
    }
}

/// Split a reply into chunks of at most `max_len` bytes.
///
/// Prefers line breaks, then falls back to the last char boundary.
pub fn split_reply(reply: &str, max_len: usize) -> Vec<String> {
    if reply.len() <= max_len {
        return vec![reply.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = reply;

    while remaining.len() > max_len {
        let mut split_at = max_len;
        while !remaining.is_char_boundary(split_at) {
            split_at -= 1;
        }
        if split_at == 0 {
            split_at = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
        }

        match remaining[..split_at].rfind('\n') {
            Some(newline) if newline > 0 => {
                chunks.push(remaining[..newline].to_string());
                remaining = &remaining[newline + 1..];
            }
            _ => {
                chunks.push(remaining[..split_at].to_string());
                remaining = &remaining[split_at..];
            }
        }
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}
