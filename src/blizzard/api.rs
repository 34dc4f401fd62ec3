//! Character and guild resolution.
//!
//! [`BlizzardApi`] is the capability the dispatcher talks to. Implementors
//! provide the three remote lookups; membership checks and the simplified
//! guild view are composed on top of them here so every implementation
//! resolves the guild before touching the roster.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::blizzard::slug::slugify;
use crate::common::error::ApiResult;

/// A realm as referenced by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Realm {
    pub name: String,
    pub id: u64,
    pub slug: String,
}

/// A character's guild, keyed by its numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub name: String,
    pub id: u64,
    pub realm: Realm,
    pub faction_name: String,
}

impl Guild {
    /// Slug of the guild's own realm, derived from the realm name when the
    /// API left the slug out.
    pub fn realm_slug(&self) -> ApiResult<String> {
        if self.realm.slug.is_empty() {
            slugify(&self.realm.name, "guild realm")
        } else {
            Ok(self.realm.slug.clone())
        }
    }
}

/// Guild rank from the roster. Rank 0 is the guild master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildRank {
    Known(u32),
    Unknown,
}

impl fmt::Display for GuildRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(0) => write!(f, "0 (Guild Master)"),
            Self::Known(rank) => write!(f, "{}", rank),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A character's entry on a guild roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMembership {
    pub character_name: String,
    pub realm_slug: String,
    pub rank: GuildRank,
}

/// Simplified guild view shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub guild_name: String,
    pub rank: GuildRank,
    pub faction_name: String,
}

#[async_trait]
pub trait BlizzardApi: Send + Sync {
    /// Whether the character exists. A 404 is `false`, not an error.
    async fn character_exists(&self, name: &str, realm: &str) -> ApiResult<bool>;

    /// The character's guild, or `None` when guildless or unknown.
    async fn get_character_guild(&self, name: &str, realm: &str) -> ApiResult<Option<Guild>>;

    /// Look the character up on a guild roster.
    async fn get_guild_member_info(
        &self,
        name: &str,
        realm_slug: &str,
        guild_slug: &str,
    ) -> ApiResult<Option<GuildMembership>>;

    /// Whether the character belongs to the guild with `guild_id`.
    async fn is_character_in_guild(&self, name: &str, realm: &str, guild_id: u64) -> ApiResult<bool> {
        match self.get_character_guild(name, realm).await? {
            Some(guild) => Ok(guild.id == guild_id),
            None => Ok(false),
        }
    }

    /// Guild name, faction and (best effort) rank for a character.
    ///
    /// The roster is queried on the guild's realm, which can differ from the
    /// character's realm in connected-realm groups. Any failure to resolve the
    /// membership degrades to [`GuildRank::Unknown`].
    async fn get_guild_info(&self, name: &str, realm: &str) -> ApiResult<Option<GuildInfo>> {
        let Some(guild) = self.get_character_guild(name, realm).await? else {
            return Ok(None);
        };

        let rank = match resolve_rank(self, name, &guild).await {
            Ok(Some(membership)) => membership.rank,
            Ok(None) => {
                debug!("{} not found on the roster of {}", name, guild.name);
                GuildRank::Unknown
            }
            Err(e) => {
                warn!("Could not resolve rank of {} in {}: {}", name, guild.name, e);
                GuildRank::Unknown
            }
        };

        Ok(Some(GuildInfo {
            guild_name: guild.name,
            rank,
            faction_name: guild.faction_name,
        }))
    }
}

async fn resolve_rank<A: BlizzardApi + ?Sized>(
    api: &A,
    name: &str,
    guild: &Guild,
) -> ApiResult<Option<GuildMembership>> {
    let realm_slug = guild.realm_slug()?;
    let guild_slug = slugify(&guild.name, "guild")?;
    api.get_guild_member_info(name, &realm_slug, &guild_slug).await
}
