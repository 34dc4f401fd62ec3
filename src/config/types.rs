//! Configuration type definitions.

use serde::Deserialize;
use serenity::model::id::RoleId;

use crate::roles::RolePolicy;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub blizzard: BlizzardConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Server whose roles are synced. Defaults to the server the command was
    /// sent from.
    pub guild_id: Option<u64>,
    pub roles: RolesConfig,
    /// Usernames seeded into the admin table at startup.
    #[serde(default)]
    pub admins: Vec<String>,
}

/// Roles granted on verification.
#[derive(Debug, Clone, Deserialize)]
pub struct RolesConfig {
    /// Role granted to every member with a verified character.
    pub community: u64,
    /// Guild member roles, lowest tier first.
    #[serde(default)]
    pub guild_member: Vec<u64>,
}

impl RolesConfig {
    /// Build the role policy. Ids must have been validated as non-zero.
    pub fn policy(&self) -> RolePolicy {
        RolePolicy {
            community_role: RoleId::new(self.community),
            guild_roles: self.guild_member.iter().copied().map(RoleId::new).collect(),
        }
    }
}

/// Blizzard API credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BlizzardConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Overrides the token endpoint derived from `region`.
    pub oauth_url: Option<String>,
    /// Overrides the API base URL derived from `region`.
    pub api_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// The in-game guild whose members get the guild role.
    pub guild: Option<GuildTarget>,
}

/// Regions with a `{region}.api.blizzard.com` endpoint.
pub const KNOWN_REGIONS: [&str; 4] = ["us", "eu", "kr", "tw"];

impl BlizzardConfig {
    pub fn oauth_url(&self) -> String {
        self.oauth_url
            .clone()
            .unwrap_or_else(|| "https://oauth.battle.net/token".to_string())
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.api.blizzard.com", self.region.to_lowercase()))
    }
}

/// Guild identified by its numeric id; the name is only used in replies.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildTarget {
    pub id: u64,
    pub name: String,
}

/// Registration database settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_region() -> String {
    "us".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_namespace() -> String {
    "profile-us".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_db_path() -> String {
    "characters.db".to_string()
}
