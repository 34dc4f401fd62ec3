//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `GUILDGATE_DISCORD_TOKEN` - Discord bot token
//! - `GUILDGATE_DISCORD_GUILD_ID` - Discord server whose roles are synced
//! - `GUILDGATE_BLIZZARD_CLIENT_ID` - Blizzard API client id
//! - `GUILDGATE_BLIZZARD_CLIENT_SECRET` - Blizzard API client secret
//! - `GUILDGATE_DB_PATH` - Registration database path
//! - `GUILDGATE_COMMUNITY_ROLE_ID` - Community role id
//! - `GUILDGATE_GUILD_MEMBER_ROLE_IDS` - JSON array of guild role ids

use std::env;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "GUILDGATE";

fn var(name: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

/// Apply environment variable overrides to a config.
///
/// This allows secrets to be provided via environment variables instead of
/// the config file.
pub fn apply_env_overrides(mut config: Config) -> Result<Config, ConfigError> {
    if let Some(token) = var("DISCORD_TOKEN") {
        config.discord.token = token;
    }
    if let Some(guild_id) = var("DISCORD_GUILD_ID") {
        config.discord.guild_id = Some(parse_id("DISCORD_GUILD_ID", &guild_id)?);
    }

    if let Some(client_id) = var("BLIZZARD_CLIENT_ID") {
        config.blizzard.client_id = client_id;
    }
    if let Some(secret) = var("BLIZZARD_CLIENT_SECRET") {
        config.blizzard.client_secret = secret;
    }

    if let Some(path) = var("DB_PATH") {
        config.database.path = path;
    }

    if let Some(role) = var("COMMUNITY_ROLE_ID") {
        config.discord.roles.community = parse_id("COMMUNITY_ROLE_ID", &role)?;
    }
    if let Some(roles) = var("GUILD_MEMBER_ROLE_IDS") {
        config.discord.roles.guild_member = parse_role_list(&roles)?;
    }

    Ok(config)
}

fn parse_id(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: format!("{}_{}", ENV_PREFIX, name),
        message: format!("'{}' is not a numeric id", value),
    })
}

/// Parse a JSON array of role ids. Ids may be given as numbers or strings,
/// since Discord snowflakes are usually copied as strings.
pub fn parse_role_list(raw: &str) -> Result<Vec<u64>, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        field: format!("{}_GUILD_MEMBER_ROLE_IDS", ENV_PREFIX),
        message,
    };

    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;

    values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| invalid(format!("{} is not a valid id", n))),
            serde_json::Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| invalid(format!("'{}' is not a valid id", s))),
            other => Err(invalid(format!("{} is not a valid id", other))),
        })
        .collect()
}

/// Check if any secret environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_DISCORD_TOKEN", ENV_PREFIX),
        format!("{}_BLIZZARD_CLIENT_ID", ENV_PREFIX),
        format!("{}_BLIZZARD_CLIENT_SECRET", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `GUILDGATE_CONFIG` environment variable, otherwise returns "guildgate.conf".
pub fn get_config_path() -> String {
    var("CONFIG").unwrap_or_else(|| "guildgate.conf".to_string())
}

/// Optional log file path from `GUILDGATE_LOG_FILE`.
pub fn get_log_file() -> Option<String> {
    var("LOG_FILE").filter(|path| !path.is_empty())
}
