//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::{Config, KNOWN_REGIONS};

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Discord
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.guild_id == Some(0) {
        errors.push("discord.guild_id must be non-zero".to_string());
    }
    if config.discord.roles.community == 0 {
        errors.push("discord.roles.community must be a non-zero role id".to_string());
    }
    for (i, role) in config.discord.roles.guild_member.iter().enumerate() {
        if *role == 0 {
            errors.push(format!("discord.roles.guild_member[{}] must be non-zero", i));
        }
    }

    for (i, admin) in config.discord.admins.iter().enumerate() {
        if admin.trim().is_empty() {
            errors.push(format!("discord.admins[{}] must not be empty", i));
        }
    }

    // Blizzard
    let blizzard = &config.blizzard;
    if blizzard.client_id.is_empty() {
        errors.push("blizzard.client_id is required".to_string());
    }
    if blizzard.client_secret.is_empty() {
        errors.push("blizzard.client_secret is required".to_string());
    }
    if blizzard.request_timeout_secs == 0 {
        errors.push("blizzard.request_timeout_secs must be non-zero".to_string());
    }
    if blizzard.api_url.is_none()
        && !KNOWN_REGIONS.contains(&blizzard.region.to_lowercase().as_str())
    {
        errors.push(format!(
            "blizzard.region '{}' is invalid (use: {}, or set blizzard.api_url)",
            blizzard.region,
            KNOWN_REGIONS.join(", ")
        ));
    }
    if blizzard.namespace.is_empty() {
        errors.push("blizzard.namespace is required".to_string());
    }
    if let Some(ref guild) = blizzard.guild {
        if guild.id == 0 {
            errors.push("blizzard.guild.id must be non-zero".to_string());
        }
        if guild.name.trim().is_empty() {
            errors.push("blizzard.guild.name is required".to_string());
        }
    }

    // Database
    if config.database.path.is_empty() {
        errors.push("database.path is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_valid_config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "valid_token_here".to_string(),
                guild_id: Some(123456789),
                roles: RolesConfig {
                    community: 1001,
                    guild_member: vec![2001, 2002],
                },
                admins: vec!["alice".to_string()],
            },
            blizzard: BlizzardConfig {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                region: "us".to_string(),
                locale: "en_US".to_string(),
                namespace: "profile-us".to_string(),
                oauth_url: None,
                api_url: None,
                request_timeout_secs: 15,
                guild: Some(GuildTarget {
                    id: 70395110,
                    name: "Stand and Deliver".to_string(),
                }),
            },
            database: DatabaseConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_zero_role_ids_fail() {
        let mut config = make_valid_config();
        config.discord.roles.community = 0;
        config.discord.roles.guild_member = vec![5, 0];

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.roles.community"));
        assert!(message.contains("guild_member[1]"));
    }

    #[test]
    fn test_missing_blizzard_credentials_fail() {
        let mut config = make_valid_config();
        config.blizzard.client_id = String::new();
        config.blizzard.client_secret = String::new();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("blizzard.client_id"));
        assert!(message.contains("blizzard.client_secret"));
    }

    #[test]
    fn test_unknown_region_needs_api_url() {
        let mut config = make_valid_config();
        config.blizzard.region = "cn".to_string();
        assert!(validate_config(&config).unwrap_err().to_string().contains("region"));

        config.blizzard.api_url = Some("https://gateway.battlenet.com.cn".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut config = make_valid_config();
        config.blizzard.request_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_guild_target_fails() {
        let mut config = make_valid_config();
        config.blizzard.guild = Some(GuildTarget {
            id: 0,
            name: " ".to_string(),
        });

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("blizzard.guild.id"));
        assert!(message.contains("blizzard.guild.name"));
    }
}
