//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Blizzard API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failure of the OAuth client-credential exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("token endpoint returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Errors from the character/guild resolution pipeline.
///
/// A character or guild that simply does not exist is not an error: lookups
/// return `false` or `None` for that case.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("guild '{guild}' not found on realm '{realm}'")]
    GuildNotFound { realm: String, guild: String },

    #[error("API returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Registration store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Discord-related errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Member {user_id} not found in guild {guild_id}")]
    MemberNotFound { guild_id: u64, user_id: u64 },

    #[error("Failed to grant role {role_id}: {message}")]
    RoleGrantFailed { role_id: u64, message: String },

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Result type alias for resolution pipeline operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result type alias for registration store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for Discord operations.
pub type DiscordResult<T> = std::result::Result<T, DiscordError>;
