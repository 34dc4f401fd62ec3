//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::load_config;
pub use types::*;

use tracing::warn;

use crate::common::error::ConfigError;

/// Load the config file, apply environment overrides and validate the result.
pub fn load_and_validate(path: &str) -> Result<Config, ConfigError> {
    for var in env::check_empty_env_vars() {
        warn!("{} is set but empty; it will override the config file value", var);
    }

    let config = load_config(path)?;
    let config = env::apply_env_overrides(config)?;
    validate::validate_config(&config)?;
    Ok(config)
}
