//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RouterConfig, ThronebotConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ThronebotConfig) -> ConfigResult<()> {
    validate_router_config(&config.router)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates router configuration settings.
fn validate_router_config(router: &RouterConfig) -> ConfigResult<()> {
    // A router with neither can never be invoked
    if router.prefix.is_empty() && router.bot_id.is_empty() {
        return Err(ConfigError::validation(
            "At least one of router.prefix and router.bot_id must be set",
        ));
    }

    if router.bot_id.contains(char::is_whitespace) {
        return Err(ConfigError::validation("Bot ID cannot contain whitespace"));
    }

    if router.owners.iter().any(|owner| owner.trim().is_empty()) {
        return Err(ConfigError::validation("Owner IDs cannot be empty"));
    }

    Ok(())
}

/// Validates logging configuration settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter module: {module:?}"
            )));
        }
    }

    Ok(())
}
