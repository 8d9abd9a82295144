//! Failures while resolving a [`ThronebotConfig`](super::ThronebotConfig).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// figment could not read a source or map it onto the schema.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// A key that another setting depends on is unset.
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::ValidationError { message }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::MissingField { field }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
