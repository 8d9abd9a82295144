//! Configuration module for the thronebot runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the router, logging and free-form application settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, RouterConfig, SpanEventConfig,
    ThronebotConfig,
};
pub use validation::validate_config;
