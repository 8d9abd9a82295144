//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `run` was called while a previous run is still active.
    #[error("Runtime is already running")]
    AlreadyRunning,

    /// The message source failed and cannot deliver more messages.
    #[error("Message source failed: {0}")]
    Source(String),
}

impl RuntimeError {
    pub fn source_failed(reason: impl std::fmt::Display) -> Self {
        Self::Source(reason.to_string())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
