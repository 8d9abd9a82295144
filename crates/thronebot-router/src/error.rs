//! Error types for the router.

use thiserror::Error;

/// Returned by the dispatcher when a message is not a recognised command.
///
/// Either no invocation prefix matched, or the tokens did not resolve to an
/// invocable route. The caller should stay silent: arbitrary chat messages
/// must never trigger a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("router: could not find route")]
pub struct RouteNotFound;

/// Errors that can occur while extracting handler parameters from a context.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
