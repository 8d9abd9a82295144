//! Error types for session collaborators.

use thiserror::Error;

/// Errors reported by a [`Session`](crate::Session) implementation.
///
/// The router never retries these. Whoever called the session reports the
/// failure back to the user and stops.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The transport is not connected.
    #[error("session is not connected")]
    NotConnected,

    /// Sending a reply failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The permission lookup for a user failed.
    #[error("permission lookup failed for user '{user_id}': {reason}")]
    PermissionLookup {
        /// The user whose permissions were requested.
        user_id: String,
        /// Reason for failure.
        reason: String,
    },
}

impl SessionError {
    /// Creates a send failure with the given reason.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed(reason.into())
    }

    /// Creates a permission lookup failure.
    pub fn permission_lookup(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionLookup {
            user_id: user_id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_lookup_display() {
        let err = SessionError::permission_lookup("42", "missing access");
        assert_eq!(
            err.to_string(),
            "permission lookup failed for user '42': missing access"
        );
    }

    #[test]
    fn test_send_failed_display() {
        let err = SessionError::send_failed("rate limited");
        assert_eq!(err.to_string(), "failed to send message: rate limited");
    }
}
