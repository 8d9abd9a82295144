//! The session/reply collaborator contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionResult;
use crate::message::Embed;

/// A handle back to the chat transport that delivered a message.
///
/// The router hands one of these to every handler through the dispatch
/// context. Implementations must be cheap to share (`Arc`) and safe to call
/// from concurrently running handlers.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct StdoutSession;
///
/// #[async_trait]
/// impl Session for StdoutSession {
///     async fn send_text(&self, channel_id: &str, text: &str) -> SessionResult<()> {
///         println!("[#{channel_id}] {text}");
///         Ok(())
///     }
///
///     async fn send_embed(&self, channel_id: &str, embed: &Embed) -> SessionResult<()> {
///         println!("[#{channel_id}] {}", embed.description.as_deref().unwrap_or(""));
///         Ok(())
///     }
///
///     async fn is_elevated(&self, _user_id: &str, _channel_id: &str) -> SessionResult<bool> {
///         Ok(false)
///     }
/// }
/// ```
#[async_trait]
pub trait Session: Send + Sync {
    /// Sends plain text to a channel.
    async fn send_text(&self, channel_id: &str, text: &str) -> SessionResult<()>;

    /// Sends a structured rich-content block to a channel.
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> SessionResult<()>;

    /// Returns whether `user_id` holds elevated rights in `channel_id`.
    ///
    /// A lookup failure must be reported as `Err`, never as `Ok(false)`, so
    /// that callers can tell "denied" from "unknown".
    async fn is_elevated(&self, user_id: &str, channel_id: &str) -> SessionResult<bool>;
}

/// A shared session trait object.
pub type BoxedSession = Arc<dyn Session>;
