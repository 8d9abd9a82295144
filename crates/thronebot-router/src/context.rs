//! The per-invocation dispatch context.
//!
//! One [`CommandContext`] is created for every message that resolves to a
//! route. It is handed to the middleware chain and the final handler as an
//! `Arc<CommandContext>` and dropped once the chain returns. Contexts are
//! never shared between two dispatches.
//!
//! The scratch map ([`set`](CommandContext::set) / [`get`](CommandContext::get))
//! lets middleware pass values to the handlers they wrap. It is guarded by a
//! mutex, so a handler that spawns background work against its own context
//! stays race free.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use thronebot_core::{BoxedSession, Embed, Message};

use crate::args::Args;

/// Descriptive data of the route a message resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteInfo {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) description: Option<String>,
}

impl RouteInfo {
    /// The route's own name (the last path segment). Empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The space-joined names from the root down to this route.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

type Vars = HashMap<String, Box<dyn Any + Send + Sync>>;

/// The context object passed to middleware and handlers.
///
/// # Example
///
/// ```rust,ignore
/// async fn set_handler(ctx: Arc<CommandContext>) {
///     let (prop, value) = (ctx.args().get(1), ctx.args().get(2));
///     if prop.is_empty() || value.is_empty() {
///         ctx.reply("Missing property name or value").await;
///         return;
///     }
///     ctx.reply(format!("Set {prop} to {value}")).await;
/// }
/// ```
pub struct CommandContext {
    args: Args,
    message: Message,
    session: BoxedSession,
    route: Arc<RouteInfo>,
    vars: Mutex<Vars>,
}

impl CommandContext {
    /// Creates a context with an empty scratch map.
    pub fn new(args: Args, message: Message, session: BoxedSession, route: Arc<RouteInfo>) -> Self {
        Self {
            args,
            message,
            session,
            route,
            vars: Mutex::new(HashMap::new()),
        }
    }

    /// The final argument list.
    ///
    /// Argument 0 is the space-joined command path the route was found under;
    /// positional arguments follow. For the bare-mention default handler the
    /// list is empty.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// The inbound message that triggered this dispatch.
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn author_id(&self) -> &str {
        &self.message.author_id
    }

    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn session(&self) -> &BoxedSession {
        &self.session
    }

    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    pub(crate) fn route_arc(&self) -> Arc<RouteInfo> {
        Arc::clone(&self.route)
    }

    // ─── Scratch map ──────────────────────────────────────────────────────────

    /// Stores a value under `key`, replacing any previous value.
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.vars.lock().insert(key.into(), Box::new(value));
    }

    /// Returns a clone of the value stored under `key`.
    ///
    /// Returns `None` if nothing is stored there or the stored value is not a `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.vars
            .lock()
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.lock().contains_key(key)
    }

    /// Removes and returns the value stored under `key` if it is a `T`.
    ///
    /// A value of another type is left in place.
    pub fn remove<T: 'static>(&self, key: &str) -> Option<T> {
        let mut vars = self.vars.lock();
        if !vars.get(key).is_some_and(|v| v.is::<T>()) {
            return None;
        }
        vars.remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    // ─── Replies ──────────────────────────────────────────────────────────────

    /// Sends plain text to the channel the message came from.
    ///
    /// Send failures are logged and otherwise ignored.
    pub async fn reply(&self, text: impl AsRef<str>) {
        if let Err(e) = self
            .session
            .send_text(&self.message.channel_id, text.as_ref())
            .await
        {
            error!(channel = %self.message.channel_id, "Failed to send reply: {e}");
        }
    }

    /// Sends a rich-content block to the channel the message came from.
    pub async fn reply_embed(&self, embed: &Embed) {
        if let Err(e) = self
            .session
            .send_embed(&self.message.channel_id, embed)
            .await
        {
            error!(channel = %self.message.channel_id, "Failed to send embed: {e}");
        }
    }

    /// Sends an embed that only has a description.
    pub async fn reply_embed_quick(&self, text: impl Into<String>) {
        self.reply_embed(&Embed::quick(text)).await;
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("args", &self.args)
            .field("message", &self.message)
            .field("route", &self.route)
            .field("vars", &self.vars.lock().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSession, Sent};

    fn context(session: Arc<MockSession>) -> CommandContext {
        CommandContext::new(
            Args::from(vec!["ping".to_string()]),
            Message::new("m1", "u1", "c1", "!ping"),
            session,
            Arc::new(RouteInfo::default()),
        )
    }

    #[test]
    fn test_scratch_map_round_trip() {
        let ctx = context(Arc::new(MockSession::default()));
        ctx.set("user_level", 3_u8);
        assert!(ctx.contains("user_level"));
        assert_eq!(ctx.get::<u8>("user_level"), Some(3));
        assert_eq!(ctx.get::<String>("user_level"), None);
        assert_eq!(ctx.get::<u8>("missing"), None);
    }

    #[test]
    fn test_remove_leaves_value_of_other_type() {
        let ctx = context(Arc::new(MockSession::default()));
        ctx.set("k", "v".to_string());
        assert_eq!(ctx.remove::<u32>("k"), None);
        assert!(ctx.contains("k"));
        assert_eq!(ctx.remove::<String>("k").as_deref(), Some("v"));
        assert!(!ctx.contains("k"));
    }

    #[tokio::test]
    async fn test_reply_goes_to_source_channel() {
        let session = Arc::new(MockSession::default());
        let ctx = context(session.clone());
        ctx.reply("pong").await;
        ctx.reply_embed_quick("quick").await;

        assert_eq!(session.sent(), vec![
            Sent::Text {
                channel: "c1".into(),
                text: "pong".into(),
            },
            Sent::Embed {
                channel: "c1".into(),
                embed: Embed::quick("quick"),
            },
        ]);
    }

    #[tokio::test]
    async fn test_reply_failure_is_swallowed() {
        let session = Arc::new(MockSession::default().failing_sends());
        let ctx = context(session.clone());
        ctx.reply("lost").await;
        assert!(session.sent().is_empty());
    }
}
