//! Message dispatcher.
//!
//! The [`Dispatcher`] owns the frozen route tree together with the invocation
//! prefix and the bot's own user id. For every inbound message it:
//!
//! 1. Invokes the default handler if the message is exactly a mention of the
//!    bot (`<@id>` or `<@!id>`).
//! 2. Otherwise strips the first matching invocation prefix: the configured
//!    prefix, then `<@id>`, then `<@!id>`.
//! 3. Tokenizes the remainder and resolves it with [`Route::find_full`].
//! 4. Rewrites the arguments so argument 0 is the full command path and
//!    awaits the composed handler.
//!
//! Messages that are not commands yield [`RouteNotFound`] and no reply.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(router, "!", "1234");
//! if dispatcher.find_and_execute(message, session).await.is_err() {
//!     // ordinary chat message, ignore
//! }
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;
use tracing::{Instrument, debug, debug_span, trace};

use thronebot_core::{BoxedSession, Message};

use crate::args::{Args, SEPARATOR, parse_args};
use crate::context::{CommandContext, RouteInfo};
use crate::error::RouteNotFound;
use crate::handler::BoxedHandler;
use crate::route::Route;

/// Mention form of a user id.
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Nickname mention form of a user id.
pub fn nick_mention(user_id: &str) -> String {
    format!("<@!{user_id}>")
}

/// A message resolved to a route, ready to be executed.
#[derive(Clone)]
pub struct Resolution {
    args: Args,
    route: Arc<RouteInfo>,
    handler: BoxedHandler,
}

impl Resolution {
    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn route(&self) -> &RouteInfo {
        &self.route
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("args", &self.args)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// A message paired with the session replies should go through.
#[derive(Clone)]
pub struct Incoming {
    pub message: Message,
    pub session: BoxedSession,
}

impl Incoming {
    pub fn new(message: Message, session: BoxedSession) -> Self {
        Self { message, session }
    }
}

impl std::fmt::Debug for Incoming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Incoming")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

struct DispatcherInner {
    router: Route,
    prefix: String,
    bot_id: String,
    mention: String,
    nick_mention: String,
}

/// Resolves inbound messages against a route tree and runs the handlers.
///
/// Cloning is cheap; all clones share the same tree.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Freezes `router` for dispatch.
    ///
    /// An empty `prefix` disables the explicit prefix and an empty `bot_id`
    /// disables mention invocation.
    pub fn new(router: Route, prefix: impl Into<String>, bot_id: impl Into<String>) -> Self {
        let bot_id = bot_id.into();
        Self {
            inner: Arc::new(DispatcherInner {
                router,
                prefix: prefix.into(),
                mention: mention(&bot_id),
                nick_mention: nick_mention(&bot_id),
                bot_id,
            }),
        }
    }

    pub fn router(&self) -> &Route {
        &self.inner.router
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn bot_id(&self) -> &str {
        &self.inner.bot_id
    }

    fn is_bare_mention(&self, content: &str) -> bool {
        !self.inner.bot_id.is_empty()
            && (content == self.inner.mention || content == self.inner.nick_mention)
    }

    fn strip_prefix<'a>(&self, content: &'a str) -> Option<&'a str> {
        let inner = &self.inner;
        if !inner.prefix.is_empty()
            && let Some(rest) = content.strip_prefix(inner.prefix.as_str())
        {
            return Some(rest);
        }
        if inner.bot_id.is_empty() {
            return None;
        }
        content
            .strip_prefix(inner.mention.as_str())
            .or_else(|| content.strip_prefix(inner.nick_mention.as_str()))
    }

    /// Resolves `content` to a route without executing anything.
    pub fn resolve(&self, content: &str) -> Result<Resolution, RouteNotFound> {
        let router = &self.inner.router;

        if let Some(default) = router.get_default()
            && self.is_bare_mention(content)
        {
            return Ok(Resolution {
                args: Args::default(),
                route: router.info_arc(),
                handler: Arc::clone(default),
            });
        }

        let command = self.strip_prefix(content).ok_or(RouteNotFound)?;
        // Every space after the prefix is dropped, so `thronebot  ping` still
        // reaches `ping` instead of tokenizing to an empty first word.
        let tokens = parse_args(command.trim_start_matches(SEPARATOR));

        let (route, depth) = router.find_full(&tokens[..]).ok_or(RouteNotFound)?;
        let handler = route.handler().ok_or(RouteNotFound)?;

        let mut args = Vec::with_capacity(tokens.len() - depth + 1);
        args.push(tokens[..depth].join(SEPARATOR));
        args.extend(tokens.into_inner().into_iter().skip(depth));

        Ok(Resolution {
            args: Args::new(args),
            route: route.info_arc(),
            handler: Arc::clone(handler),
        })
    }

    /// Resolves `message` and awaits its handler chain to completion.
    ///
    /// Returns [`RouteNotFound`] without replying when the message is not a
    /// command.
    pub async fn find_and_execute(
        &self,
        message: Message,
        session: BoxedSession,
    ) -> Result<(), RouteNotFound> {
        let span = debug_span!(
            "dispatch",
            message_id = %message.id,
            author = %message.author_id,
            channel = %message.channel_id,
        );

        async move {
            let resolution = match self.resolve(&message.content) {
                Ok(resolution) => resolution,
                Err(e) => {
                    trace!("{e}");
                    return Err(e);
                }
            };
            debug!(route = %resolution.route.path(), args = resolution.args.len(), "Dispatching command");

            let Resolution {
                args,
                route,
                handler,
            } = resolution;
            let ctx = Arc::new(CommandContext::new(args, message, session, route));
            handler(ctx).await;
            Ok(())
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.inner.prefix)
            .field("bot_id", &self.inner.bot_id)
            .field("router", &self.inner.router)
            .finish()
    }
}

impl Service<Incoming> for Dispatcher {
    type Response = ();
    type Error = RouteNotFound;
    type Future = BoxFuture<'static, Result<(), RouteNotFound>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Incoming) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { this.find_and_execute(req.message, req.session).await })
    }
}
