//! Permission gate for administrative commands.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use tower_layer::Layer;
use tracing::{debug, warn};

use crate::context::CommandContext;
use crate::handler::BoxedHandler;

/// Middleware that only lets elevated users through.
///
/// Bot owners always pass without a permission lookup. Everyone else is
/// checked with [`Session::is_elevated`](thronebot_core::Session::is_elevated)
/// for the channel the command was sent in:
///
/// - elevated users reach the wrapped handler;
/// - other users are ignored silently;
/// - if the lookup fails the caller is told so and the handler does not run.
///
/// ```rust,ignore
/// router.namespace("weekly").on("ban", ban_handler).layer(ElevatedUser::new(["1234"]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElevatedUser {
    owners: Arc<HashSet<String>>,
}

impl ElevatedUser {
    pub fn new<I, S>(owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owners: Arc::new(owners.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owners.contains(user_id)
    }

    async fn check(&self, ctx: &CommandContext) -> bool {
        let (author, channel) = (ctx.author_id(), ctx.channel_id());
        if self.is_owner(author) {
            return true;
        }

        match ctx.session().is_elevated(author, channel).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(author, route = %ctx.route().path(), "Elevated command denied");
                false
            }
            Err(e) => {
                warn!(author, channel, "Failed to retrieve channel permissions: {e}");
                ctx.reply(format!("Could not retrieve channel permissions: {e}"))
                    .await;
                false
            }
        }
    }
}

impl Layer<BoxedHandler> for ElevatedUser {
    type Service = BoxedHandler;

    fn layer(&self, inner: BoxedHandler) -> Self::Service {
        let gate = self.clone();
        Arc::new(move |ctx: Arc<CommandContext>| -> BoxFuture<'static, ()> {
            let gate = gate.clone();
            let inner = Arc::clone(&inner);
            Box::pin(async move {
                if gate.check(&ctx).await {
                    inner(ctx).await;
                }
            })
        })
    }
}
