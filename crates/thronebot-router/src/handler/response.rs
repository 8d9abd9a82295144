//! Handler return values.

use async_trait::async_trait;
use tracing::error;

use thronebot_core::Embed;

use crate::context::CommandContext;

/// What a handler's return value does once the handler finishes.
#[async_trait]
pub trait HandlerResponse: Send + 'static {
    /// Sends the value to the channel, or does nothing.
    async fn respond(self, ctx: &CommandContext);
}

#[async_trait]
impl HandlerResponse for () {
    async fn respond(self, _ctx: &CommandContext) {}
}

/// Replies with the text.
#[async_trait]
impl HandlerResponse for String {
    async fn respond(self, ctx: &CommandContext) {
        ctx.reply(&self).await;
    }
}

#[async_trait]
impl HandlerResponse for &'static str {
    async fn respond(self, ctx: &CommandContext) {
        ctx.reply(self).await;
    }
}

#[async_trait]
impl HandlerResponse for Embed {
    async fn respond(self, ctx: &CommandContext) {
        ctx.reply_embed(&self).await;
    }
}

/// `None` stays silent.
#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn respond(self, ctx: &CommandContext) {
        if let Some(value) = self {
            value.respond(ctx).await;
        }
    }
}

/// An `Err` is logged against the route and never shown to the user.
#[async_trait]
impl<T: HandlerResponse, E: std::fmt::Display + Send + 'static> HandlerResponse for Result<T, E> {
    async fn respond(self, ctx: &CommandContext) {
        match self {
            Ok(value) => value.respond(ctx).await,
            Err(e) => {
                error!(route = %ctx.route().path(), "Handler error: {e}");
            }
        }
    }
}
