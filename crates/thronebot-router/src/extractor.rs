//! Handler parameter extraction.
//!
//! Any type implementing [`FromContext`] can appear as a handler parameter:
//!
//! ```rust,ignore
//! async fn ban(args: Args, msg: Message, session: BoxedSession) -> String {
//!     format!("{} banned {}", msg.author_id, args.after(2))
//! }
//! ```

use std::sync::Arc;

use thronebot_core::{BoxedSession, Message};

use crate::args::Args;
use crate::context::{CommandContext, RouteInfo};
use crate::error::ExtractResult;

/// A trait for types that can be extracted from a [`CommandContext`].
///
/// # Error Handling
///
/// If extraction fails the handler is skipped for this dispatch.
pub trait FromContext: Sized {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self>;
}

/// The whole context, for handlers that reply or use the scratch map.
impl FromContext for Arc<CommandContext> {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

impl FromContext for Args {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(ctx.args().clone())
    }
}

impl FromContext for Message {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(ctx.message().clone())
    }
}

impl FromContext for BoxedSession {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx.session()))
    }
}

impl FromContext for RouteInfo {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(ctx.route().clone())
    }
}

impl FromContext for Arc<RouteInfo> {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(ctx.route_arc())
    }
}

/// Everything after the command path, joined with single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rest(pub String);

impl std::ops::Deref for Rest {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromContext for Rest {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(Rest(ctx.args().after(1)))
    }
}

/// Optional parameters never fail; a failed inner extraction becomes `None`.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;

    fn ctx() -> Arc<CommandContext> {
        Arc::new(CommandContext::new(
            ["weekly ban", "add", "crown", "crown", "of", "blood"]
                .into_iter()
                .collect(),
            Message::new("m1", "u1", "c1", "!weekly ban add crown crown of blood"),
            Arc::new(MockSession::default()),
            Arc::new(RouteInfo::default()),
        ))
    }

    #[test]
    fn test_rest_skips_command_path() {
        let Rest(rest) = Rest::from_context(&ctx()).unwrap();
        assert_eq!(rest, "add crown crown of blood");
    }

    #[test]
    fn test_message_and_args_are_cloned() {
        let ctx = ctx();
        assert_eq!(Message::from_context(&ctx).unwrap().author_id, "u1");
        assert_eq!(Args::from_context(&ctx).unwrap().get(0), "weekly ban");
    }
}
