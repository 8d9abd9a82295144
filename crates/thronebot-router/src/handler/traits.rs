//! The handler trait and its function implementations.
//!
//! Any async closure or function whose arguments are extractors is a handler,
//! in the style of axum.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use crate::context::CommandContext;
use crate::extractor::FromContext;
use crate::handler::response::HandlerResponse;

/// Something a route can run.
///
/// Implemented for `FnOnce` async functions taking up to eight
/// [`FromContext`] arguments and returning a [`HandlerResponse`].
///
/// # Example
///
/// ```rust,ignore
/// // No return value
/// async fn ping(ctx: Arc<CommandContext>) {
///     ctx.reply("pong").await;
/// }
///
/// // Return String - automatically replied
/// async fn echo(Rest(text): Rest) -> String {
///     text
/// }
///
/// // Return Result - errors are logged
/// async fn load(args: Args) -> Result<String, std::io::Error> {
///     Ok(std::fs::read_to_string(args.get(1))?)
/// }
/// ```
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Extracts the arguments, runs the function and sends its response.
    async fn call(self, ctx: Arc<CommandContext>);
}

/// A type-erased handler that can be stored in the route tree.
///
/// Middleware wraps one `BoxedHandler` into another, so a composed chain is
/// itself a `BoxedHandler`.
pub type BoxedHandler = Arc<dyn Fn(Arc<CommandContext>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Erases a handler's argument types.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<CommandContext>) {
                $(
                    let $ty = match $ty::from_context(&ctx) {
                        Ok(v) => v,
                        Err(e) => {
                            debug!(route = %ctx.route().path(), "Handler skipped: {e}");
                            return;
                        }
                    };
                )*

                let res = (self)($($ty,)*).await;
                res.respond(&ctx).await;
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::error::{ExtractError, ExtractResult};
    use crate::extractor::Rest;
    use crate::testing::{MockSession, context_for};

    struct Denied;

    impl FromContext for Denied {
        fn from_context(_ctx: &Arc<CommandContext>) -> ExtractResult<Self> {
            Err(ExtractError::custom("denied"))
        }
    }

    #[tokio::test]
    async fn test_string_return_is_replied() {
        let session = Arc::new(MockSession::default());
        let handler = into_handler(|| async { "pong".to_string() });
        handler(context_for("u1", session.clone())).await;
        assert_eq!(session.texts(), vec!["pong".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_extraction_skips_handler() {
        let session = Arc::new(MockSession::default());
        let handler = into_handler(|_: Denied| async { "unreachable" });
        handler(context_for("u1", session.clone())).await;
        assert!(session.sent().is_empty());
    }

    #[tokio::test]
    async fn test_err_return_is_not_replied() {
        let session = Arc::new(MockSession::default());
        let handler = into_handler(|_: Args, _: Rest| async { Err::<String, _>("boom") });
        handler(context_for("u1", session.clone())).await;
        assert!(session.sent().is_empty());
    }
}
