//! Middleware: wrappers around [`BoxedHandler`]s.
//!
//! A middleware is any tower [`Layer`] that turns a `BoxedHandler` into
//! another `BoxedHandler`. It may run code before and after the inner
//! handler, or skip it entirely.
//!
//! ```rust,ignore
//! router.namespace("weekly").layer(from_fn(|ctx, next| async move {
//!     if ctx.args().len() < 2 {
//!         ctx.reply("missing arguments").await;
//!         return;
//!     }
//!     next.run(ctx).await;
//! }));
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use tower_layer::Layer;

use crate::context::CommandContext;
use crate::handler::BoxedHandler;

pub use tower_layer::layer_fn;

/// A layer that can be attached to a route.
pub trait Middleware: Layer<BoxedHandler, Service = BoxedHandler> + Send + Sync + 'static {}

impl<L> Middleware for L where L: Layer<BoxedHandler, Service = BoxedHandler> + Send + Sync + 'static {}

/// A shared, type-erased middleware as stored on route nodes.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Applies `chain` around `handler`. The first element becomes the outermost
/// wrapper.
pub(crate) fn compose(handler: BoxedHandler, chain: &[BoxedMiddleware]) -> BoxedHandler {
    chain
        .iter()
        .rev()
        .fold(handler, |inner, middleware| middleware.layer(inner))
}

/// The rest of the chain, handed to a [`from_fn`] middleware.
#[derive(Clone)]
pub struct Next(BoxedHandler);

impl Next {
    /// Invokes the wrapped handler.
    pub fn run(self, ctx: Arc<CommandContext>) -> BoxFuture<'static, ()> {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Next")
    }
}

/// Creates a middleware from an async closure taking the context and the
/// rest of the chain.
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Arc<CommandContext>, Next) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FromFn { f }
}

/// Middleware returned by [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

impl<F, Fut> Layer<BoxedHandler> for FromFn<F>
where
    F: Fn(Arc<CommandContext>, Next) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    type Service = BoxedHandler;

    fn layer(&self, inner: BoxedHandler) -> Self::Service {
        let f = self.f.clone();
        Arc::new(move |ctx: Arc<CommandContext>| -> BoxFuture<'static, ()> {
            Box::pin(f(ctx, Next(Arc::clone(&inner))))
        })
    }
}
