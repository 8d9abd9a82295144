//! # Thronebot Router
//!
//! Text command routing for chat bots.
//!
//! This crate provides:
//! - [`Route`]: a tree of command words with handlers and namespaces
//! - Axum-style [`Handler`]s with [`FromContext`] parameter extraction
//! - Middleware as tower [`Layer`](tower_layer::Layer)s over [`BoxedHandler`]
//! - The [`Dispatcher`] that turns inbound messages into handler invocations
//! - [`ElevatedUser`], a permission gate for administrative commands
//!
//! ```rust,ignore
//! use thronebot_router::*;
//!
//! let mut router = Route::new();
//! router.on("ping", || async { "pong" }).desc("Replies with pong");
//! router.namespace("weekly").group(|r| {
//!     r.on("suggest", suggest_handler);
//!     r.on("ban", ban_handler).layer(ElevatedUser::new(owners));
//! });
//!
//! let dispatcher = Dispatcher::new(router, "thronebot", bot_id);
//! dispatcher.find_and_execute(message, session).await?;
//! ```

pub mod args;
pub mod context;
pub mod dispatcher;
pub mod elevated;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod middleware;
pub mod route;

#[cfg(test)]
mod testing;

pub use args::{Args, SEPARATOR, parse_args};
pub use context::{CommandContext, RouteInfo};
pub use dispatcher::{Dispatcher, Incoming, Resolution, mention, nick_mention};
pub use elevated::ElevatedUser;
pub use error::{ExtractError, ExtractResult, RouteNotFound};
pub use extractor::{FromContext, Rest};
pub use handler::{BoxedHandler, Handler, HandlerResponse, into_handler};
pub use middleware::{BoxedMiddleware, FromFn, Middleware, Next, from_fn, layer_fn};
pub use route::{Endpoint, IntoEndpoint, Route};
