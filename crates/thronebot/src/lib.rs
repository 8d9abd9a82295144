//! # Thronebot
//!
//! A text-command router for chat bots.
//!
//! ## Overview
//!
//! Messages arrive from a chat transport as raw text. Thronebot decides
//! whether a message is addressed to the bot (an explicit prefix or a mention
//! of the bot), splits the remainder into words, walks a tree of registered
//! command words and runs the handler at the deepest match.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────────────┐
//! │   Runtime   │────▶│ Dispatcher │────▶│ middleware ─▶ middleware ─▶  │──▶ Session replies
//! │  (Source)   │     │ (Route)    │     │ handler (own task, context)  │
//! └─────────────┘     └────────────┘     └──────────────────────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, pulls messages
//! - **Dispatcher**: prefix detection, tokenizing, route lookup
//! - **Route**: the command tree with namespaces, descriptions and defaults
//! - **Middleware**: tower layers that wrap handlers and may short-circuit
//! - **Handlers**: user-defined async functions (Axum-style)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use thronebot::prelude::*;
//!
//! async fn suggest(ctx: Arc<CommandContext>, Rest(title): Rest) -> String {
//!     format!("{} suggested {title}", ctx.message().author_mention())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ThronebotRuntime::new();
//!
//!     let mut router = Route::new();
//!     router.on("ping", || async { "pong" }).desc("Replies with pong");
//!     router.namespace("weekly").group(|weekly| {
//!         weekly.on("suggest", suggest);
//!     });
//!
//!     runtime.run(router, transport_receiver).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `thronebot.toml` files (default)
//! - `yaml-config`: load `thronebot.yaml` files
//! - `json-log`: structured JSON log output

pub use thronebot_core as core;
pub use thronebot_router as router;
pub use thronebot_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use thronebot::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use thronebot_runtime::{MessageSource, ThronebotConfig, ThronebotRuntime};

    // Routing
    pub use thronebot_router::{Dispatcher, Endpoint, Incoming, Route};

    // Handlers and extractors
    pub use thronebot_router::{
        Args, CommandContext, FromContext, Handler, HandlerResponse, Rest, RouteInfo,
    };

    // Middleware
    pub use thronebot_router::{ElevatedUser, Middleware, Next, from_fn, layer_fn};

    // Transport contracts
    pub use thronebot_core::{BoxedSession, Embed, Message, Session, SessionError, SessionResult};
}
