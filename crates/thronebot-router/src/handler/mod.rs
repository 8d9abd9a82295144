//! Handlers for the router.
//!
//! - **Handler** ([`traits`]) – the [`Handler`] trait, implemented for async
//!   functions whose parameters implement [`FromContext`](crate::FromContext),
//!   and the type-erased [`BoxedHandler`] stored in the route tree
//! - **Response** ([`response`]) – [`HandlerResponse`], turning handler return
//!   values into replies
//!
//! ```rust,ignore
//! use thronebot_router::*;
//!
//! // No parameters, no reply
//! async fn noop() {}
//!
//! // Extract the arguments, reply with the returned string
//! async fn echo(Rest(text): Rest) -> String {
//!     text
//! }
//!
//! // Full context access
//! async fn whoami(ctx: Arc<CommandContext>) {
//!     ctx.reply(ctx.message().author_mention()).await;
//! }
//! ```

pub mod response;
pub mod traits;

pub use response::HandlerResponse;
pub use traits::{BoxedHandler, Handler, into_handler};
