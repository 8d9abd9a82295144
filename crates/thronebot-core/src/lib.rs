//! # Thronebot Core
//!
//! Transport-neutral contracts shared by the router, the runtime and every
//! chat transport.
//!
//! A transport (Discord gateway, IRC bridge, console, test double) supplies
//! two things to the rest of the workspace:
//!
//! - an inbound [`Message`] carrying the raw text plus opaque sender and
//!   channel identities;
//! - a [`Session`] handle the router hands to handlers so they can reply to the
//!   triggering channel and ask whether a caller holds elevated rights.
//!
//! ```text
//! ┌─────────────┐  Message   ┌────────────┐  Arc<CommandContext>  ┌─────────┐
//! │  Transport  │───────────▶│ Dispatcher │──────────────────────▶│ Handler │
//! └─────────────┘            └────────────┘                       └────┬────┘
//!        ▲                                                             │
//!        └──────────────── Session::send_text / send_embed ────────────┘
//! ```

pub mod error;
pub mod message;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use message::{Embed, EmbedField, Message};
pub use session::{BoxedSession, Session};
