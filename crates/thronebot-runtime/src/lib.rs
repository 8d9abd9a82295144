//! Thronebot Runtime - Orchestration layer for thronebot.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `ThronebotConfig`)
//! - Logging configuration (`LoggingBuilder`, `SpanEvents`)
//! - The message loop (`ThronebotRuntime`) over any [`MessageSource`]
//!
//! ```ignore
//! use thronebot_runtime::ThronebotRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Loads thronebot.toml from the current directory and sets up logging
//!     let runtime = ThronebotRuntime::new();
//!
//!     let mut router = Route::new();
//!     router.on("ping", || async { "pong" });
//!
//!     // The transport feeds an mpsc channel of `Incoming` messages
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     spawn_transport(tx);
//!
//!     // Run until Ctrl+C
//!     runtime.run(router, rx).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Sources are merged from lowest to highest priority: built-in defaults,
//! `thronebot.{profile}.toml`, `thronebot.toml`, then `THRONEBOT_*`
//! environment variables (`THRONEBOT_ROUTER__PREFIX=!`).

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod source;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, Profile, RouterConfig,
    ThronebotConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RuntimeBuilder, RuntimeStats, ThronebotRuntime};
pub use source::{MessageSource, StreamSource};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
