//! Runtime orchestration: configuration, logging and the message loop.
//!
//! ```rust,ignore
//! use thronebot_runtime::ThronebotRuntime;
//!
//! let runtime = ThronebotRuntime::builder()
//!     .config_file("config/thronebot.toml")
//!     .build()?;
//!
//! let mut router = Route::new();
//! router.on("ping", || async { "pong" });
//! router.namespace("weekly").layer(runtime.elevated()).on("ban", ban);
//!
//! // Runs until the source is exhausted or Ctrl+C is pressed
//! runtime.run(router, source).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

use thronebot_router::{Dispatcher, ElevatedUser, Route, RouteNotFound};

use crate::config::{ConfigLoader, ConfigResult, ThronebotConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::source::MessageSource;

/// Counters of one [`ThronebotRuntime::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Messages pulled from the source.
    pub received: usize,
    /// Messages that resolved to a command and ran its handler chain.
    pub executed: usize,
    /// Messages that were not commands.
    pub not_found: usize,
    /// Dispatch tasks that panicked.
    pub panicked: usize,
}

impl RuntimeStats {
    fn record(&mut self, joined: Result<Result<(), RouteNotFound>, JoinError>) {
        match joined {
            Ok(Ok(())) => self.executed += 1,
            Ok(Err(RouteNotFound)) => self.not_found += 1,
            Err(e) if e.is_panic() => {
                error!("Dispatch task panicked: {e}");
                self.panicked += 1;
            }
            Err(e) => warn!("Dispatch task cancelled: {e}"),
        }
    }
}

/// Clears the running flag when a run ends, including when its future is
/// dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The thronebot runtime.
///
/// Owns the loaded configuration and drives the message loop: every inbound
/// message is dispatched on its own tokio task against the frozen route tree.
pub struct ThronebotRuntime {
    config: ThronebotConfig,
    shutdown: CancellationToken,
    running: AtomicBool,
}

impl ThronebotRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory, falling back to defaults.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                ThronebotConfig::default()
            });

        Self::from_config(&config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    pub fn from_config(config: &ThronebotConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ThronebotConfig {
        &self.config
    }

    /// The free-form `[settings]` table.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.config.settings
    }

    /// An elevated-user gate for the configured owners.
    pub fn elevated(&self) -> ElevatedUser {
        ElevatedUser::new(self.config.router.owners.iter().cloned())
    }

    /// Freezes `router` with the configured prefix and bot id.
    pub fn dispatcher(&self, router: Route) -> Dispatcher {
        Dispatcher::new(
            router,
            self.config.router.prefix.clone(),
            self.config.router.bot_id.clone(),
        )
    }

    /// A token that stops the message loop when cancelled.
    ///
    /// Cancellation is permanent: a later `run` returns immediately.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs the message loop until the source is exhausted or a shutdown
    /// signal (Ctrl+C, SIGTERM) is received.
    pub async fn run<S: MessageSource>(&self, router: Route, source: S) -> RuntimeResult<RuntimeStats> {
        info!("Thronebot runtime is now running. Press Ctrl+C to stop.");
        self.run_until(router, source, wait_for_shutdown()).await
    }

    /// Runs the message loop until the source is exhausted, `shutdown`
    /// completes or the shutdown token is cancelled.
    ///
    /// In-flight dispatches are awaited before returning. Dropping the
    /// returned future instead aborts them and releases the runtime for
    /// another run.
    pub async fn run_until<S, F>(
        &self,
        router: Route,
        mut source: S,
        shutdown: F,
    ) -> RuntimeResult<RuntimeStats>
    where
        S: MessageSource,
        F: Future<Output = ()>,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        let dispatcher = self.dispatcher(router);
        info!(
            prefix = %dispatcher.prefix(),
            bot_id = %dispatcher.bot_id(),
            commands = dispatcher.router().commands().len(),
            "Accepting messages"
        );

        let mut tasks = JoinSet::new();
        let mut stats = RuntimeStats::default();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => stats.record(joined),
                next = source.next_message() => match next {
                    Ok(Some(incoming)) => {
                        stats.received += 1;
                        tasks.spawn(dispatcher.clone().oneshot(incoming));
                    }
                    Ok(None) => {
                        info!("Message source exhausted");
                        break Ok(());
                    }
                    Err(e) => {
                        error!("{e}");
                        break Err(e);
                    }
                },
            }
        };

        debug!(in_flight = tasks.len(), "Waiting for in-flight dispatches");
        while let Some(joined) = tasks.join_next().await {
            stats.record(joined);
        }

        info!(
            received = stats.received,
            executed = stats.executed,
            not_found = stats.not_found,
            "Runtime stopped"
        );

        result.map(|()| stats)
    }
}

impl Default for ThronebotRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ThronebotRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThronebotRuntime")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {e}");
                ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`ThronebotRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ThronebotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> ConfigResult<ThronebotRuntime> {
        let config = self.config_loader.load()?;
        Ok(ThronebotRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use thronebot_core::{Embed, Message, Session, SessionResult};
    use thronebot_router::{Args, Incoming};

    use super::*;
    use crate::source::StreamSource;

    #[derive(Default)]
    struct Recorder {
        texts: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn texts(&self) -> Vec<String> {
            let mut texts = self.texts.lock().clone();
            texts.sort();
            texts
        }
    }

    #[async_trait]
    impl Session for Recorder {
        async fn send_text(&self, _channel_id: &str, text: &str) -> SessionResult<()> {
            self.texts.lock().push(text.to_string());
            Ok(())
        }

        async fn send_embed(&self, _channel_id: &str, _embed: &Embed) -> SessionResult<()> {
            Ok(())
        }

        async fn is_elevated(&self, _user_id: &str, _channel_id: &str) -> SessionResult<bool> {
            Ok(false)
        }
    }

    fn runtime() -> ThronebotRuntime {
        let mut config = ThronebotConfig::default();
        config.router.prefix = "!".to_string();
        config.router.owners = vec!["owner".to_string()];
        ThronebotRuntime::from_config(&config)
    }

    fn router() -> Route {
        let mut router = Route::new();
        router.on("echo", |args: Args| async move { args.after(1) });
        router.on("slow", || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            "slow done"
        });
        router
    }

    fn incoming(session: &Arc<Recorder>, content: &str) -> Incoming {
        Incoming::new(Message::new("m", "u1", "c1", content), session.clone())
    }

    #[tokio::test]
    async fn test_run_until_source_exhausted() {
        let rt = runtime();
        let session = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(8);
        for content in ["!echo hi", "hello", "!slow", "!unknown"] {
            tx.send(incoming(&session, content)).await.unwrap();
        }
        drop(tx);

        let stats = rt
            .run_until(router(), rx, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats, RuntimeStats {
            received: 4,
            executed: 2,
            not_found: 2,
            panicked: 0,
        });
        // In-flight dispatches finish before run returns.
        assert_eq!(session.texts(), vec!["hi", "slow done"]);
        assert!(!rt.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_loop() {
        let rt = runtime();
        let (_tx, rx) = mpsc::channel::<Incoming>(1);
        let token = rt.shutdown_token();
        tokio::spawn(async move { token.cancel() });

        let stats = rt
            .run_until(router(), rx, std::future::pending())
            .await
            .unwrap();
        assert_eq!(stats.received, 0);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let rt = runtime();
        let (_tx1, rx1) = mpsc::channel::<Incoming>(1);
        let (_tx2, rx2) = mpsc::channel::<Incoming>(1);

        let first = rt.run_until(router(), rx1, std::future::pending());
        let second = async {
            let result = rt.run_until(router(), rx2, std::future::pending()).await;
            rt.shutdown();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(RuntimeError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn test_stream_source() {
        let rt = runtime();
        let session = Arc::new(Recorder::default());
        let messages = vec![
            incoming(&session, "!echo from a stream"),
            incoming(&session, "!nope"),
        ];

        let stats = rt
            .run_until(
                router(),
                StreamSource(futures::stream::iter(messages)),
                std::future::pending(),
            )
            .await
            .unwrap();

        assert_eq!(stats, RuntimeStats {
            received: 2,
            executed: 1,
            not_found: 1,
            panicked: 0,
        });
        assert_eq!(session.texts(), vec!["from a stream"]);
    }

    #[tokio::test]
    async fn test_unbounded_channel_source() {
        let rt = runtime();
        let session = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::unbounded_channel();
        for content in ["!echo one", "!slow", "plain chat"] {
            tx.send(incoming(&session, content)).unwrap();
        }
        drop(tx);

        let stats = rt
            .run_until(router(), rx, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats, RuntimeStats {
            received: 3,
            executed: 2,
            not_found: 1,
            panicked: 0,
        });
        assert_eq!(session.texts(), vec!["one", "slow done"]);
    }

    #[tokio::test]
    async fn test_dropped_run_releases_runtime() {
        let rt = runtime();
        let session = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(1);
        tx.send(incoming(&session, "!slow")).await.unwrap();

        let run = rt.run_until(router(), rx, std::future::pending());
        let elapsed = tokio::time::timeout(Duration::from_millis(5), run).await;
        assert!(elapsed.is_err());
        assert!(!rt.is_running());

        // The aborted dispatch never replies.
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(session.texts().is_empty());

        drop(tx);
        let (_tx, rx) = mpsc::channel::<Incoming>(1);
        let token = rt.shutdown_token();
        tokio::spawn(async move { token.cancel() });
        let stats = rt
            .run_until(router(), rx, std::future::pending())
            .await
            .unwrap();
        assert_eq!(stats.received, 0);
    }

    #[tokio::test]
    async fn test_source_error_ends_run() {
        struct Failing;

        #[async_trait]
        impl MessageSource for Failing {
            async fn next_message(&mut self) -> RuntimeResult<Option<Incoming>> {
                Err(RuntimeError::source_failed("connection reset"))
            }
        }

        let rt = runtime();
        let result = rt.run_until(router(), Failing, std::future::pending()).await;
        assert!(matches!(result, Err(RuntimeError::Source(_))));
        assert!(!rt.is_running());
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_builder_loads_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("thronebot.toml"),
            "[router]\nprefix = \"tb\"\nowners = [\"9\"]\n",
        )
        .unwrap();

        let rt = ThronebotRuntime::builder()
            .search_path(dir.path())
            .without_env()
            .build()
            .unwrap();
        assert_eq!(rt.config().router.prefix, "tb");
        assert!(rt.elevated().is_owner("9"));
    }

    #[test]
    fn test_configured_collaborators() {
        let rt = runtime();
        assert!(rt.elevated().is_owner("owner"));
        let dispatcher = rt.dispatcher(router());
        assert_eq!(dispatcher.prefix(), "!");
        assert!(dispatcher.resolve("!echo a").is_ok());
    }
}
