//! Console Bot
//!
//! The thronebot command set running over stdin/stdout. Every line typed is
//! delivered as a message from `--user` in `--channel`; replies are printed.
//!
//! # Commands
//!
//! ```text
//! thronebot ping
//! thronebot help
//! thronebot config
//! thronebot config set staff moderators
//! thronebot weekly suggest steroids/b/grenade launcher/crown of death
//! thronebot weekly banned
//! thronebot weekly ban add crown crown of blood      (elevated)
//! <@BOT_ID>                                           (greeting, needs --bot-id)
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --user 1234 --elevated
//! ```

mod console;
mod settings;
mod weekly;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use clap::Parser;
use thronebot::prelude::*;
use thronebot::runtime::ConfigLoader;
use tracing::info;

use crate::console::ConsoleSession;
use crate::settings::Settings;
use crate::weekly::WeeklyStore;

#[derive(Parser, Debug)]
#[command(name = "console-bot", about = "Run the thronebot commands in a terminal")]
struct Cli {
    /// Configuration file; defaults to ./thronebot.toml when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Identity of the user typing.
    #[arg(short, long, default_value = "console")]
    user: String,

    /// Channel the messages are posted in.
    #[arg(long, default_value = "general")]
    channel: String,

    /// Grant the user elevated rights in the channel.
    #[arg(short, long)]
    elevated: bool,

    /// Bot identity for mention prefixes; overrides `router.bot_id`.
    #[arg(long)]
    bot_id: Option<String>,
}

/// Builds the command tree.
fn router(config: &ThronebotConfig, elevated: ElevatedUser) -> Route {
    let settings = Arc::new(Settings::new(&config.settings));
    let store = Arc::new(WeeklyStore::new());
    let help = Arc::new(OnceLock::<String>::new());

    let mut router = Route::new();
    router.default_handler(|msg: Message| async move {
        format!("Hello {}! Try `help` to see what I can do.", msg.author_mention())
    });

    router.on("ping", || async { "Pong!" }).desc("Check that the bot is alive.");

    let h = help.clone();
    router
        .on("help", move || {
            let help = h.clone();
            async move { help.get().cloned() }
        })
        .desc("List the available commands.");

    settings::register(&mut router, settings);
    weekly::register(router.namespace("weekly"), store, elevated);

    let prefix = &config.router.prefix;
    let listing = router
        .commands()
        .into_iter()
        .map(|(path, desc)| match desc {
            Some(desc) => format!("  `{prefix} {path}` - {desc}"),
            None => format!("  `{prefix} {path}`"),
        })
        .collect::<Vec<_>>()
        .join("\n");
    let _ = help.set(format!("Available commands:\n{listing}"));

    router
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if let Some(bot_id) = cli.bot_id {
        config.router.bot_id = bot_id;
    }

    let runtime = ThronebotRuntime::from_config(&config);
    let router = router(runtime.config(), runtime.elevated());

    let session = Arc::new(ConsoleSession::new(cli.elevated));
    info!(
        user = %cli.user,
        channel = %cli.channel,
        elevated = cli.elevated,
        "Type `{} help` to list commands, Ctrl+D to quit",
        config.router.prefix
    );
    let source = console::spawn_stdin(session, cli.user, cli.channel);

    let stats = runtime.run(router, source).await?;
    info!(
        received = stats.received,
        executed = stats.executed,
        "Console bot stopped"
    );

    Ok(())
}
