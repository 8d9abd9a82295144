//! A stdin/stdout chat transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thronebot::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Prints replies to stdout and answers permission lookups from a flag.
#[derive(Debug)]
pub struct ConsoleSession {
    elevated: bool,
}

impl ConsoleSession {
    pub fn new(elevated: bool) -> Self {
        Self { elevated }
    }
}

#[async_trait]
impl Session for ConsoleSession {
    async fn send_text(&self, channel_id: &str, text: &str) -> SessionResult<()> {
        println!("[#{channel_id}] {text}");
        Ok(())
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> SessionResult<()> {
        println!("{}", render_embed(channel_id, embed));
        Ok(())
    }

    async fn is_elevated(&self, _user_id: &str, _channel_id: &str) -> SessionResult<bool> {
        Ok(self.elevated)
    }
}

fn render_embed(channel_id: &str, embed: &Embed) -> String {
    let mut out = format!("[#{channel_id}] ┌─");
    if let Some(title) = &embed.title {
        out.push_str(&format!(" {title}"));
    }
    if let Some(description) = &embed.description {
        out.push_str(&format!("\n│ {}", description.replace('\n', "\n│ ")));
    }
    for field in &embed.fields {
        out.push_str(&format!("\n│ {}: {}", field.name, field.value.replace('\n', "\n│   ")));
    }
    if let Some(footer) = &embed.footer {
        out.push_str(&format!("\n│ {footer}"));
    }
    out.push_str("\n└─");
    out
}

/// Reads stdin line by line and forwards every line as a message from
/// `author_id` in `channel_id`.
///
/// The returned receiver closes at end of input.
pub fn spawn_stdin(
    session: Arc<ConsoleSession>,
    author_id: String,
    channel_id: String,
) -> mpsc::Receiver<Incoming> {
    let (tx, rx) = mpsc::channel(16);
    let next_id = AtomicU64::new(1);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read stdin: {e}");
                    break;
                }
            };

            let id = next_id.fetch_add(1, Ordering::Relaxed).to_string();
            let message = Message::new(id, author_id.as_str(), channel_id.as_str(), line);
            if tx.send(Incoming::new(message, session.clone())).await.is_err() {
                debug!("Runtime stopped accepting messages");
                break;
            }
        }
    });

    rx
}
