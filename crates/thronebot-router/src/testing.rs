//! Test doubles shared by the router's unit tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use thronebot_core::{Embed, Message, Session, SessionError, SessionResult};

use crate::args::Args;
use crate::context::{CommandContext, RouteInfo};

/// Something a [`MockSession`] was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Text { channel: String, text: String },
    Embed { channel: String, embed: Embed },
}

/// A session that records replies and answers permission lookups from a
/// fixed set of elevated users.
#[derive(Default)]
pub(crate) struct MockSession {
    sent: Mutex<Vec<Sent>>,
    elevated: HashSet<String>,
    fail_lookups: bool,
    fail_sends: bool,
    lookups: AtomicUsize,
}

impl MockSession {
    pub(crate) fn with_elevated(mut self, user_id: &str) -> Self {
        self.elevated.insert(user_id.to_string());
        self
    }

    pub(crate) fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub(crate) fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text.clone()),
                Sent::Embed { .. } => None,
            })
            .collect()
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send_text(&self, channel_id: &str, text: &str) -> SessionResult<()> {
        if self.fail_sends {
            return Err(SessionError::NotConnected);
        }
        self.sent.lock().push(Sent::Text {
            channel: channel_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> SessionResult<()> {
        if self.fail_sends {
            return Err(SessionError::NotConnected);
        }
        self.sent.lock().push(Sent::Embed {
            channel: channel_id.to_string(),
            embed: embed.clone(),
        });
        Ok(())
    }

    async fn is_elevated(&self, user_id: &str, _channel_id: &str) -> SessionResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(SessionError::permission_lookup(user_id, "unknown member"));
        }
        Ok(self.elevated.contains(user_id))
    }
}

/// Builds a context for `author` in channel `c1` backed by `session`.
pub(crate) fn context_for(author: &str, session: Arc<MockSession>) -> Arc<CommandContext> {
    Arc::new(CommandContext::new(
        Args::default(),
        Message::new("m1", author, "c1", ""),
        session,
        Arc::new(RouteInfo::default()),
    ))
}
