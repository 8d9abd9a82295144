//! Inbound messages and outbound rich content.

use serde::{Deserialize, Serialize};

// ============================================================================
// Message
// ============================================================================

/// An inbound chat message as seen by the router.
///
/// Identities are opaque strings: the router only compares them for equality
/// and passes them back to the [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Transport-assigned message identifier.
    pub id: String,
    /// The sender's identity.
    pub author_id: String,
    /// The channel the message was posted in; replies go here.
    pub channel_id: String,
    /// Raw message text.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            channel_id: channel_id.into(),
            content: content.into(),
        }
    }

    /// Returns the canonical mention form for the author.
    pub fn author_mention(&self) -> String {
        format!("<@{}>", self.author_id)
    }
}

// ============================================================================
// Embed
// ============================================================================

/// A single named field of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// A structured rich-content block.
///
/// Transports render it however they can; a plain-text transport may simply
/// print the description.
///
/// # Example
///
/// ```rust
/// use thronebot_core::Embed;
///
/// let embed = Embed::new()
///     .title("Weekly")
///     .description("Currently banned items")
///     .field("Crowns", "crown of blood", false);
/// assert_eq!(embed.fields.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an embed that only carries a description.
    pub fn quick(description: impl Into<String>) -> Self {
        Self::new().description(description)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }
}
