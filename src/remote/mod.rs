//! Data model for the remote chat service.
//!
//! These are the entities the gateway translates into IRC: guilds (the
//! remote service's network scope), channels, members, and messages with
//! their embeds and attachments. All identifiers are snowflakes.

pub mod memory;
pub mod session;

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};

pub use session::{Connector, Session, SessionError, SessionMap, SessionRef, Subscription};

/// A 64-bit identifier used by the remote service for guilds, channels,
/// messages and users. Snowflakes are time-ordered, so comparing two of
/// them orders the objects they identify.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Snowflake(pub u64);

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Snowflake)
    }
}

/// The authenticated identity behind a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// The identity's snowflake.
    pub id: Snowflake,
    /// Account username.
    pub username: String,
    /// Four-digit discriminator distinguishing identical usernames.
    pub discriminator: String,
}

/// A guild: the remote service's grouping of channels and members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guild {
    /// The guild's snowflake.
    pub id: Snowflake,
    /// Display name.
    pub name: String,
}

/// A text channel within a guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    /// The channel's snowflake.
    pub id: Snowflake,
    /// Display name (not IRC-legal; see `ircord_proto::sanitize`).
    pub name: String,
    /// Channel topic, possibly empty.
    pub topic: String,
}

/// Message kinds. Only default messages are rendered; joins, pins and
/// other system messages pass through unrendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MessageKind {
    /// An ordinary user message.
    #[default]
    Default,
    /// Any system message (member join, pin notice, ...).
    System,
}

/// One field of an embed.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EmbedField {
    /// Field name, rendered emphasized.
    pub name: String,
    /// Field value (markdown source).
    pub value: String,
    /// Inline fields continue the current visual line.
    pub inline: bool,
}

/// A rich embed attached to a message.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Embed {
    /// Embed title, possibly empty.
    pub title: String,
    /// URL the title links to, possibly empty.
    pub url: String,
    /// Description body (markdown source), possibly empty.
    pub description: String,
    /// Embed fields, in order.
    pub fields: Vec<EmbedField>,
    /// Accent color as 0xRRGGBB.
    pub color: u32,
}

/// A file attached to a message.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Attachment {
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Pixel width, 0 when unknown.
    pub width: u32,
    /// Pixel height, 0 when unknown.
    pub height: u32,
    /// Direct download URL.
    pub url: String,
    /// Media-proxy URL, usually the direct URL with the canonical CDN
    /// host rewritten to the media host.
    pub proxy_url: String,
}

/// Canonical CDN host of attachment URLs.
pub const CDN_HOST: &str = "cdn.discordapp.com";
/// Alternate media host the proxy URL normally points at.
pub const MEDIA_HOST: &str = "media.discordapp.net";

/// A message received from (or echoed by) the remote service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteMessage {
    /// The message's snowflake.
    pub id: Snowflake,
    /// Channel the message was posted in.
    pub channel_id: Snowflake,
    /// The author's identity.
    pub author: Identity,
    /// Raw markdown source of the body.
    pub content: String,
    /// Set when the message has been edited.
    pub edited_timestamp: Option<DateTime<Utc>>,
    /// Message kind; only [`MessageKind::Default`] renders.
    pub kind: MessageKind,
    /// Rich embeds, in order.
    pub embeds: Vec<Embed>,
    /// File attachments, in order.
    pub attachments: Vec<Attachment>,
}

impl RemoteMessage {
    /// A plain default-kind message with no embeds or attachments.
    pub fn plain(
        id: Snowflake,
        channel_id: Snowflake,
        author: Identity,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            channel_id,
            author,
            content: content.into(),
            edited_timestamp: None,
            kind: MessageKind::Default,
            embeds: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// An event delivered on a session's feed.
#[derive(Clone, Debug)]
pub enum Event {
    /// The session finished connecting to the remote service.
    Ready(Identity),
    /// A message was created in some channel the identity can see.
    MessageCreate(RemoteMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_parse_and_display() {
        let id: Snowflake = "123456789".parse().unwrap();
        assert_eq!(id, Snowflake(123456789));
        assert_eq!(id.to_string(), "123456789");
    }

    #[test]
    fn test_snowflake_rejects_garbage() {
        assert!("not-a-number".parse::<Snowflake>().is_err());
        assert!("".parse::<Snowflake>().is_err());
    }

    #[test]
    fn test_snowflake_ordering() {
        assert!(Snowflake(1) < Snowflake(2));
    }
}
