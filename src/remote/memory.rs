//! In-memory connector backend.
//!
//! Serves a single fixed guild from process memory. Used by the binary
//! as a development backend and by the test suites in place of a live
//! remote connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::session::{Connector, SessionError};
use super::{Channel, Event, Guild, Identity, RemoteMessage, Snowflake};

/// Snowflake of the built-in guild.
pub const GUILD_ID: Snowflake = Snowflake(1);

/// A connector that serves a fixed single-guild world from memory.
///
/// The authenticated identity's username is derived from the token, so
/// distinct tokens look like distinct users. Messages sent through the
/// connector come back on the event feed as [`Event::MessageCreate`],
/// including to the sender.
pub struct MemoryConnector {
    identity: Identity,
    guild: Guild,
    channels: Vec<Channel>,
    next_message_id: AtomicU64,
    events: broadcast::Sender<Event>,
}

impl MemoryConnector {
    /// Build a connector for `token`, boxed for use behind a session.
    pub fn shared(token: &str) -> Arc<dyn Connector> {
        Arc::new(Self::new(token))
    }

    fn new(token: &str) -> Self {
        // Stable per-token ids so two sessions with the same token agree.
        let mut hash: u64 = 0xcbf29ce484222325;
        for b in token.bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        let (events, _) = broadcast::channel(256);
        Self {
            identity: Identity {
                id: Snowflake(hash | 1),
                username: format!("user{:04}", hash % 10000),
                discriminator: format!("{:04}", hash / 7 % 10000),
            },
            guild: Guild {
                id: GUILD_ID,
                name: "Local Test".to_owned(),
            },
            channels: vec![
                Channel {
                    id: Snowflake(10),
                    name: "general".to_owned(),
                    topic: "General discussion".to_owned(),
                },
                Channel {
                    id: Snowflake(11),
                    name: "off topic!".to_owned(),
                    topic: String::new(),
                },
            ],
            next_message_id: AtomicU64::new(100),
            events,
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn me(&self) -> Result<Identity, SessionError> {
        Ok(self.identity.clone())
    }

    async fn guild(&self, id: Snowflake) -> Result<Guild, SessionError> {
        if id == self.guild.id {
            Ok(self.guild.clone())
        } else {
            Err(SessionError::UnknownGuild(id))
        }
    }

    async fn channels(&self, guild: Snowflake) -> Result<Vec<Channel>, SessionError> {
        if guild == self.guild.id {
            Ok(self.channels.clone())
        } else {
            Err(SessionError::UnknownGuild(guild))
        }
    }

    async fn send_message(
        &self,
        channel: Snowflake,
        content: &str,
    ) -> Result<Snowflake, SessionError> {
        if !self.channels.iter().any(|c| c.id == channel) {
            return Err(SessionError::UnknownChannel(channel));
        }
        let id = Snowflake(self.next_message_id.fetch_add(1, Ordering::Relaxed));
        let message =
            RemoteMessage::plain(id, channel, self.identity.clone(), content);
        // No receivers is fine; the echo is best-effort.
        let _ = self.events.send(Event::MessageCreate(message));
        Ok(id)
    }

    fn events(&self) -> broadcast::Receiver<Event> {
        let rx = self.events.subscribe();
        // The live service announces readiness once connected; replay
        // that for every new feed.
        let _ = self.events.send(Event::Ready(self.identity.clone()));
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_me_is_stable_per_token() {
        let a = MemoryConnector::new("tok");
        let b = MemoryConnector::new("tok");
        assert_eq!(a.me().await.unwrap(), b.me().await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_guild_and_channel() {
        let c = MemoryConnector::new("tok");
        assert!(matches!(
            c.guild(Snowflake(99)).await,
            Err(SessionError::UnknownGuild(_))
        ));
        assert!(matches!(
            c.send_message(Snowflake(99), "hi").await,
            Err(SessionError::UnknownChannel(_))
        ));
    }

    #[tokio::test]
    async fn test_feed_opens_with_ready() {
        let c = MemoryConnector::new("tok");
        let mut rx = c.events();
        match rx.recv().await.unwrap() {
            Event::Ready(identity) => assert_eq!(identity, c.me().await.unwrap()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_echoes_on_feed() {
        let c = MemoryConnector::new("tok");
        let mut rx = c.events();
        let id = c.send_message(Snowflake(10), "hello").await.unwrap();
        loop {
            match rx.recv().await.unwrap() {
                Event::Ready(_) => continue,
                Event::MessageCreate(m) => {
                    assert_eq!(m.id, id);
                    assert_eq!(m.content, "hello");
                    break;
                }
            }
        }
    }
}
