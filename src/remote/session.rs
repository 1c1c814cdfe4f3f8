//! Reference-counted sessions shared across gateway connections.
//!
//! A [`Session`] is one authenticated identity on the remote service,
//! keyed by credential token. Several IRC connections logging in with the
//! same token share one session; the underlying connector is torn down
//! only when the last reference is released. Acquisition hands out a
//! [`SessionRef`] RAII guard, so release happens exactly once per
//! acquisition on every exit path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Channel, Event, Guild, Identity, Snowflake};

/// Errors raised while acquiring or using a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The credential token is unknown or rejected by the remote service.
    #[error("unknown or invalid token")]
    UnknownToken,

    /// The requested guild does not exist or is not visible.
    #[error("no such guild: {0}")]
    UnknownGuild(Snowflake),

    /// The requested channel does not exist or is not visible.
    #[error("no such channel: {0}")]
    UnknownChannel(Snowflake),

    /// A snowflake failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The remote service could not be reached.
    #[error("remote service unavailable: {0}")]
    Unavailable(String),
}

/// The seam to the remote service proper.
///
/// The gateway only ever talks to the remote service through this trait;
/// the wire protocol behind it is not this crate's concern. Dropping the
/// last clone of a connector tears the remote connection down.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The verified identity this connector is logged in as.
    async fn me(&self) -> Result<Identity, SessionError>;

    /// Resolve a guild by snowflake.
    async fn guild(&self, id: Snowflake) -> Result<Guild, SessionError>;

    /// The text channels of a guild.
    async fn channels(&self, guild: Snowflake) -> Result<Vec<Channel>, SessionError>;

    /// Post a message; returns the new message's snowflake.
    async fn send_message(
        &self,
        channel: Snowflake,
        content: &str,
    ) -> Result<Snowflake, SessionError>;

    /// Subscribe to the raw event stream.
    fn events(&self) -> broadcast::Receiver<Event>;
}

/// Produces a connector for a credential token.
pub type ConnectFn =
    Box<dyn Fn(&str) -> Result<Arc<dyn Connector>, SessionError> + Send + Sync>;

/// One authenticated identity on the remote service.
pub struct Session {
    token: String,
    connector: Arc<dyn Connector>,
    refs: AtomicUsize,
}

impl Session {
    /// The verified identity behind this session.
    pub async fn me(&self) -> Result<Identity, SessionError> {
        self.connector.me().await
    }

    /// Resolve a guild by snowflake.
    pub async fn guild(&self, id: Snowflake) -> Result<Guild, SessionError> {
        self.connector.guild(id).await
    }

    /// The text channels of a guild.
    pub async fn channels(&self, guild: Snowflake) -> Result<Vec<Channel>, SessionError> {
        self.connector.channels(guild).await
    }

    /// Post a message; returns the new message's snowflake.
    pub async fn send_message(
        &self,
        channel: Snowflake,
        content: &str,
    ) -> Result<Snowflake, SessionError> {
        self.connector.send_message(channel, content).await
    }

    /// Subscribe to this session's events, filtered by `predicate`.
    ///
    /// Returns a receiver and a guard; dropping the guard cancels the
    /// subscription. Events arrive in feed order.
    pub fn subscribe<P>(&self, predicate: P) -> (mpsc::Receiver<Event>, Subscription)
    where
        P: Fn(&Event) -> bool + Send + 'static,
    {
        let mut raw = self.connector.events();
        let (tx, rx) = mpsc::channel(64);
        let handle = tokio::spawn(async move {
            loop {
                match raw.recv().await {
                    Ok(event) => {
                        if predicate(&event) && tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "event feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
        (rx, Subscription { handle })
    }
}

/// Guard for an event subscription; cancels the feed when dropped.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Registry of live sessions, keyed by credential token.
pub struct SessionMap {
    connect: ConnectFn,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionMap {
    /// Create a registry that obtains connectors through `connect`.
    pub fn new(connect: ConnectFn) -> Self {
        Self {
            connect,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a session for `token`, reusing a live one when present.
    pub fn get(self: &Arc<Self>, token: &str) -> Result<SessionRef, SessionError> {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get(token) {
            session.refs.fetch_add(1, Ordering::AcqRel);
            return Ok(SessionRef {
                map: Arc::clone(self),
                session: Arc::clone(session),
            });
        }

        let connector = (self.connect)(token)?;
        let session = Arc::new(Session {
            token: token.to_owned(),
            connector,
            refs: AtomicUsize::new(1),
        });
        sessions.insert(token.to_owned(), Arc::clone(&session));
        debug!("session created");
        Ok(SessionRef {
            map: Arc::clone(self),
            session,
        })
    }

    /// The number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// True when no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn release(&self, session: &Arc<Session>) {
        // Hold the registry lock across the decrement so a concurrent
        // get() cannot revive an entry that is about to be removed.
        let mut sessions = self.sessions.lock();
        if session.refs.fetch_sub(1, Ordering::AcqRel) == 1 {
            sessions.remove(&session.token);
            debug!("session torn down");
        }
    }
}

/// RAII handle to an acquired [`Session`].
///
/// Dereferences to the session; releases the reference exactly once when
/// dropped, which tears the session down at refcount zero.
pub struct SessionRef {
    map: Arc<SessionMap>,
    session: Arc<Session>,
}

impl std::ops::Deref for SessionRef {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl Drop for SessionRef {
    fn drop(&mut self) {
        self.map.release(&self.session);
    }
}
