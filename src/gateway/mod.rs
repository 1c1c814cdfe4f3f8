//! One IRC connection and its lifecycle.
//!
//! A [`Client`] owns the framed transport for a single TCP connection and
//! walks it through registration and into the running event loop. Until
//! PASS succeeds, only CAP, NICK and USER are tolerated; anything else
//! ends the connection before a session is ever acquired. After
//! registration the connection fans in over three sources: decoded IRC
//! commands, remote events, and decode errors.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use ircord_proto::{IrcCodec, Message, Prefix, ProtocolError, RPL_WELCOME};
use tokio::io::{split, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::remote::{Event, Guild, SessionError, SessionMap, SessionRef, Snowflake};

pub use handlers::Flow;

/// Outcome of one arm of the running-state select.
enum SelectResult {
    /// A decoded IRC command from the client.
    Command(Message),
    /// An event from the remote service.
    Remote(Event),
    /// The decode task hit a protocol or I/O error.
    DecodeError(ProtocolError),
    /// The client's read side is gone.
    Disconnected,
}

/// One IRC connection mediating access to one remote-service identity.
pub struct Client<T> {
    server_name: String,
    sessions: Arc<SessionMap>,
    reader: Option<FramedRead<ReadHalf<T>, IrcCodec>>,
    writer: FramedWrite<WriteHalf<T>, IrcCodec>,
    server_prefix: Prefix,
    client_prefix: Prefix,
    nick: String,
    session: Option<SessionRef>,
    guild: Option<Guild>,
    /// Subscribed remote channel -> IRC channel name.
    channels: HashMap<Snowflake, String>,
    /// Highest message snowflake seen or sent; used for echo suppression.
    last_message_id: Snowflake,
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap `stream` in the IRC codec. `peer` is the remote address (or
    /// any placeholder naming the unauthenticated client).
    pub fn new(
        stream: T,
        server_name: impl Into<String>,
        peer: &str,
        sessions: Arc<SessionMap>,
    ) -> Self {
        let server_name = server_name.into();
        let (read_half, write_half) = split(stream);
        Self {
            server_prefix: Prefix::ServerName(server_name.clone()),
            client_prefix: Prefix::new_from_str(peer),
            server_name,
            sessions,
            reader: Some(FramedRead::new(read_half, IrcCodec::default())),
            writer: FramedWrite::new(write_half, IrcCodec::default()),
            nick: String::new(),
            session: None,
            guild: None,
            channels: HashMap::new(),
            last_message_id: Snowflake(0),
        }
    }

    /// Serve the connection to completion. QUIT is a normal exit; all
    /// other errors propagate after teardown. The session reference and
    /// transport are released when `self` drops, so every exit path
    /// releases exactly once.
    pub async fn run(mut self) -> Result<(), GatewayError> {
        let result = self.serve().await;
        match result {
            Err(GatewayError::Quit(reason)) => {
                info!(?reason, "client quit");
                Ok(())
            }
            other => other,
        }
    }

    async fn serve(&mut self) -> Result<(), GatewayError> {
        self.authenticate().await?;
        self.run_loop().await
    }

    /// Registration loop: CAP, NICK and USER are accepted and ignored,
    /// PASS authenticates, anything else is fatal.
    async fn authenticate(&mut self) -> Result<(), GatewayError> {
        loop {
            let frame = match self.reader.as_mut() {
                Some(reader) => reader.next().await,
                None => return Ok(()),
            };
            let msg = match frame {
                Some(item) => item?,
                // Disconnect before registration; nothing to clean up.
                None => return Err(GatewayError::Quit(None)),
            };
            match msg.command.as_str() {
                // The requested nick is irrelevant; the verified identity
                // decides it at login.
                "CAP" | "NICK" | "USER" => {}
                "PASS" => return self.login(&msg).await,
                other => {
                    return Err(GatewayError::Protocol(ProtocolError::InvalidMessage {
                        string: format!("invalid command received for auth stage: {other}"),
                    }))
                }
            }
        }
    }

    /// PASS carries `<token>[:<guildID>]` as its single parameter.
    async fn login(&mut self, msg: &Message) -> Result<(), GatewayError> {
        let credentials = match msg.params.as_slice() {
            [credentials] => credentials,
            _ => {
                return Err(GatewayError::Protocol(ProtocolError::InvalidMessage {
                    string: "PASS requires exactly one parameter".to_owned(),
                }))
            }
        };
        let (token, guild_id) = match credentials.split_once(':') {
            Some((token, guild_id)) => (token, Some(guild_id)),
            None => (credentials.as_str(), None),
        };

        let session = self.sessions.get(token)?;
        let me = session.me().await?;
        if let Some(guild_id) = guild_id {
            let id: Snowflake = guild_id
                .parse()
                .map_err(|_| SessionError::InvalidId(guild_id.to_owned()))?;
            self.guild = Some(session.guild(id).await?);
        }

        self.nick = me.username.clone();
        self.client_prefix =
            Prefix::new(me.username.clone(), me.username.clone(), me.id.to_string());
        self.session = Some(session);

        let welcome = Message::numeric(
            RPL_WELCOME,
            vec![
                self.nick.clone(),
                format!(
                    "Welcome to {}, {}#{}",
                    self.server_name, me.username, me.discriminator
                ),
            ],
        )
        .with_prefix(self.server_prefix.clone());
        self.send(welcome).await?;
        info!(
            user = %me.username,
            guild = ?self.guild.as_ref().map(|g| &g.name),
            sessions = self.sessions.len(),
            "client registered"
        );
        Ok(())
    }

    /// Running state: reads move to a background decode task, and the
    /// primary task selects fairly over commands, remote events and
    /// decode errors. The event subscription and decode task are torn
    /// down on every exit.
    async fn run_loop(&mut self) -> Result<(), GatewayError> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => return Ok(()),
        };
        let (msg_tx, mut msg_rx) = mpsc::channel::<Message>(32);
        let (err_tx, mut err_rx) = mpsc::channel::<ProtocolError>(1);
        let decode_task = tokio::spawn(read_frames(reader, msg_tx, err_tx));

        let (mut events, _subscription) = match &self.session {
            Some(session) => session.subscribe(|_| true),
            None => return Err(GatewayError::NotRegistered),
        };

        let result = loop {
            let next = tokio::select! {
                msg = msg_rx.recv() => {
                    msg.map_or(SelectResult::Disconnected, SelectResult::Command)
                }
                event = events.recv() => match event {
                    Some(event) => SelectResult::Remote(event),
                    None => break Err(GatewayError::Session(SessionError::Unavailable(
                        "event feed closed".to_owned(),
                    ))),
                },
                err = err_rx.recv() => {
                    err.map_or(SelectResult::Disconnected, SelectResult::DecodeError)
                }
            };
            match next {
                SelectResult::Command(msg) => match self.handle_command(msg).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit(reason)) => break Err(GatewayError::Quit(reason)),
                    Err(err) => break Err(err),
                },
                SelectResult::Remote(event) => {
                    if let Err(err) = self.handle_event(event).await {
                        break Err(err);
                    }
                }
                SelectResult::DecodeError(err) => break Err(err.into()),
                SelectResult::Disconnected => {
                    // The decode task drops both senders on its way out,
                    // so a pending error and the closed message channel
                    // can become ready together; check for the error
                    // before concluding a clean exit.
                    if let Ok(err) = err_rx.try_recv() {
                        break Err(err.into());
                    }
                    debug!("client disconnected");
                    break Ok(());
                }
            }
        };
        decode_task.abort();
        result
    }

    async fn send(&mut self, msg: Message) -> Result<(), GatewayError> {
        self.writer.send(msg).await?;
        Ok(())
    }
}

/// Background decode task: republish frames and the first error onto
/// single-purpose channels. Ends at EOF or when the gateway goes away.
async fn read_frames<T>(
    mut reader: FramedRead<ReadHalf<T>, IrcCodec>,
    msg_tx: mpsc::Sender<Message>,
    err_tx: mpsc::Sender<ProtocolError>,
) where
    T: AsyncRead + Send + 'static,
{
    while let Some(item) = reader.next().await {
        match item {
            Ok(msg) => {
                if msg_tx.send(msg).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = err_tx.send(err).await;
                return;
            }
        }
    }
}
