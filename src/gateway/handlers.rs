//! Post-registration IRC command handling and remote event delivery.

use ircord_proto::{
    sanitize, Message, Prefix, ERR_NOSUCHCHANNEL, ERR_UNKNOWNCOMMAND, RPL_ENDOFNAMES,
    RPL_LIST, RPL_LISTEND, RPL_LISTSTART, RPL_NOTOPIC, RPL_TOPIC,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use super::Client;
use crate::error::GatewayError;
use crate::remote::{Event, RemoteMessage};
use crate::render::{self, document};

/// Whether the run loop continues after a command.
pub enum Flow {
    /// Keep serving.
    Continue,
    /// The client asked to disconnect, with an optional reason.
    Quit(Option<String>),
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Dispatch one decoded command from the registered client.
    pub(super) async fn handle_command(&mut self, msg: Message) -> Result<Flow, GatewayError> {
        match msg.command.as_str() {
            "PING" => {
                let token = msg
                    .params
                    .first()
                    .cloned()
                    .unwrap_or_else(|| self.server_name.clone());
                let pong = Message::pong(token).with_prefix(self.server_prefix.clone());
                self.send(pong).await?;
            }
            "LIST" => self.handle_list().await?,
            "JOIN" => self.handle_join(&msg).await?,
            "PRIVMSG" => self.handle_privmsg(&msg).await?,
            "QUIT" => return Ok(Flow::Quit(msg.params.first().cloned())),
            // Re-negotiation after registration is accepted and ignored.
            "CAP" | "PONG" => {}
            other => {
                let reply = self.numeric(
                    ERR_UNKNOWNCOMMAND,
                    vec![other.to_owned(), "Unknown command".to_owned()],
                );
                self.send(reply).await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_list(&mut self) -> Result<(), GatewayError> {
        let header = self.numeric(
            RPL_LISTSTART,
            vec!["Channel".to_owned(), "Users Name".to_owned()],
        );
        self.send(header).await?;
        if let Some(guild) = self.guild.clone() {
            let channels = self.session()?.channels(guild.id).await?;
            for channel in channels {
                let entry = self.numeric(
                    RPL_LIST,
                    vec![
                        sanitize::channel_name(&channel.name),
                        "0".to_owned(),
                        channel.topic,
                    ],
                );
                self.send(entry).await?;
            }
        }
        let end = self.numeric(RPL_LISTEND, vec!["End of /LIST".to_owned()]);
        self.send(end).await
    }

    async fn handle_join(&mut self, msg: &Message) -> Result<(), GatewayError> {
        let targets = msg
            .params
            .first()
            .cloned()
            .ok_or_else(|| GatewayError::NeedMoreParams("JOIN".to_owned()))?;
        let channels = match self.guild.clone() {
            Some(guild) => self.session()?.channels(guild.id).await?,
            None => Vec::new(),
        };
        for target in targets.split(',') {
            let found = channels
                .iter()
                .find(|c| sanitize::channel_name(&c.name) == target);
            let Some(channel) = found else {
                let reply = self.numeric(
                    ERR_NOSUCHCHANNEL,
                    vec![target.to_owned(), "No such channel".to_owned()],
                );
                self.send(reply).await?;
                continue;
            };

            let irc_name = sanitize::channel_name(&channel.name);
            self.channels.insert(channel.id, irc_name.clone());
            debug!(channel = %irc_name, id = %channel.id, "joined channel");

            let echo =
                Message::join(&irc_name).with_prefix(self.client_prefix.clone());
            self.send(echo).await?;
            let topic = if channel.topic.is_empty() {
                self.numeric(
                    RPL_NOTOPIC,
                    vec![irc_name.clone(), "No topic is set".to_owned()],
                )
            } else {
                self.numeric(RPL_TOPIC, vec![irc_name.clone(), channel.topic.clone()])
            };
            self.send(topic).await?;
            let names_end = self.numeric(
                RPL_ENDOFNAMES,
                vec![irc_name, "End of /NAMES list".to_owned()],
            );
            self.send(names_end).await?;
        }
        Ok(())
    }

    async fn handle_privmsg(&mut self, msg: &Message) -> Result<(), GatewayError> {
        let (target, text) = match msg.params.as_slice() {
            [target, text, ..] => (target.clone(), text.clone()),
            _ => return Err(GatewayError::NeedMoreParams("PRIVMSG".to_owned())),
        };
        let channel = self
            .channels
            .iter()
            .find_map(|(id, name)| (*name == target).then_some(*id));
        let Some(channel) = channel else {
            let reply = self.numeric(
                ERR_NOSUCHCHANNEL,
                vec![target, "No such channel".to_owned()],
            );
            return self.send(reply).await;
        };
        let id = self.session()?.send_message(channel, &text).await?;
        // Our own message comes back on the event feed; the watermark
        // keeps it from being replayed to us.
        if id > self.last_message_id {
            self.last_message_id = id;
        }
        Ok(())
    }

    /// Dispatch one event from the remote feed.
    pub(super) async fn handle_event(&mut self, event: Event) -> Result<(), GatewayError> {
        match event {
            Event::Ready(identity) => {
                debug!(user = %identity.username, "session ready");
                Ok(())
            }
            Event::MessageCreate(message) => self.handle_message_create(message).await,
        }
    }

    async fn handle_message_create(
        &mut self,
        message: RemoteMessage,
    ) -> Result<(), GatewayError> {
        if message.id <= self.last_message_id {
            trace!(id = %message.id, "suppressing already-seen message");
            return Ok(());
        }
        self.last_message_id = message.id;
        let Some(target) = self.channels.get(&message.channel_id).cloned() else {
            return Ok(());
        };

        let nick = sanitize::nick(&message.author.username);
        let prefix = Prefix::new(
            nick,
            message.author.username.clone(),
            message.author.id.to_string(),
        );
        let tree = document::from_plain(&message.content);
        let mut lines = Vec::new();
        render::render_message(&tree, &message, |line: &str| {
            lines.push(line.to_owned());
            Ok::<_, GatewayError>(())
        })?;
        for line in lines {
            let privmsg =
                Message::privmsg(&target, line).with_prefix(prefix.clone());
            self.send(privmsg).await?;
        }
        Ok(())
    }

    fn session(&self) -> Result<&super::SessionRef, GatewayError> {
        self.session.as_ref().ok_or(GatewayError::NotRegistered)
    }

    /// Build a numeric reply addressed to the client's nick.
    fn numeric(&self, code: &str, mut params: Vec<String>) -> Message {
        params.insert(0, self.nick.clone());
        Message::numeric(code, params).with_prefix(self.server_prefix.clone())
    }
}
