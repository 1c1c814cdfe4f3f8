//! Owned IRC message type with parsing and serialization.
//!
//! The gateway dispatches on the command verb, so the command is kept as a
//! plain string with its parameters in a `Vec`. The last parameter is
//! serialized as a trailing parameter (`:...`) whenever it is empty,
//! contains a space, or starts with a colon.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, Result};
use crate::prefix::Prefix;

/// An owned IRC message: optional prefix, command verb, parameters.
///
/// # Example
///
/// ```
/// use ircord_proto::Message;
///
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.params, vec!["#channel", "Hello!"]);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Message prefix/source (e.g., `nick!user@host`).
    pub prefix: Option<Prefix>,
    /// The command verb, uppercased for named commands (e.g., `PRIVMSG`)
    /// or a three-digit numeric (e.g., `001`).
    pub command: String,
    /// Command parameters, trailing parameter last.
    pub params: Vec<String>,
}

impl Message {
    /// Create a new message from a command verb and parameters.
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Create a PRIVMSG to a target with text.
    #[must_use]
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("PRIVMSG", vec![target.into(), text.into()])
    }

    /// Create a NOTICE to a target with text.
    #[must_use]
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("NOTICE", vec![target.into(), text.into()])
    }

    /// Create a JOIN for a channel.
    #[must_use]
    pub fn join(channel: impl Into<String>) -> Self {
        Self::new("JOIN", vec![channel.into()])
    }

    /// Create a PONG in response to a PING.
    #[must_use]
    pub fn pong(token: impl Into<String>) -> Self {
        Self::new("PONG", vec![token.into()])
    }

    /// Create a numeric reply (e.g., `001`) with parameters.
    #[must_use]
    pub fn numeric(code: &str, params: Vec<String>) -> Self {
        Self::new(code, params)
    }

    /// Set the prefix/source of this message.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// The trailing (last) parameter, if any.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.command)?;
        if let Some((last, rest)) = self.params.split_last() {
            for param in rest {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        write!(f, "\r\n")
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }

        let mut rest = line;

        let prefix = if let Some(stripped) = rest.strip_prefix(':') {
            let (raw, tail) =
                stripped
                    .split_once(' ')
                    .ok_or_else(|| ProtocolError::InvalidMessage {
                        string: line.to_owned(),
                    })?;
            rest = tail.trim_start_matches(' ');
            Some(Prefix::new_from_str(raw))
        } else {
            None
        };

        let (command, mut rest) = match rest.split_once(' ') {
            Some((cmd, tail)) => (cmd, tail),
            None => (rest, ""),
        };
        if command.is_empty() || !command.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProtocolError::InvalidMessage {
                string: line.to_owned(),
            });
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_owned());
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param.to_owned());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_owned());
                    break;
                }
            }
        }

        Ok(Message {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}
