//! # ircord-proto
//!
//! IRC wire protocol support for the ircord gateway.
//!
//! ## Features
//!
//! - IRC message parsing and serialization (prefix, command, parameters)
//! - Tokio codec for framing CRLF-terminated messages
//! - mIRC formatting control codes and the 16-color palette
//! - Identifier sanitizers for mapping foreign display names onto
//!   IRC-legal nicks and channel names
//!
//! ## Quick start
//!
//! ```rust
//! use ircord_proto::Message;
//!
//! let msg: Message = "PASS token:1234".parse().unwrap();
//! assert_eq!(msg.command, "PASS");
//! assert_eq!(msg.params, vec!["token:1234"]);
//!
//! let reply = Message::privmsg("#general", "hello there");
//! assert_eq!(reply.to_string(), "PRIVMSG #general :hello there\r\n");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codec;
pub mod colors;
pub mod error;
pub mod format;
pub mod message;
pub mod prefix;
pub mod sanitize;

pub use self::codec::IrcCodec;
pub use self::error::ProtocolError;
pub use self::message::Message;
pub use self::prefix::Prefix;

/// Maximum length of a single IRC line, including the trailing CRLF.
pub const MAX_IRC_LINE_LEN: usize = 512;

/// Numeric reply 001: the first message a server sends after registration.
pub const RPL_WELCOME: &str = "001";
/// Numeric reply 321: LIST header.
pub const RPL_LISTSTART: &str = "321";
/// Numeric reply 322: one LIST entry.
pub const RPL_LIST: &str = "322";
/// Numeric reply 323: end of LIST.
pub const RPL_LISTEND: &str = "323";
/// Numeric reply 331: channel has no topic.
pub const RPL_NOTOPIC: &str = "331";
/// Numeric reply 332: channel topic.
pub const RPL_TOPIC: &str = "332";
/// Numeric reply 366: end of NAMES.
pub const RPL_ENDOFNAMES: &str = "366";
/// Numeric reply 421: unknown command.
pub const ERR_UNKNOWNCOMMAND: &str = "421";
/// Numeric reply 403: no such channel.
pub const ERR_NOSUCHCHANNEL: &str = "403";
