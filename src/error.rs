//! Unified error handling for the gateway.
//!
//! Connection handling distinguishes errors that end the connection from
//! errors that are reported to the client and survived. Each variant
//! carries a static label via [`GatewayError::error_code`] for log
//! fields.

use ircord_proto::ProtocolError;
use thiserror::Error;

use crate::remote::SessionError;

/// Errors that can occur while serving one IRC connection.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The client broke the IRC protocol (bad line, bad command shape).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The remote service rejected or failed an operation.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The client must register (PASS/NICK/USER) before this command.
    #[error("not registered")]
    NotRegistered,

    /// A command arrived with too few parameters.
    #[error("not enough parameters: {0}")]
    NeedMoreParams(String),

    /// The client asked to disconnect.
    #[error("client quit: {0:?}")]
    Quit(Option<String>),
}

impl GatewayError {
    /// Static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol",
            Self::Session(_) => "session",
            Self::NotRegistered => "not_registered",
            Self::NeedMoreParams(_) => "need_more_params",
            Self::Quit(_) => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(GatewayError::NotRegistered.error_code(), "not_registered");
        assert_eq!(GatewayError::Quit(None).error_code(), "quit");
        assert_eq!(
            GatewayError::NeedMoreParams("JOIN".into()).error_code(),
            "need_more_params"
        );
    }
}
