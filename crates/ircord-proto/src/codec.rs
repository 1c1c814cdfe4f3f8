//! IRC message codec for tokio.
//!
//! Frames newline-terminated lines out of the byte stream and parses them
//! into [`Message`] values. Lines are limited to [`MAX_IRC_LINE_LEN`]
//! bytes and may not contain illegal control characters.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::MAX_IRC_LINE_LEN;

/// Tokio codec for encoding/decoding IRC messages.
pub struct IrcCodec {
    /// Index of next byte to check for newline.
    next_index: usize,
    /// Maximum line length.
    max_len: usize,
}

impl IrcCodec {
    /// Create a new codec with the standard 512-byte line limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MAX_IRC_LINE_LEN,
        }
    }

    /// Create a new codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Validate that a line contains no illegal control characters.
    fn validate_line(s: &str) -> Result<()> {
        let trimmed = s.trim_end_matches(['\r', '\n']);
        for ch in trimmed.chars() {
            if crate::format::is_illegal_control_char(ch) {
                return Err(ProtocolError::IllegalControlChar(ch));
            }
        }
        Ok(())
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let data =
                std::str::from_utf8(&line).map_err(|e| ProtocolError::InvalidUtf8 {
                    byte_pos: e.valid_up_to(),
                })?;
            Self::validate_line(data)?;

            data.parse::<Message>().map(Some)
        } else {
            // No complete line yet - remember where we stopped.
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<()> {
        let line = msg.to_string();
        Self::validate_line(&line)?;
        dst.extend_from_slice(line.as_bytes());
        Ok(())
    }
}
