//! Identifier sanitizers.
//!
//! The remote service allows display names far outside what RFC 2812
//! permits in nicks and channel names. These functions map arbitrary
//! names onto IRC-legal tokens. They are pure and total: they never fail,
//! and both are idempotent on input that is already within the length and
//! character-set bounds.
//!
//! Two distinct remote names can sanitize to the same token; the gateway
//! does not disambiguate.

/// Maximum channel name length, excluding the leading `#`.
pub const CHANNEL_NAME_MAX_LEN: usize = 50;

/// Maximum nick length per RFC 2812.
pub const NICK_MAX_LEN: usize = 9;

fn is_channel_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '#' || c == '-'
}

fn is_nick_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '[' | ']' | '{' | '}' | '^' | '_' | '-' | '|' | '`' | '\\')
}

/// Map a remote channel name onto an IRC channel name.
///
/// Removes every character outside `[A-Za-z0-9#-]`, truncates to
/// [`CHANNEL_NAME_MAX_LEN`] and prepends `#` unless the cleaned name
/// already starts with one (keeps the function idempotent). Fully-invalid
/// input yields `"#"` alone.
///
/// # Examples
///
/// ```
/// use ircord_proto::sanitize::channel_name;
///
/// assert_eq!(channel_name("general"), "#general");
/// assert_eq!(channel_name("dev chat!"), "#devchat");
/// assert_eq!(channel_name("日本語"), "#");
/// ```
pub fn channel_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|&c| is_channel_char(c))
        .take(CHANNEL_NAME_MAX_LEN)
        .collect();
    if cleaned.starts_with('#') {
        cleaned
    } else {
        format!("#{cleaned}")
    }
}

/// Map a remote username onto an IRC nick.
///
/// Removes every character outside ``[A-Za-z0-9[]{}^_-|`\]``, truncates to
/// [`NICK_MAX_LEN`], and substitutes `_` for an empty result. Never
/// returns an empty string.
///
/// # Examples
///
/// ```
/// use ircord_proto::sanitize::nick;
///
/// assert_eq!(nick("alice"), "alice");
/// assert_eq!(nick("some very long name"), "someveryl");
/// assert_eq!(nick("猫"), "_");
/// ```
pub fn nick(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|&c| is_nick_char(c))
        .take(NICK_MAX_LEN)
        .collect();
    if cleaned.is_empty() {
        "_".to_owned()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_strips_and_truncates() {
        assert_eq!(channel_name("general"), "#general");
        assert_eq!(channel_name("Dev Chat #2"), "#DevChat#2");
        let long = "a".repeat(80);
        assert_eq!(channel_name(&long).len(), 1 + CHANNEL_NAME_MAX_LEN);
    }

    #[test]
    fn test_channel_name_fully_invalid() {
        assert_eq!(channel_name("💬💬💬"), "#");
        assert_eq!(channel_name(""), "#");
    }

    #[test]
    fn test_nick_strips_and_truncates() {
        assert_eq!(nick("alice"), "alice");
        assert_eq!(nick("[bot]^_^"), "[bot]^_^");
        assert_eq!(nick("a b c d e f g h i j"), "abcdefghi");
    }

    #[test]
    fn test_nick_never_empty() {
        assert_eq!(nick(""), "_");
        assert_eq!(nick("猫猫猫"), "_");
    }

    #[test]
    fn test_idempotence() {
        for input in ["general", "Dev-Chat", "💬general💬"] {
            let once = channel_name(input);
            // The leading # survives a second pass unchanged.
            assert_eq!(channel_name(&once), once);
        }
        for input in ["alice", "[bot]", "some very long name"] {
            let once = nick(input);
            assert_eq!(nick(&once), once);
        }
    }
}
