//! Property tests for the identifier sanitizers.

use ircord_proto::sanitize::{channel_name, nick, CHANNEL_NAME_MAX_LEN, NICK_MAX_LEN};
use proptest::prelude::*;

fn is_channel_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '#' || c == '-'
}

fn is_nick_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '[' | ']' | '{' | '}' | '^' | '_' | '-' | '|' | '`' | '\\')
}

proptest! {
    #[test]
    fn nick_length_and_charset(s in "\\PC*") {
        let n = nick(&s);
        prop_assert!(!n.is_empty());
        prop_assert!(n.len() <= NICK_MAX_LEN);
        prop_assert!(n.chars().all(is_nick_char) || n == "_");
    }

    #[test]
    fn channel_name_shape(s in "\\PC*") {
        let c = channel_name(&s);
        prop_assert!(c.starts_with('#'));
        prop_assert!(c.len() <= 1 + CHANNEL_NAME_MAX_LEN);
        prop_assert!(c[1..].chars().all(is_channel_char));
    }

    #[test]
    fn nick_idempotent_on_conforming_input(s in "[A-Za-z0-9\\[\\]{}^_|`-]{1,9}") {
        prop_assert_eq!(nick(&nick(&s)), nick(&s));
    }

    #[test]
    fn channel_name_idempotent_on_conforming_input(s in "[A-Za-z0-9-]{0,49}") {
        let once = channel_name(&s);
        prop_assert_eq!(channel_name(&once), once);
    }
}
