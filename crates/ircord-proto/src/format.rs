//! IRC formatting control codes.
//!
//! These bytes are defined by the IRC formatting convention at
//! <https://modern.ircdocs.horse/formatting> and are the wire format of
//! the gateway's rendered output: any change here changes the bytes a
//! connected client sees.
//!
//! Formatting codes are permitted in message **content** but must not
//! appear in nicknames, usernames, or channel names.

/// Bold toggle.
pub const BOLD: char = '\x02';
/// Italic toggle.
pub const ITALIC: char = '\x1D';
/// Underline toggle.
pub const UNDERLINE: char = '\x1F';
/// Strikethrough toggle.
pub const STRIKETHROUGH: char = '\x1E';
/// Monospace toggle.
pub const MONOSPACE: char = '\x11';
/// Color escape, followed by a decimal palette index and optional `,bg`.
/// Bare, it resets the current color.
pub const COLOR: char = '\x03';

/// A bare color escape: resets the current color.
pub const RESET: &str = "\x03";

/// A color escape selecting a foreground palette index.
///
/// Indices are zero-padded to two digits so a following digit in the
/// text cannot be misread as part of the index.
pub fn color(index: u8) -> String {
    format!("{COLOR}{index:02}")
}

/// A color escape selecting foreground and background palette indices.
pub fn color_bg(fg: u8, bg: u8) -> String {
    format!("{COLOR}{fg:02},{bg:02}")
}

/// Returns true if the character is a recognized IRC formatting code.
#[inline]
pub fn is_irc_format_code(ch: char) -> bool {
    matches!(
        ch,
        '\x01' | '\x02' | '\x03' | '\x04' | '\x0F' | '\x11' | '\x16' | '\x1D' | '\x1E' | '\x1F'
    )
}

/// Returns true if a control character is illegal in IRC messages.
///
/// CR and LF are permitted as line delimiters; recognized formatting
/// codes are permitted in content; everything else that is a control
/// character is rejected.
#[inline]
pub fn is_illegal_control_char(ch: char) -> bool {
    ch.is_control() && ch != '\r' && ch != '\n' && !is_irc_format_code(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_bytes() {
        // The renderer's output vocabulary, byte for byte.
        assert_eq!(BOLD as u32, 0x02);
        assert_eq!(ITALIC as u32, 0x1D);
        assert_eq!(UNDERLINE as u32, 0x1F);
        assert_eq!(STRIKETHROUGH as u32, 0x1E);
        assert_eq!(MONOSPACE as u32, 0x11);
        assert_eq!(COLOR as u32, 0x03);
    }

    #[test]
    fn test_color_escapes() {
        assert_eq!(color(9), "\x0309");
        assert_eq!(color(14), "\x0314");
        assert_eq!(color_bg(0, 0), "\x0300,00");
        assert_eq!(RESET, "\x03");
    }

    #[test]
    fn test_format_codes_recognized() {
        assert!(is_irc_format_code(BOLD));
        assert!(is_irc_format_code(COLOR));
        assert!(!is_irc_format_code('a'));
        assert!(!is_irc_format_code('\x00'));
    }

    #[test]
    fn test_illegal_control_chars() {
        assert!(is_illegal_control_char('\x07')); // BEL
        assert!(is_illegal_control_char('\x00')); // NUL
        assert!(!is_illegal_control_char(BOLD));
        assert!(!is_illegal_control_char('\r'));
        assert!(!is_illegal_control_char('\n'));
        assert!(!is_illegal_control_char('a'));
    }

    #[test]
    fn test_formatted_message_is_legal() {
        let msg = "\x02bold\x02 and \x0304,05colored\x03";
        for ch in msg.chars() {
            assert!(!is_illegal_control_char(ch), "{ch:?} should be allowed");
        }
    }
}
