//! Lexical token classification for fenced code blocks.
//!
//! A language-agnostic scanner splits code into coarse token kinds, and
//! each kind maps to a fixed palette color. Every token is written
//! wrapped in a no-emphasis pair and a trailing reset so IRC clients
//! cannot carry formatting across token boundaries.

use ircord_proto::format;

/// Coarse lexical kind of a scanned token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Run of whitespace, newlines included.
    Whitespace,
    /// Quoted string literal.
    String,
    /// Reserved word.
    Keyword,
    /// Line or block comment.
    Comment,
    /// Capitalized identifier.
    Type,
    /// Numeric literal.
    Decimal,
    /// Single punctuation character.
    Punctuation,
    /// Anything else.
    Plaintext,
}

impl Kind {
    fn palette_index(self) -> u8 {
        match self {
            Kind::String => 9,
            Kind::Keyword => 4,
            Kind::Comment => 14,
            Kind::Type => 10,
            Kind::Decimal => 7,
            Kind::Punctuation => 8,
            Kind::Whitespace | Kind::Plaintext => 0,
        }
    }
}

/// Reserved words across the common languages pasted into chat.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "case", "catch", "chan", "class",
    "const", "continue", "def", "default", "defer", "do", "elif", "else",
    "enum", "false", "finally", "fn", "for", "func", "function", "go",
    "if", "impl", "import", "in", "interface", "let", "loop", "map",
    "match", "mod", "move", "new", "nil", "not", "null", "package", "pub",
    "range", "ref", "return", "select", "self", "static", "struct",
    "switch", "throw", "trait", "true", "try", "type", "use", "var",
    "where", "while",
];

/// Split `source` into classified tokens. Concatenating the token texts
/// reproduces the source exactly.
pub fn scan(source: &str) -> Vec<(Kind, &str)> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        let kind = match bytes[pos] {
            b if b.is_ascii_whitespace() => {
                while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                Kind::Whitespace
            }
            quote @ (b'"' | b'\'' | b'`') => {
                pos += 1;
                while pos < bytes.len() && bytes[pos] != quote && bytes[pos] != b'\n' {
                    if bytes[pos] == b'\\' && pos + 1 < bytes.len() {
                        pos += 1;
                    }
                    pos += 1;
                }
                if pos < bytes.len() && bytes[pos] == quote {
                    pos += 1;
                }
                Kind::String
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                Kind::Comment
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                while pos < bytes.len() {
                    if bytes[pos] == b'*' && bytes.get(pos + 1) == Some(&b'/') {
                        pos += 2;
                        break;
                    }
                    pos += 1;
                }
                Kind::Comment
            }
            b'#' => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                Kind::Comment
            }
            b if b.is_ascii_digit() => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric()
                        || bytes[pos] == b'.'
                        || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                Kind::Decimal
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                let word = &source[start..pos];
                if KEYWORDS.contains(&word) {
                    Kind::Keyword
                } else if word.starts_with(|c: char| c.is_ascii_uppercase()) {
                    Kind::Type
                } else {
                    Kind::Plaintext
                }
            }
            _ => {
                // Step a whole UTF-8 scalar so multibyte text stays intact.
                let ch_len = source[pos..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                pos += ch_len;
                if bytes[start].is_ascii_punctuation() {
                    Kind::Punctuation
                } else {
                    Kind::Plaintext
                }
            }
        };
        tokens.push((kind, &source[start..pos]));
    }
    tokens
}

/// Classify `source` and write every token colored into a new string.
pub fn highlight(source: &str) -> String {
    let mut out = String::new();
    for (kind, text) in scan(source) {
        out.push_str(&format::color(kind.palette_index()));
        out.push_str("\x02\x02");
        out.push_str(text);
        out.push_str(format::RESET);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Kind> {
        scan(source).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_scan_reproduces_source() {
        let source = "let x = \"hi\"; // done\n";
        let joined: String = scan(source).into_iter().map(|(_, t)| t).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_keyword_type_and_string() {
        assert_eq!(
            kinds("let Foo \"s\""),
            vec![
                Kind::Keyword,
                Kind::Whitespace,
                Kind::Type,
                Kind::Whitespace,
                Kind::String,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(kinds("// rest of line"), vec![Kind::Comment]);
        assert_eq!(kinds("/* block */"), vec![Kind::Comment]);
        assert_eq!(kinds("# shell style"), vec![Kind::Comment]);
    }

    #[test]
    fn test_highlight_token_wrapping() {
        assert_eq!(highlight("let"), "\x0304\x02\x02let\x03");
        assert_eq!(highlight("42"), "\x0307\x02\x0242\x03");
        assert_eq!(highlight(";"), "\x0308\x02\x02;\x03");
        assert_eq!(highlight("plain"), "\x0300\x02\x02plain\x03");
    }
}
