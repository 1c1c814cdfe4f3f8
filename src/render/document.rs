//! The parsed rich-text document tree.
//!
//! The renderer consumes a [`Node`] tree whose mentions, channels and
//! emoji have already been resolved against guild state; parsing markdown
//! into this tree is someone else's job. [`from_plain`] lifts raw text
//! into a minimal tree so unparsed content can still flow through the
//! same rendering path.

/// A toggleable text attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strikethrough,
    /// Monospaced text.
    Monospace,
    /// Spoiler text, hidden until revealed by the viewer.
    Spoiler,
    /// Quoted attribute; renders nothing.
    Quoted,
}

/// Line break carried by a text segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Break {
    /// The segment does not end a line.
    #[default]
    None,
    /// The segment ends a soft line break.
    Soft,
    /// The segment ends a hard (paragraph-like) line break.
    Hard,
}

/// One node of a parsed document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Root of the tree.
    Document(Vec<Node>),
    /// Block quote; every direct child renders behind a quote marker.
    Blockquote(Vec<Node>),
    /// Paragraph of inline content.
    Paragraph(Vec<Node>),
    /// Fenced code block, raw lines without trailing newlines.
    FencedCodeBlock(Vec<String>),
    /// Explicit link with visible children and a destination URL.
    Link {
        /// Link target.
        destination: String,
        /// Visible content.
        children: Vec<Node>,
    },
    /// Bare URL.
    AutoLink(String),
    /// Inline content under a text attribute.
    Styled(Style, Vec<Node>),
    /// Named emoji, resolved.
    Emoji(String),
    /// Resolved channel mention; the channel's display name.
    ChannelMention(String),
    /// Resolved member mention; the member's username.
    MemberMention(String),
    /// Mention that could not be resolved; renders nothing.
    UnresolvedMention,
    /// Raw text segment.
    Text {
        /// Segment bytes.
        value: String,
        /// Line break ending the segment.
        brk: Break,
    },
}

impl Node {
    /// A plain text segment with no trailing break.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
            brk: Break::None,
        }
    }
}

/// Lift raw text into a single-paragraph document.
///
/// Each source line becomes a text segment ending in a soft break, which
/// the renderer turns back into line breaks.
pub fn from_plain(source: &str) -> Node {
    let mut segments = Vec::new();
    let mut lines = source.lines().peekable();
    while let Some(line) = lines.next() {
        if lines.peek().is_some() {
            segments.push(Node::Text {
                value: line.to_owned(),
                brk: Break::Soft,
            });
        } else {
            segments.push(Node::text(line));
        }
    }
    Node::Document(vec![Node::Paragraph(segments)])
}
