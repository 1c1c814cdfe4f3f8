//! Rich-text rendering to mIRC-formatted lines.
//!
//! Walks a parsed [`Node`](document::Node) tree and emits the control
//! codes IRC clients understand (see `ircord_proto::format`). The output
//! bytes are a compatibility surface; changing them breaks clients that
//! were tuned against them.
//!
//! Rendering never kills a connection: structural faults while walking a
//! tree are caught in [`render_content`], logged with the raw source, and
//! the message renders as empty.

pub mod document;
pub mod highlight;

use std::fmt::Write as _;

use ircord_proto::{colors, format};
use thiserror::Error;
use tracing::warn;

use crate::remote::{Attachment, MessageKind, RemoteMessage, CDN_HOST, MEDIA_HOST};
use document::{Break, Node, Style};

/// Trees deeper than this are considered malformed.
const MAX_DEPTH: usize = 64;

/// Structural fault while walking a document tree. Never escapes
/// [`render_content`].
#[derive(Debug, Error)]
enum RenderFault {
    #[error("document nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,
}

struct Renderer {
    out: String,
    edited: bool,
    depth: usize,
}

impl Renderer {
    fn new(edited: bool) -> Self {
        Self {
            out: String::new(),
            edited,
            depth: 0,
        }
    }

    /// Walk `node`, emitting enter and exit effects. `enter_only`
    /// suppresses exit effects for the whole subtree; blockquotes use it
    /// so nested paragraphs do not force extra line breaks.
    fn walk(&mut self, node: &Node, enter_only: bool) -> Result<(), RenderFault> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(RenderFault::TooDeep);
        }
        match node {
            Node::Document(children) => {
                for child in children {
                    self.walk(child, enter_only)?;
                }
            }
            Node::Blockquote(children) => {
                for child in children {
                    self.out.push_str("\x0309>\x03 ");
                    self.walk(child, true)?;
                }
            }
            Node::Paragraph(children) => {
                for child in children {
                    self.walk(child, enter_only)?;
                }
                if !enter_only {
                    if self.edited {
                        self.out.push_str(" \x1D\x0311(edited)\x03\x1D");
                    }
                    self.out.push('\n');
                }
            }
            Node::FencedCodeBlock(lines) => self.code_block(lines),
            Node::Link {
                destination,
                children,
            } => {
                self.out.push_str("\x0302[\x03");
                for child in children {
                    self.walk(child, enter_only)?;
                }
                if !enter_only {
                    let _ = write!(self.out, " \x0302{destination}]\x03");
                }
            }
            Node::AutoLink(url) => {
                let _ = write!(self.out, "\x0302{url}\x03");
            }
            Node::Styled(style, children) => {
                self.style_toggle(*style, true);
                for child in children {
                    self.walk(child, enter_only)?;
                }
                if !enter_only {
                    self.style_toggle(*style, false);
                }
            }
            Node::Emoji(name) => {
                let _ = write!(self.out, "\x0303:{name}:\x03");
            }
            Node::ChannelMention(name) => {
                let _ = write!(self.out, "\x02\x0302#{name}\x03\x02");
            }
            Node::MemberMention(name) => {
                let _ = write!(self.out, "\x02\x0302@{name}\x03\x02");
            }
            Node::UnresolvedMention => {}
            Node::Text { value, brk } => {
                self.out.push_str(value);
                match brk {
                    Break::Hard => self.out.push_str("\n\n"),
                    Break::Soft => self.out.push('\n'),
                    Break::None => {}
                }
            }
        }
        self.depth -= 1;
        Ok(())
    }

    fn style_toggle(&mut self, style: Style, enter: bool) {
        match style {
            Style::Bold => self.out.push(format::BOLD),
            Style::Italic => self.out.push(format::ITALIC),
            Style::Underline => self.out.push(format::UNDERLINE),
            Style::Strikethrough => self.out.push(format::STRIKETHROUGH),
            Style::Monospace => self.out.push(format::MONOSPACE),
            Style::Spoiler => {
                // Foreground on matching background hides the text.
                if enter {
                    self.out.push_str(&format::color_bg(0, 0));
                } else {
                    self.out.push_str(format::RESET);
                }
            }
            Style::Quoted => {}
        }
    }

    fn code_block(&mut self, lines: &[String]) {
        let mut content = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i == 0 && line.is_empty() {
                continue;
            }
            content.push_str(line);
            content.push('\n');
        }
        let highlighted = highlight::highlight(&content);
        self.out.push(format::MONOSPACE);
        for (i, line) in highlighted.trim_matches('\n').split('\n').enumerate() {
            if i == 0 && line.is_empty() {
                continue;
            }
            self.out.push_str("\x0314>\x03 ");
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.out.push(format::MONOSPACE);
    }
}

/// Render one document tree to raw (unsplit) mIRC text.
///
/// `source` is the original markdown, kept only for the fault log.
/// `edited` appends the italic "(edited)" marker to paragraph ends.
/// Faults yield an empty string, never an error.
pub fn render_content(source: &str, root: &Node, edited: bool) -> String {
    let mut renderer = Renderer::new(edited);
    match renderer.walk(root, false) {
        Ok(()) => renderer.out,
        Err(fault) => {
            warn!(%fault, source, "failed to render message");
            String::new()
        }
    }
}

/// Render a message body plus its embeds and attachments, delivering the
/// final lines through `send` in order. Non-default messages render as
/// nothing. Callback errors abort rendering and propagate.
pub fn render_message<E>(
    tree: &Node,
    message: &RemoteMessage,
    mut send: impl FnMut(&str) -> Result<(), E>,
) -> Result<(), E> {
    if message.kind != MessageKind::Default {
        return Ok(());
    }
    let edited = message.edited_timestamp.is_some();
    let mut s = render_content(&message.content, tree, edited);

    for embed in &message.embeds {
        let mut es = String::new();
        if !embed.title.is_empty() {
            let _ = write!(es, "\x02{}\x02", embed.title);
            if !embed.url.is_empty() {
                let _ = write!(es, " \x0302{}\x03", embed.url);
            }
            es.push('\n');
        }
        if !embed.description.is_empty() {
            let tree = document::from_plain(&embed.description);
            es.push_str(&render_content(&embed.description, &tree, edited));
            es.push('\n');
        }
        for field in &embed.fields {
            let _ = write!(es, "\x1D{}:\x1D ", field.name);
            if !field.inline {
                es.push('\n');
            }
            let tree = document::from_plain(&field.value);
            es.push_str(&render_content(&field.value, &tree, edited));
            es.push('\n');
        }
        // Bar color index is deliberately not zero-padded.
        let bar = colors::nearest(embed.color);
        for (i, line) in es.trim_matches('\n').split('\n').enumerate() {
            if i == 0 && line.is_empty() {
                continue;
            }
            let _ = write!(s, "\x03{bar}\u{258C}\x03\x02\x02");
            s.push_str(line);
            s.push('\n');
        }
    }

    for attachment in &message.attachments {
        s.push_str(&render_attachment(attachment));
    }

    let trimmed = s.trim_matches('\n');
    if trimmed.is_empty() {
        return Ok(());
    }
    for line in trimmed.split('\n') {
        send(line)?;
    }
    Ok(())
}

/// One line per attachment. The proxy URL is only worth showing when it
/// is not just the direct URL with the CDN host swapped for the media
/// host.
fn render_attachment(a: &Attachment) -> String {
    let mut s = String::new();
    let _ = write!(s, "\x02{}\x02 (size: {}", a.filename, a.size);
    if a.width != 0 && a.height != 0 {
        let _ = write!(s, ", {}x{}", a.width, a.height);
    }
    let _ = write!(s, "): \x0302{}\x03", a.url);
    if a.proxy_url != a.url.replacen(CDN_HOST, MEDIA_HOST, 1) {
        let _ = write!(s, " | \x0302{}\x03", a.proxy_url);
    }
    s.push('\n');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Embed, EmbedField, Identity, Snowflake};

    fn author() -> Identity {
        Identity {
            id: Snowflake(7),
            username: "alice".into(),
            discriminator: "0001".into(),
        }
    }

    fn collect_lines(tree: &Node, message: &RemoteMessage) -> Vec<String> {
        let mut lines = Vec::new();
        render_message::<()>(tree, message, |line| {
            lines.push(line.to_owned());
            Ok(())
        })
        .unwrap();
        lines
    }

    #[test]
    fn test_bold_is_symmetric_toggle() {
        let tree = Node::Styled(Style::Bold, vec![Node::text("hi")]);
        assert_eq!(render_content("**hi**", &tree, false), "\x02hi\x02");
    }

    #[test]
    fn test_all_attribute_toggles() {
        for (style, byte) in [
            (Style::Italic, '\x1D'),
            (Style::Underline, '\x1F'),
            (Style::Strikethrough, '\x1E'),
            (Style::Monospace, '\x11'),
        ] {
            let tree = Node::Styled(style, vec![Node::text("x")]);
            assert_eq!(
                render_content("", &tree, false),
                std::format!("{byte}x{byte}")
            );
        }
    }

    #[test]
    fn test_spoiler_hides_then_resets() {
        let tree = Node::Styled(Style::Spoiler, vec![Node::text("secret")]);
        assert_eq!(render_content("", &tree, false), "\x0300,00secret\x03");
    }

    #[test]
    fn test_edited_marker_on_paragraph_exit() {
        let tree = Node::Document(vec![Node::Paragraph(vec![Node::text("hi")])]);
        assert_eq!(
            render_content("hi", &tree, true),
            "hi \x1D\x0311(edited)\x03\x1D\n"
        );
    }

    #[test]
    fn test_blockquote_marks_children_without_paragraph_breaks() {
        let tree = Node::Blockquote(vec![
            Node::Paragraph(vec![Node::text("a")]),
            Node::Paragraph(vec![Node::text("b")]),
        ]);
        assert_eq!(render_content("", &tree, false), "\x0309>\x03 a\x0309>\x03 b");
    }

    #[test]
    fn test_link_and_autolink() {
        let tree = Node::Link {
            destination: "https://example.com".into(),
            children: vec![Node::text("site")],
        };
        assert_eq!(
            render_content("", &tree, false),
            "\x0302[\x03site \x0302https://example.com]\x03"
        );
        let auto = Node::AutoLink("https://example.com".into());
        assert_eq!(
            render_content("", &auto, false),
            "\x0302https://example.com\x03"
        );
    }

    #[test]
    fn test_mentions_and_emoji() {
        assert_eq!(
            render_content("", &Node::ChannelMention("general".into()), false),
            "\x02\x0302#general\x03\x02"
        );
        assert_eq!(
            render_content("", &Node::MemberMention("alice".into()), false),
            "\x02\x0302@alice\x03\x02"
        );
        assert_eq!(
            render_content("", &Node::Emoji("wave".into()), false),
            "\x0303:wave:\x03"
        );
        assert_eq!(render_content("", &Node::UnresolvedMention, false), "");
    }

    #[test]
    fn test_code_block_lines_are_marked() {
        let tree = Node::FencedCodeBlock(vec!["plain".into()]);
        // The trailing newline is itself a (wrapped) whitespace token, so
        // its reset byte lands on a second marked line.
        assert_eq!(
            render_content("", &tree, false),
            "\x11\x0314>\x03 \x0300\x02\x02plain\x03\x0300\x02\x02\n\
             \x0314>\x03 \x03\n\x11"
        );
    }

    #[test]
    fn test_render_fault_yields_empty_output() {
        let mut tree = Node::text("deep");
        for _ in 0..100 {
            tree = Node::Styled(Style::Bold, vec![tree]);
        }
        assert_eq!(render_content("", &tree, false), "");
    }

    #[test]
    fn test_fault_delivers_zero_lines() {
        let mut tree = Node::text("deep");
        for _ in 0..100 {
            tree = Node::Styled(Style::Bold, vec![tree]);
        }
        let message =
            RemoteMessage::plain(Snowflake(1), Snowflake(10), author(), "deep");
        assert!(collect_lines(&tree, &message).is_empty());
    }

    #[test]
    fn test_blank_line_trimming() {
        let tree = Node::Document(vec![
            Node::Paragraph(vec![]),
            Node::Paragraph(vec![Node::text("mid")]),
            Node::Paragraph(vec![]),
        ]);
        let message =
            RemoteMessage::plain(Snowflake(1), Snowflake(10), author(), "mid");
        assert_eq!(collect_lines(&tree, &message), vec!["mid".to_owned()]);
    }

    #[test]
    fn test_system_messages_render_nothing() {
        let tree = document::from_plain("joined");
        let mut message =
            RemoteMessage::plain(Snowflake(1), Snowflake(10), author(), "joined");
        message.kind = MessageKind::System;
        assert!(collect_lines(&tree, &message).is_empty());
    }

    #[test]
    fn test_embed_bar_uses_nearest_palette_index() {
        let mut message =
            RemoteMessage::plain(Snowflake(1), Snowflake(10), author(), "");
        message.embeds.push(Embed {
            title: "Alert".into(),
            // Pure red; nearest palette entry is index 4.
            color: 0xFF0000,
            ..Embed::default()
        });
        let tree = document::from_plain("");
        assert_eq!(
            collect_lines(&tree, &message),
            vec!["\x034\u{258C}\x03\x02\x02\x02Alert\x02".to_owned()]
        );
    }

    #[test]
    fn test_embed_fields_inline_and_block() {
        let mut message =
            RemoteMessage::plain(Snowflake(1), Snowflake(10), author(), "");
        message.embeds.push(Embed {
            fields: vec![
                EmbedField {
                    name: "k".into(),
                    value: "v".into(),
                    inline: true,
                },
                EmbedField {
                    name: "long".into(),
                    value: "body".into(),
                    inline: false,
                },
            ],
            ..Embed::default()
        });
        let tree = document::from_plain("");
        let lines = collect_lines(&tree, &message);
        // Default accent 0x000000 maps to palette index 1 (black). The
        // blank line between fields keeps its bar prefix.
        assert_eq!(
            lines,
            vec![
                "\x031\u{258C}\x03\x02\x02\x1Dk:\x1D v".to_owned(),
                "\x031\u{258C}\x03\x02\x02".to_owned(),
                "\x031\u{258C}\x03\x02\x02\x1Dlong:\x1D ".to_owned(),
                "\x031\u{258C}\x03\x02\x02body".to_owned(),
            ]
        );
    }

    #[test]
    fn test_attachment_line() {
        let a = Attachment {
            filename: "cat.png".into(),
            size: 1234,
            width: 640,
            height: 480,
            url: format!("https://{CDN_HOST}/attachments/1/2/cat.png"),
            proxy_url: format!("https://{MEDIA_HOST}/attachments/1/2/cat.png"),
        };
        assert_eq!(
            render_attachment(&a),
            format!(
                "\x02cat.png\x02 (size: 1234, 640x480): \
                 \x0302https://{CDN_HOST}/attachments/1/2/cat.png\x03\n"
            )
        );
    }

    #[test]
    fn test_attachment_shows_divergent_proxy() {
        let a = Attachment {
            filename: "doc.txt".into(),
            size: 10,
            width: 0,
            height: 0,
            url: "https://example.com/doc.txt".into(),
            proxy_url: "https://proxy.example.net/doc.txt".into(),
        };
        assert_eq!(
            render_attachment(&a),
            "\x02doc.txt\x02 (size: 10): \x0302https://example.com/doc.txt\x03 \
             | \x0302https://proxy.example.net/doc.txt\x03\n"
        );
    }
}
