use core::convert::Infallible;
use std::fmt;

use markdown_weaver_escape::{StrWrite, escape_href, escape_html, escape_html_body_text};

use crate::tree::{MarkNode, Node, marks_from_nodes, marks_to_nodes};

/// Render a document tree as HTML.
pub fn render_html(node: &Node) -> String {
    let mut writer = HtmlWriter::new();
    match writer.write_node(node) {
        Ok(()) => writer.into_string(),
        Err(never) => match never {},
    }
}

type WriteResult = Result<(), Infallible>;

/// HTML output buffer. Writes cannot fail.
#[derive(Debug, Clone, Default)]
pub struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    pub fn write_node(&mut self, node: &Node) -> WriteResult {
        match node {
            Node::Doc { content } => self.write_blocks(content),
            Node::Paragraph { content } => {
                self.write_str("<p>")?;
                self.write_inline(content)?;
                self.write_str("</p>")
            }
            Node::Heading { attrs, content } => {
                let level = attrs.level.clamp(1, 6);
                write!(self, "<h{level}>")?;
                self.write_inline(content)?;
                write!(self, "</h{level}>")
            }
            Node::BulletList { content } => {
                self.write_str("<ul>")?;
                self.write_blocks(content)?;
                self.write_str("</ul>")
            }
            Node::OrderedList { attrs, content } => {
                if attrs.start == 1 {
                    self.write_str("<ol>")?;
                } else {
                    write!(self, "<ol start=\"{}\">", attrs.start)?;
                }
                self.write_blocks(content)?;
                self.write_str("</ol>")
            }
            Node::ListItem { content } => {
                self.write_str("<li>")?;
                self.write_blocks(content)?;
                self.write_str("</li>")
            }
            Node::Blockquote { content } => {
                self.write_str("<blockquote>")?;
                self.write_blocks(content)?;
                self.write_str("</blockquote>")
            }
            Node::Text { .. } | Node::HardBreak { .. } => self.write_inline(std::slice::from_ref(node)),
            Node::Unknown => Ok(()),
        }
    }

    fn write_blocks(&mut self, nodes: &[Node]) -> WriteResult {
        for node in nodes {
            self.write_node(node)?;
        }
        Ok(())
    }

    /// Write inline content, keeping marks shared by neighbouring nodes open.
    fn write_inline(&mut self, nodes: &[Node]) -> WriteResult {
        let mut open: Vec<MarkNode> = Vec::new();
        for node in nodes {
            let (marks, text) = match node {
                Node::Text { text, marks } => (marks, Some(text.as_str())),
                Node::HardBreak { marks } => (marks, None),
                _ => continue,
            };
            let marks = marks_to_nodes(&marks_from_nodes(marks));
            let shared = open
                .iter()
                .zip(&marks)
                .take_while(|(a, b)| a == b)
                .count();
            while open.len() > shared {
                if let Some(mark) = open.pop() {
                    self.close_mark(&mark)?;
                }
            }
            for mark in &marks[shared..] {
                self.open_mark(mark)?;
                open.push(mark.clone());
            }
            match text {
                Some(text) => escape_html_body_text(&mut *self, text)?,
                None => self.write_str("<br>")?,
            }
        }
        while let Some(mark) = open.pop() {
            self.close_mark(&mark)?;
        }
        Ok(())
    }

    fn open_mark(&mut self, mark: &MarkNode) -> WriteResult {
        match mark {
            MarkNode::Link { attrs } => {
                self.write_str("<a")?;
                if let Some(target) = &attrs.target {
                    self.write_str(" target=\"")?;
                    escape_html(&mut *self, target)?;
                    self.write_str("\"")?;
                }
                if let Some(rel) = &attrs.rel {
                    self.write_str(" rel=\"")?;
                    escape_html(&mut *self, rel)?;
                    self.write_str("\"")?;
                }
                self.write_str(" href=\"")?;
                escape_href(&mut *self, &attrs.href)?;
                self.write_str("\">")
            }
            MarkNode::Bold => self.write_str("<strong>"),
            MarkNode::Italic => self.write_str("<em>"),
            MarkNode::Underline => self.write_str("<u>"),
            MarkNode::Strike => self.write_str("<s>"),
            MarkNode::Code => self.write_str("<code>"),
            MarkNode::Unknown => Ok(()),
        }
    }

    fn close_mark(&mut self, mark: &MarkNode) -> WriteResult {
        match mark {
            MarkNode::Link { .. } => self.write_str("</a>"),
            MarkNode::Bold => self.write_str("</strong>"),
            MarkNode::Italic => self.write_str("</em>"),
            MarkNode::Underline => self.write_str("</u>"),
            MarkNode::Strike => self.write_str("</s>"),
            MarkNode::Code => self.write_str("</code>"),
            MarkNode::Unknown => Ok(()),
        }
    }
}

impl StrWrite for HtmlWriter {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> WriteResult {
        self.out.push_str(s);
        Ok(())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> WriteResult {
        self.out.push_str(&fmt::format(args));
        Ok(())
    }
}
