//! Structured document tree, serialized as node-type JSON.
//!
//! The JSON shape is the one note storage already uses:
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "paragraph", "content": [
//!     {"type": "text", "text": "hi", "marks": [{"type": "bold"}]}
//!   ]}
//! ]}
//! ```
//!
//! Unknown node and mark types deserialize to `Unknown` and are dropped when
//! the tree is converted into blocks.

use serde::{Deserialize, Serialize};

use crate::document::{Block, BlockKind, HARD_BREAK, RichDocument, Span};
use crate::types::{Link, Marks};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Doc {
        #[serde(default)]
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Heading {
        #[serde(default)]
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    BulletList {
        #[serde(default)]
        content: Vec<Node>,
    },
    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<Node>,
    },
    Blockquote {
        #[serde(default)]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<MarkNode>,
    },
    HardBreak {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<MarkNode>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

impl Default for HeadingAttrs {
    fn default() -> Self {
        Self { level: 1 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedListAttrs {
    pub start: u32,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        Self { start: 1 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MarkNode {
    Link { attrs: LinkAttrs },
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub href: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

impl Node {
    pub fn empty_doc() -> Self {
        Self::from_document(&RichDocument::new())
    }

    /// Derive the tree for a document.
    ///
    /// Quoted runs become one blockquote; consecutive list items of the same
    /// kind become one list.
    pub fn from_document(doc: &RichDocument) -> Self {
        let mut content = Vec::new();
        let blocks = doc.blocks();
        let mut i = 0;
        while i < blocks.len() {
            if blocks[i].quoted {
                let end = run_end(blocks, i, |b| b.quoted);
                content.push(Node::Blockquote {
                    content: group_lists(&blocks[i..end]),
                });
                i = end;
            } else {
                let end = run_end(blocks, i, |b| !b.quoted);
                content.extend(group_lists(&blocks[i..end]));
                i = end;
            }
        }
        Node::Doc { content }
    }

    /// Flatten a tree into blocks. Never returns an empty document.
    pub fn to_document(&self) -> RichDocument {
        let mut flattener = Flattener::default();
        flattener.visit(self, None, false);
        flattener.finish_implicit();
        RichDocument::from_blocks(flattener.blocks)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Doc { content }
            | Node::Paragraph { content }
            | Node::Heading { content, .. }
            | Node::BulletList { content }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::Blockquote { content } => content,
            Node::Text { .. } | Node::HardBreak { .. } | Node::Unknown => &[],
        }
    }
}

fn run_end(blocks: &[Block], start: usize, pred: impl Fn(&Block) -> bool) -> usize {
    blocks[start..]
        .iter()
        .position(|b| !pred(b))
        .map(|p| start + p)
        .unwrap_or(blocks.len())
}

fn group_lists(blocks: &[Block]) -> Vec<Node> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < blocks.len() {
        let kind = blocks[i].kind;
        if kind.is_list_item() {
            let end = run_end(blocks, i, |b| b.kind == kind);
            let items = blocks[i..end]
                .iter()
                .map(|b| Node::ListItem {
                    content: vec![Node::Paragraph {
                        content: inline_nodes(b),
                    }],
                })
                .collect();
            out.push(match kind {
                BlockKind::OrderedItem => Node::OrderedList {
                    attrs: OrderedListAttrs::default(),
                    content: items,
                },
                _ => Node::BulletList { content: items },
            });
            i = end;
        } else {
            out.push(textblock_node(&blocks[i]));
            i += 1;
        }
    }
    out
}

fn textblock_node(block: &Block) -> Node {
    let content = inline_nodes(block);
    match block.kind {
        BlockKind::Heading(level) => Node::Heading {
            attrs: HeadingAttrs { level },
            content,
        },
        _ => Node::Paragraph { content },
    }
}

fn inline_nodes(block: &Block) -> Vec<Node> {
    let mut out = Vec::new();
    for span in block.spans() {
        let marks = marks_to_nodes(&span.marks);
        for (i, piece) in span.text.split(HARD_BREAK).enumerate() {
            if i > 0 {
                out.push(Node::HardBreak {
                    marks: marks.clone(),
                });
            }
            if !piece.is_empty() {
                out.push(Node::Text {
                    text: piece.to_owned(),
                    marks: marks.clone(),
                });
            }
        }
    }
    out
}

/// Marks in canonical order: link outermost, then bold, italic, underline, strike, code.
pub fn marks_to_nodes(marks: &Marks) -> Vec<MarkNode> {
    let mut out = Vec::new();
    if let Some(link) = &marks.link {
        out.push(MarkNode::Link {
            attrs: LinkAttrs {
                href: link.href.clone(),
                target: link.target.clone(),
                rel: link.rel.clone(),
                class: None,
            },
        });
    }
    let flags = [
        (marks.bold, MarkNode::Bold),
        (marks.italic, MarkNode::Italic),
        (marks.underline, MarkNode::Underline),
        (marks.strike, MarkNode::Strike),
        (marks.code, MarkNode::Code),
    ];
    out.extend(flags.into_iter().filter(|(on, _)| *on).map(|(_, m)| m));
    out
}

pub fn marks_from_nodes(nodes: &[MarkNode]) -> Marks {
    let mut marks = Marks::default();
    for node in nodes {
        match node {
            MarkNode::Link { attrs } => {
                marks.link = Some(Link {
                    href: attrs.href.clone(),
                    target: attrs.target.clone(),
                    rel: attrs.rel.clone(),
                })
            }
            MarkNode::Bold => marks.bold = true,
            MarkNode::Italic => marks.italic = true,
            MarkNode::Underline => marks.underline = true,
            MarkNode::Strike => marks.strike = true,
            MarkNode::Code => marks.code = true,
            MarkNode::Unknown => {}
        }
    }
    marks
}

/// Walks a tree and collects flat blocks.
#[derive(Default)]
struct Flattener {
    blocks: Vec<Block>,
    /// Block opened for inline content found outside any textblock.
    implicit: Option<Block>,
}

impl Flattener {
    fn visit(&mut self, node: &Node, item: Option<BlockKind>, quoted: bool) {
        match node {
            Node::Doc { content } => self.visit_all(content, item, quoted),
            Node::Blockquote { content } => self.visit_all(content, item, true),
            Node::BulletList { content } => {
                self.visit_all(content, Some(BlockKind::BulletItem), quoted)
            }
            Node::OrderedList { content, .. } => {
                self.visit_all(content, Some(BlockKind::OrderedItem), quoted)
            }
            Node::ListItem { content } => {
                let kind = item.unwrap_or(BlockKind::BulletItem);
                self.finish_implicit();
                let before = self.blocks.len();
                self.visit_all(content, Some(kind), quoted);
                self.finish_implicit();
                if self.blocks.len() == before {
                    self.blocks.push(Block::new(kind).quoted(quoted));
                }
            }
            Node::Paragraph { content } => {
                self.finish_implicit();
                let kind = item.unwrap_or(BlockKind::Paragraph);
                self.blocks.push(textblock(kind, content, quoted));
            }
            Node::Heading { attrs, content } => {
                self.finish_implicit();
                self.blocks
                    .push(textblock(BlockKind::heading(attrs.level), content, quoted));
            }
            Node::Text { .. } | Node::HardBreak { .. } => {
                let block = self.implicit.get_or_insert_with(|| {
                    Block::new(item.unwrap_or(BlockKind::Paragraph)).quoted(quoted)
                });
                push_inline(block, node);
            }
            Node::Unknown => {}
        }
    }

    fn visit_all(&mut self, nodes: &[Node], item: Option<BlockKind>, quoted: bool) {
        for node in nodes {
            self.visit(node, item, quoted);
        }
    }

    fn finish_implicit(&mut self) {
        if let Some(block) = self.implicit.take() {
            self.blocks.push(block);
        }
    }
}

fn textblock(kind: BlockKind, content: &[Node], quoted: bool) -> Block {
    let mut block = Block::new(kind).quoted(quoted);
    for node in content {
        push_inline(&mut block, node);
    }
    block
}

fn push_inline(block: &mut Block, node: &Node) {
    match node {
        Node::Text { text, marks } => block.push_text(text, &marks_from_nodes(marks)),
        Node::HardBreak { marks } => {
            block.push_text(&HARD_BREAK.to_string(), &marks_from_nodes(marks))
        }
        _ => {}
    }
}

/// A plain paragraph holding `text`.
pub fn paragraph(text: &str) -> Block {
    Block::with_spans(BlockKind::Paragraph, vec![Span::plain(text)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarkKind;

    fn sample_doc() -> RichDocument {
        let bold = Marks::default().with(MarkKind::Bold);
        RichDocument::from_blocks(vec![
            Block::with_spans(BlockKind::Heading(2), vec![Span::plain("Notes")]),
            Block::with_spans(
                BlockKind::Paragraph,
                vec![Span::plain("plain"), Span::new("bold\nline", bold)],
            ),
            Block::with_spans(BlockKind::BulletItem, vec![Span::plain("one")]),
            Block::with_spans(BlockKind::BulletItem, vec![Span::plain("two")]),
            Block::with_spans(BlockKind::OrderedItem, vec![Span::plain("first")]).quoted(true),
            paragraph("quoted").quoted(true),
        ])
    }

    #[test]
    fn test_tree_json_snapshot() {
        let tree = Node::from_document(&sample_doc());
        insta::assert_yaml_snapshot!(tree, @r#"
        type: doc
        content:
          - type: heading
            attrs:
              level: 2
            content:
              - type: text
                text: Notes
          - type: paragraph
            content:
              - type: text
                text: plain
              - type: text
                text: bold
                marks:
                  - type: bold
              - type: hardBreak
                marks:
                  - type: bold
              - type: text
                text: line
                marks:
                  - type: bold
          - type: bulletList
            content:
              - type: listItem
                content:
                  - type: paragraph
                    content:
                      - type: text
                        text: one
              - type: listItem
                content:
                  - type: paragraph
                    content:
                      - type: text
                        text: two
          - type: blockquote
            content:
              - type: orderedList
                attrs:
                  start: 1
                content:
                  - type: listItem
                    content:
                      - type: paragraph
                        content:
                          - type: text
                            text: first
              - type: paragraph
                content:
                  - type: text
                    text: quoted
        "#);
    }

    #[test]
    fn test_tree_to_document_restores_blocks() {
        let doc = sample_doc();
        let tree = Node::from_document(&doc);
        assert_eq!(tree.to_document(), doc);
    }

    #[test]
    fn test_empty_doc_tree() {
        let tree = Node::empty_doc();
        assert_eq!(
            serde_json::to_string(&tree).unwrap(),
            r#"{"type":"doc","content":[{"type":"paragraph"}]}"#
        );
        assert!(tree.to_document().is_empty());
    }

    #[test]
    fn test_unknown_nodes_and_marks_are_dropped() {
        let json = r#"{
            "type": "doc",
            "content": [
                {"type": "image", "attrs": {"src": "x.png"}},
                {"type": "paragraph", "attrs": {"textAlign": "left"}, "content": [
                    {"type": "text", "text": "hi", "marks": [{"type": "highlight"}, {"type": "italic"}]}
                ]}
            ]
        }"#;
        let tree: Node = serde_json::from_str(json).unwrap();
        let doc = tree.to_document();
        assert_eq!(doc.blocks().len(), 1);
        let span = &doc.blocks()[0].spans()[0];
        assert_eq!(span.text, "hi");
        assert!(span.marks.italic);
        assert!(!span.marks.bold);
    }

    #[test]
    fn test_link_mark_json() {
        let json = r#"{"type":"text","text":"site","marks":[{"type":"link","attrs":{"href":"https://a.b","target":"_blank","rel":"noopener noreferrer nofollow","class":null}}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let Node::Text { marks, .. } = &node else {
            panic!("expected text node");
        };
        let marks = marks_from_nodes(marks);
        assert_eq!(marks.link, Some(Link::new("https://a.b")));
        assert_eq!(serde_json::to_string(&node).unwrap(), json);
    }

    #[test]
    fn test_nested_list_items_flatten() {
        let json = r#"{"type":"doc","content":[{"type":"bulletList","content":[
            {"type":"listItem","content":[
                {"type":"paragraph","content":[{"type":"text","text":"outer"}]},
                {"type":"orderedList","content":[
                    {"type":"listItem","content":[{"type":"paragraph","content":[{"type":"text","text":"inner"}]}]}
                ]}
            ]}
        ]}]}"#;
        let tree: Node = serde_json::from_str(json).unwrap();
        let doc = tree.to_document();
        let kinds: Vec<_> = doc.blocks().iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::BulletItem, BlockKind::OrderedItem]);
    }

    #[test]
    fn test_stray_text_in_doc_gets_paragraph() {
        let tree = Node::Doc {
            content: vec![Node::Text {
                text: "loose".into(),
                marks: vec![],
            }],
        };
        let doc = tree.to_document();
        assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
        assert_eq!(doc.blocks()[0].text(), "loose");
    }
}
