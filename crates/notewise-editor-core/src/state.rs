//! Editor state: document, selection, stored marks and history.

use serde::{Deserialize, Serialize};

use crate::actions::{BlockType, EditorCommand};
use crate::document::{BlockKind, RichDocument};
use crate::html::{parse_html, render_html};
use crate::text_helpers;
use crate::tree::Node;
use crate::types::{MarkKind, Marks, Selection};
use crate::undo::{History, Snapshot, UndoManager};

pub const DEFAULT_PLACEHOLDER: &str = "Start typing your brilliant ideas here...";

/// Editor behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Shown while the document is empty.
    pub placeholder: String,
    /// Clicking a link opens it.
    pub open_on_click: bool,
    /// Typed URLs become links once followed by whitespace.
    pub autolink: bool,
    /// Maximum number of undo steps kept.
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            open_on_click: true,
            autolink: true,
            history_depth: 100,
        }
    }
}

/// Edit group that the next command may extend instead of opening a new undo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditGroup {
    Typing { cursor: usize },
    DeletingBackward { cursor: usize },
    DeletingForward { cursor: usize },
}

/// The last toggle applied, kept so an immediate repeat can restore the
/// prior state exactly.
#[derive(Debug, Clone)]
pub(crate) struct ToggleMemo {
    pub command: EditorCommand,
    pub selection_after: Selection,
    pub before: Snapshot,
    pub stored_before: Option<Marks>,
    /// Whether the toggle pushed a history step.
    pub recorded: bool,
}

/// Complete editor state.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub(crate) doc: RichDocument,
    pub(crate) selection: Selection,
    /// Marks applied to the next typed text, set by toggling with a collapsed cursor.
    pub(crate) stored_marks: Option<Marks>,
    pub(crate) history: History,
    pub(crate) group: Option<EditGroup>,
    pub(crate) toggle_memo: Option<ToggleMemo>,
    config: EditorConfig,
}

impl EditorState {
    /// An empty document.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(RichDocument::new(), config)
    }

    /// Parse HTML content. Unparseable fragments are dropped.
    pub fn from_html(html: &str, config: EditorConfig) -> Self {
        Self::with_document(parse_html(html), config)
    }

    pub fn from_tree(tree: &Node, config: EditorConfig) -> Self {
        Self::with_document(tree.to_document(), config)
    }

    pub fn with_document(doc: RichDocument, config: EditorConfig) -> Self {
        Self {
            doc,
            selection: Selection::default(),
            stored_marks: None,
            history: History::new(config.history_depth),
            group: None,
            toggle_memo: None,
            config,
        }
    }

    pub fn doc(&self) -> &RichDocument {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&Marks> {
        self.stored_marks.as_ref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn to_tree(&self) -> Node {
        Node::from_document(&self.doc)
    }

    pub fn to_html(&self) -> String {
        render_html(&self.to_tree())
    }

    /// Replace the whole document. Selection resets to the start and history is cleared.
    pub fn replace_document(&mut self, doc: RichDocument) {
        self.doc = doc;
        self.selection = Selection::default();
        self.stored_marks = None;
        self.group = None;
        self.toggle_memo = None;
        self.history.clear();
    }

    /// Marks new text would receive at the cursor.
    pub fn active_marks(&self) -> Marks {
        self.stored_marks
            .clone()
            .unwrap_or_else(|| self.doc.marks_at(self.selection.head))
    }

    /// Whether `kind` is active for the current selection.
    ///
    /// A collapsed cursor reports the marks typing would use; a range reports
    /// whether every selected character carries the mark.
    pub fn is_mark_active(&self, kind: MarkKind) -> bool {
        if self.selection.is_collapsed() {
            self.active_marks().has(kind)
        } else {
            self.doc
                .range_has_mark_everywhere(self.selection.to_range(), kind)
        }
    }

    /// Whether every block touched by the selection has the given type.
    pub fn is_block_active(&self, block: BlockType) -> bool {
        let blocks = &self.doc.blocks()[self.doc.blocks_in_range(self.selection.to_range())];
        blocks.iter().all(|b| block_matches(b.kind, block))
    }

    /// Whether every block touched by the selection is inside a blockquote.
    pub fn is_quoted(&self) -> bool {
        let blocks = &self.doc.blocks()[self.doc.blocks_in_range(self.selection.to_range())];
        blocks.iter().all(|b| b.quoted)
    }

    /// Target of the link under the cursor.
    pub fn link_href(&self) -> Option<String> {
        self.doc
            .link_range_at(self.selection.head)
            .map(|(_, link)| link.href)
    }

    /// The URL to open when the user clicks at `offset`, if links open on click.
    pub fn click_target(&self, offset: usize) -> Option<String> {
        if !self.config.open_on_click {
            return None;
        }
        let (b, l) = self.doc.locate(offset);
        self.doc.blocks()[b]
            .marks_at(l)
            .and_then(|m| m.link.as_ref())
            .map(|link| link.href.clone())
    }

    pub fn character_count(&self) -> usize {
        text_helpers::character_count(&self.doc)
    }

    pub fn word_count(&self) -> usize {
        text_helpers::word_count(&self.doc)
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Placeholder text to show, if the document is empty.
    pub fn placeholder(&self) -> Option<&str> {
        self.is_empty().then_some(self.config.placeholder.as_str())
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            selection: self.selection,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.selection = snapshot.selection.clamp(self.doc.len_chars());
    }

    /// Move the selection. Stored marks do not survive a cursor move.
    pub(crate) fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.doc.len_chars());
        self.stored_marks = None;
        self.group = None;
    }
}

pub(crate) fn block_matches(kind: BlockKind, block: BlockType) -> bool {
    match (kind, block) {
        (BlockKind::Paragraph, BlockType::Paragraph) => true,
        (BlockKind::Heading(a), BlockType::Heading(b)) => a == b,
        (BlockKind::BulletItem, BlockType::BulletList) => true,
        (BlockKind::OrderedItem, BlockType::OrderedList) => true,
        _ => false,
    }
}

impl UndoManager for EditorState {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                self.stored_marks = None;
                self.group = None;
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                self.stored_marks = None;
                self.group = None;
                true
            }
            None => false,
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Span};
    use crate::types::Link;

    fn state_with(blocks: Vec<Block>) -> EditorState {
        EditorState::with_document(RichDocument::from_blocks(blocks), EditorConfig::default())
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.placeholder, "Start typing your brilliant ideas here...");
        assert!(config.open_on_click);
        assert!(config.autolink);
        assert_eq!(config.history_depth, 100);
    }

    #[test]
    fn test_placeholder_only_when_empty() {
        let state = EditorState::new(EditorConfig::default());
        assert_eq!(state.placeholder(), Some(DEFAULT_PLACEHOLDER));
        let state = EditorState::from_html("<p>x</p>", EditorConfig::default());
        assert_eq!(state.placeholder(), None);
    }

    #[test]
    fn test_click_target() {
        let linked = Marks::default().with_link(Link::new("https://a.b"));
        let mut state = state_with(vec![Block::with_spans(
            BlockKind::Paragraph,
            vec![Span::plain("go "), Span::new("here", linked)],
        )]);
        assert_eq!(state.click_target(4).as_deref(), Some("https://a.b"));
        assert_eq!(state.click_target(1), None);

        state.config.open_on_click = false;
        assert_eq!(state.click_target(4), None);
    }

    #[test]
    fn test_block_queries_span_selection() {
        let mut state = state_with(vec![
            Block::with_spans(BlockKind::BulletItem, vec![Span::plain("a")]).quoted(true),
            Block::with_spans(BlockKind::BulletItem, vec![Span::plain("b")]),
        ]);
        state.set_selection(Selection::new(0, 3));
        assert!(state.is_block_active(BlockType::BulletList));
        assert!(!state.is_block_active(BlockType::Paragraph));
        assert!(!state.is_quoted());

        state.set_selection(Selection::collapsed(1));
        assert!(state.is_quoted());
    }
}
