//! Two-way content synchronization between the editor and its owner.
//!
//! The owner holds the note's HTML. Every local edit pushes the new HTML and
//! tree out through a [`ContentSink`]; when the owner's HTML changes for any
//! other reason, [`EditorSync::reconcile_external_update`] pulls it back in.
//! The equality check against the editor's own output breaks the loop: an
//! echo of what the editor just emitted is a no-op.

use crate::actions::EditorCommand;
use crate::execute::execute_command;
use crate::state::{EditorConfig, EditorState};
use crate::html::{parse_html, render_html};
use crate::tree::Node;

/// Receives the editor's content after every document change.
///
/// `html_changed` is always called before `tree_changed`, and both see the
/// same document.
pub trait ContentSink {
    fn html_changed(&mut self, html: &str);
    fn tree_changed(&mut self, tree: &Node);
}

/// Unit type implementation - content changes are discarded.
impl ContentSink for () {
    fn html_changed(&mut self, _html: &str) {}
    fn tree_changed(&mut self, _tree: &Node) {}
}

/// A sink built from two closures.
pub struct ContentCallbacks<H, T> {
    pub on_html: H,
    pub on_tree: T,
}

impl<H, T> ContentCallbacks<H, T>
where
    H: FnMut(&str),
    T: FnMut(&Node),
{
    pub fn new(on_html: H, on_tree: T) -> Self {
        Self { on_html, on_tree }
    }
}

impl<H, T> ContentSink for ContentCallbacks<H, T>
where
    H: FnMut(&str),
    T: FnMut(&Node),
{
    fn html_changed(&mut self, html: &str) {
        (self.on_html)(html)
    }

    fn tree_changed(&mut self, tree: &Node) {
        (self.on_tree)(tree)
    }
}

/// Read-only view of the synchronized content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSnapshot {
    pub html: String,
    pub tree: Node,
}

/// An editor whose content is mirrored to its owner.
pub struct EditorSync<S> {
    state: EditorState,
    html: String,
    tree: Node,
    sink: S,
}

impl<S: ContentSink> EditorSync<S> {
    /// Load initial HTML. No callbacks fire.
    pub fn initialize(initial_html: &str, config: EditorConfig, sink: S) -> Self {
        Self::from_state(EditorState::from_html(initial_html, config), sink)
    }

    /// Load a stored tree. No callbacks fire.
    pub fn initialize_from_tree(tree: &Node, config: EditorConfig, sink: S) -> Self {
        Self::from_state(EditorState::from_tree(tree, config), sink)
    }

    /// Load a stored tree given as raw JSON. Invalid JSON yields an empty document.
    pub fn initialize_from_json(json: &serde_json::Value, config: EditorConfig, sink: S) -> Self {
        let tree = match serde_json::from_value::<Node>(json.clone()) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(error = %e, "stored document tree is invalid, starting empty");
                Node::empty_doc()
            }
        };
        Self::initialize_from_tree(&tree, config, sink)
    }

    fn from_state(state: EditorState, sink: S) -> Self {
        let tree = state.to_tree();
        let html = render_html(&tree);
        Self {
            state,
            html,
            tree,
            sink,
        }
    }

    /// Apply a command. If the document changed, the sink receives the new
    /// HTML and then the new tree.
    pub fn apply(&mut self, command: &EditorCommand) -> bool {
        let changed = execute_command(&mut self.state, command);
        if changed {
            self.tree = self.state.to_tree();
            self.html = render_html(&self.tree);
            tracing::trace!(len = self.html.len(), "editor content changed");
            self.sink.html_changed(&self.html);
            self.sink.tree_changed(&self.tree);
        }
        changed
    }

    /// Accept HTML set by the owner.
    ///
    /// Returns `false` when it matches the editor's current output. Otherwise
    /// the document is replaced wholesale, history is reset and the cursor
    /// moves to the start. No callbacks fire.
    pub fn reconcile_external_update(&mut self, new_html: &str) -> bool {
        if new_html == self.html {
            return false;
        }
        tracing::debug!("replacing editor content from external update");
        self.state
            .replace_document(parse_html(new_html));
        self.tree = self.state.to_tree();
        self.html = render_html(&self.tree);
        true
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            html: self.html.clone(),
            tree: self.tree.clone(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::actions::BlockType;
    use crate::types::{MarkKind, Selection};
    use crate::undo::UndoManager;

    /// Records callback order.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        trees: Vec<Node>,
    }

    impl ContentSink for Recorder {
        fn html_changed(&mut self, html: &str) {
            self.events.push(format!("html:{html}"));
        }

        fn tree_changed(&mut self, tree: &Node) {
            self.events.push("tree".to_owned());
            self.trees.push(tree.clone());
        }
    }

    fn insert(text: &str) -> EditorCommand {
        EditorCommand::InsertText(text.to_owned())
    }

    #[test]
    fn test_initialize_fires_nothing() {
        let sync = EditorSync::initialize("<p>hi</p>", EditorConfig::default(), Recorder::default());
        assert!(sync.sink().events.is_empty());
        assert_eq!(sync.html(), "<p>hi</p>");
    }

    #[test]
    fn test_bold_then_type_from_empty() {
        let mut sync = EditorSync::initialize("", EditorConfig::default(), Recorder::default());
        assert_eq!(sync.html(), "<p></p>");
        assert!(!sync.apply(&EditorCommand::ToggleMark(MarkKind::Bold)));
        assert!(sync.sink().events.is_empty());

        assert!(sync.apply(&insert("x")));
        assert!(sync.html().contains("<strong>x</strong>"));
        let events = &sync.sink().events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "html:<p><strong>x</strong></p>");
        assert_eq!(events[1], "tree");
        assert_eq!(sync.sink().trees[0], *sync.tree());
    }

    #[test]
    fn test_every_change_emits_html_then_tree() {
        let mut sync = EditorSync::initialize("<p>abc</p>", EditorConfig::default(), Recorder::default());
        sync.apply(&EditorCommand::SetSelection(Selection::collapsed(3)));
        sync.apply(&insert("d"));
        sync.apply(&EditorCommand::SplitBlock);
        sync.apply(&EditorCommand::SetBlockType(BlockType::Heading(2)));
        let events = &sync.sink().events;
        assert_eq!(events.len(), 6);
        for pair in events.chunks(2) {
            assert!(pair[0].starts_with("html:"));
            assert_eq!(pair[1], "tree");
        }
        assert_eq!(events[4], "html:<p>abcd</p><h2></h2>");
    }

    #[test]
    fn test_reconcile_equal_is_noop() {
        let mut sync = EditorSync::initialize("<p>a</p>", EditorConfig::default(), Recorder::default());
        sync.apply(&EditorCommand::SetSelection(Selection::collapsed(1)));
        sync.apply(&insert("b"));
        let current = sync.html().to_owned();
        let selection = sync.state().selection();
        assert!(!sync.reconcile_external_update(&current));
        assert_eq!(sync.state().selection(), selection);
        assert!(sync.state().can_undo());
    }

    #[test]
    fn test_reconcile_replaces_and_resets() {
        let mut sync = EditorSync::initialize("<p>a</p>", EditorConfig::default(), Recorder::default());
        sync.apply(&EditorCommand::SetSelection(Selection::collapsed(1)));
        sync.apply(&insert("b"));
        let before = sync.sink().events.len();

        assert!(sync.reconcile_external_update("<p>from server</p>"));
        assert_eq!(sync.html(), "<p>from server</p>");
        assert_eq!(sync.state().selection(), Selection::collapsed(0));
        assert!(!sync.state().can_undo());
        assert_eq!(sync.sink().events.len(), before);
    }

    #[test]
    fn test_reconcile_empty_string_clears() {
        let mut sync = EditorSync::initialize("<p>a</p>", EditorConfig::default(), ());
        assert!(sync.reconcile_external_update(""));
        assert_eq!(sync.html(), "<p></p>");
        assert!(sync.state().is_empty());
    }

    #[test]
    fn test_echo_of_own_output_does_not_loop() {
        let html = Rc::new(RefCell::new(String::new()));
        let sink_html = html.clone();
        let sink = ContentCallbacks::new(move |h: &str| *sink_html.borrow_mut() = h.to_owned(), |_: &Node| {});
        let mut sync = EditorSync::initialize("", EditorConfig::default(), sink);
        sync.apply(&insert("hello"));
        let echoed = html.borrow().clone();
        assert!(!sync.reconcile_external_update(&echoed));
    }

    #[test]
    fn test_initialize_from_invalid_json() {
        let json = serde_json::json!({"type": "doc", "content": "nope"});
        let sync = EditorSync::initialize_from_json(&json, EditorConfig::default(), ());
        assert_eq!(sync.html(), "<p></p>");
    }

    #[test]
    fn test_initialize_from_json_tree() {
        let json = serde_json::json!({
            "type": "doc",
            "content": [{"type": "heading", "attrs": {"level": 3}, "content": [{"type": "text", "text": "Hi"}]}]
        });
        let sync = EditorSync::initialize_from_json(&json, EditorConfig::default(), ());
        assert_eq!(sync.html(), "<h3>Hi</h3>");
    }

    fn mark_strategy() -> impl Strategy<Value = MarkKind> {
        prop::sample::select(MarkKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn double_toggle_mark_is_identity(
            words in prop::collection::vec("[a-z]{1,6}", 1..6),
            kind in mark_strategy(),
            a in 0usize..40,
            b in 0usize..40,
        ) {
            let html = format!("<p>{}</p>", words.join(" "));
            let mut sync = EditorSync::initialize(&html, EditorConfig::default(), ());
            let len = sync.state().doc().len_chars();
            sync.apply(&EditorCommand::SetSelection(Selection::new(a.min(len), b.min(len))));
            let before = sync.snapshot();
            sync.apply(&EditorCommand::ToggleMark(kind));
            sync.apply(&EditorCommand::ToggleMark(kind));
            prop_assert_eq!(sync.snapshot(), before);
        }

        #[test]
        fn double_toggle_block_is_identity(
            lines in prop::collection::vec("[a-z]{0,5}", 1..4),
            level in 1u8..=6,
            a in 0usize..30,
        ) {
            let html: String = lines.iter().map(|l| format!("<p>{l}</p>")).collect();
            let mut sync = EditorSync::initialize(&html, EditorConfig::default(), ());
            let len = sync.state().doc().len_chars();
            sync.apply(&EditorCommand::SetSelection(Selection::collapsed(a.min(len))));
            let before = sync.snapshot();
            for command in [
                EditorCommand::SetBlockType(BlockType::Heading(level)),
                EditorCommand::SetBlockType(BlockType::BulletList),
                EditorCommand::ToggleBlockquote,
            ] {
                sync.apply(&command);
                sync.apply(&command);
                prop_assert_eq!(&sync.snapshot(), &before);
            }
        }

        #[test]
        fn own_html_reads_back_identically(
            words in prop::collection::vec("[a-z<&>]{1,5}", 1..8),
            bold_from in 0usize..20,
        ) {
            let mut sync = EditorSync::initialize("", EditorConfig::default(), ());
            sync.apply(&EditorCommand::InsertText(words.join(" ")));
            let len = sync.state().doc().len_chars();
            sync.apply(&EditorCommand::SetSelection(Selection::new(bold_from.min(len), len)));
            sync.apply(&EditorCommand::ToggleMark(MarkKind::Bold));
            let reparsed = EditorState::from_html(sync.html(), EditorConfig::default());
            prop_assert_eq!(reparsed.to_html(), sync.html());
        }
    }
}
