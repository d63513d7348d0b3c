//! notewise-editor-core: rich-text note editing without framework dependencies.
//!
//! This crate provides:
//! - `RichDocument` - flat textblocks with marked spans
//! - `Node` - the structured tree, serialized as node-type JSON
//! - HTML writer and a tolerant HTML reader
//! - `EditorCommand` + `execute_command` over `EditorState`, with undo
//! - `EditorSync` - keeps an owner's HTML and tree in step with the editor
//! - `NoteDraft` - save/load of an edited note through the notes API

pub mod actions;
pub mod document;
pub mod draft;
pub mod execute;
pub mod html;
pub mod state;
pub mod sync;
pub mod text_helpers;
pub mod tree;
pub mod types;
pub mod undo;

pub use actions::{
    BlockType, EditorCommand, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers,
};
pub use document::{Block, BlockKind, HARD_BREAK, RichDocument, Span};
pub use draft::NoteDraft;
pub use execute::execute_command;
pub use html::{parse_html, render_html};
pub use smol_str::SmolStr;
pub use state::{DEFAULT_PLACEHOLDER, EditorConfig, EditorState};
pub use sync::{ContentCallbacks, ContentSink, ContentSnapshot, EditorSync};
pub use tree::{LinkAttrs, MarkNode, Node};
pub use types::{LINK_REL, LINK_TARGET, Link, MarkKind, Marks, Selection};
pub use undo::{History, Snapshot, UndoManager};

/// Handle a keydown: run the bound command, or say how the platform should treat the key.
pub fn handle_keydown<S: ContentSink>(
    editor: &mut EditorSync<S>,
    bindings: &KeybindingConfig,
    combo: &KeyCombo,
) -> KeydownResult {
    if let Some(command) = bindings.lookup(combo) {
        editor.apply(command);
        return KeydownResult::Handled;
    }
    if combo.key.is_navigation() || combo.key.is_modifier() {
        return KeydownResult::PassThrough;
    }
    KeydownResult::NotHandled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_keydown() {
        let bindings = KeybindingConfig::default_for_platform(false);
        let mut editor = EditorSync::initialize("<p>text</p>", EditorConfig::default(), ());
        editor.apply(&EditorCommand::SelectAll);

        let ctrl_b = KeyCombo::primary(Key::character("b"), false);
        assert_eq!(handle_keydown(&mut editor, &bindings, &ctrl_b), KeydownResult::Handled);
        assert_eq!(editor.html(), "<p><strong>text</strong></p>");

        let left = KeyCombo::new(Key::ArrowLeft);
        assert_eq!(handle_keydown(&mut editor, &bindings, &left), KeydownResult::PassThrough);

        let plain = KeyCombo::new(Key::character("q"));
        assert_eq!(handle_keydown(&mut editor, &bindings, &plain), KeydownResult::NotHandled);
    }
}
