//! Command execution.
//!
//! `execute_command` is the single dispatch point for every edit. It returns
//! whether document content changed; selection moves and stored-mark toggles
//! report `false`.

use crate::actions::{BlockType, EditorCommand};
use crate::document::{BlockKind, HARD_BREAK};
use crate::state::{EditGroup, EditorState, ToggleMemo, block_matches};
use crate::text_helpers::autolink_candidate;
use crate::types::{Link, MarkKind, Marks, Selection};
use crate::undo::{Snapshot, UndoManager};

/// Execute a command against the editor state.
pub fn execute_command(state: &mut EditorState, command: &EditorCommand) -> bool {
    // A toggle repeated with nothing in between restores the state before the first.
    if let Some(memo) = state.toggle_memo.take() {
        if memo.command == *command && memo.selection_after == state.selection {
            tracing::trace!(?command, "repeated toggle reverts");
            return revert_toggle(state, memo);
        }
    }

    match command {
        EditorCommand::InsertText(text) => execute_insert_text(state, text),
        EditorCommand::InsertHardBreak => execute_insert_hard_break(state),
        EditorCommand::SplitBlock => execute_split_block(state),
        EditorCommand::DeleteBackward => execute_delete_backward(state),
        EditorCommand::DeleteForward => execute_delete_forward(state),
        EditorCommand::SetSelection(selection) => {
            state.set_selection(*selection);
            false
        }
        EditorCommand::SelectAll => {
            let len = state.doc.len_chars();
            state.set_selection(Selection::new(0, len));
            false
        }
        EditorCommand::ToggleMark(kind) => execute_toggle_mark(state, *kind),
        EditorCommand::SetBlockType(block) => execute_set_block_type(state, *block),
        EditorCommand::ToggleBlockquote => execute_toggle_blockquote(state),
        EditorCommand::SetLink { href } => execute_set_link(state, href),
        EditorCommand::Undo => state.undo(),
        EditorCommand::Redo => state.redo(),
    }
}

fn revert_toggle(state: &mut EditorState, memo: ToggleMemo) -> bool {
    state.restore(memo.before);
    state.stored_marks = memo.stored_before;
    state.group = None;
    if memo.recorded {
        state.history.discard_last();
    }
    memo.recorded
}

/// Push a history step unless the command extends the current edit group.
fn begin_edit(state: &mut EditorState, continues: Option<EditGroup>) {
    if continues.is_none() || state.group != continues {
        let before = state.snapshot();
        state.history.record(before);
    }
    state.group = None;
}

/// Remove the selected range, collapsing the cursor to its start.
fn delete_selection(state: &mut EditorState) {
    let range = state.selection.to_range();
    if !range.is_empty() {
        state.doc.delete_range(range.clone());
        state.selection = Selection::collapsed(range.start);
    }
}

fn execute_insert_text(state: &mut EditorState, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let start = state.selection.start();
    let marks = state
        .stored_marks
        .take()
        .unwrap_or_else(|| state.doc.marks_at(start));

    let continues = state
        .selection
        .is_collapsed()
        .then_some(EditGroup::Typing { cursor: start });
    begin_edit(state, continues);
    delete_selection(state);

    state.doc.insert_text(start, text, &marks);
    let cursor = start + text.chars().count();
    state.selection = Selection::collapsed(cursor);

    let trailing_ws = text.chars().rev().take_while(|c| c.is_whitespace()).count();
    if trailing_ws > 0 {
        if state.config().autolink {
            apply_autolink(state, cursor - trailing_ws);
        }
        // Words are the unit of typing undo.
        state.group = None;
    } else {
        state.group = Some(EditGroup::Typing { cursor });
    }
    true
}

/// Link the URL-like word ending at `end`, unless it is already linked.
fn apply_autolink(state: &mut EditorState, end: usize) {
    let Some((range, href)) = autolink_candidate(&state.doc, end) else {
        return;
    };
    let (b, _) = state.doc.locate(range.start);
    let base = state.doc.block_start(b);
    let already_linked = state.doc.blocks()[b].char_marks()[range.start - base..range.end - base]
        .iter()
        .any(|m| m.link.is_some());
    if already_linked {
        return;
    }
    tracing::debug!(%href, "autolink");
    let link = Link::new(href);
    state
        .doc
        .update_marks(range, |m| m.link = Some(link.clone()));
}

fn execute_insert_hard_break(state: &mut EditorState) -> bool {
    let start = state.selection.start();
    let marks = state
        .stored_marks
        .clone()
        .unwrap_or_else(|| state.doc.marks_at(start));
    begin_edit(state, None);
    delete_selection(state);
    state.doc.insert_text(start, &HARD_BREAK.to_string(), &marks);
    state.selection = Selection::collapsed(start + 1);
    true
}

fn execute_split_block(state: &mut EditorState) -> bool {
    begin_edit(state, None);
    delete_selection(state);
    let cursor = state.selection.head;
    let (b, _) = state.doc.locate(cursor);
    let block = &mut state.doc.blocks_mut()[b];
    if block.kind.is_list_item() && block.is_empty() {
        // Enter in an empty list item leaves the list.
        block.kind = BlockKind::Paragraph;
        return true;
    }
    let next = state.doc.split_block(cursor);
    state.selection = Selection::collapsed(next);
    true
}

fn execute_delete_backward(state: &mut EditorState) -> bool {
    if !state.selection.is_collapsed() {
        begin_edit(state, None);
        delete_selection(state);
        return true;
    }
    let cursor = state.selection.head;
    let (b, l) = state.doc.locate(cursor);

    if l > 0 {
        begin_edit(state, Some(EditGroup::DeletingBackward { cursor }));
        state.doc.delete_range(cursor - 1..cursor);
        state.selection = Selection::collapsed(cursor - 1);
        state.group = Some(EditGroup::DeletingBackward { cursor: cursor - 1 });
        return true;
    }

    // At the start of a block: lift out of lists and quotes before joining.
    let kind = state.doc.blocks()[b].kind;
    let quoted = state.doc.blocks()[b].quoted;
    let previous_quoted = b > 0 && state.doc.blocks()[b - 1].quoted;
    if kind.is_list_item() || (b == 0 && kind != BlockKind::Paragraph) {
        begin_edit(state, None);
        state.doc.blocks_mut()[b].kind = BlockKind::Paragraph;
        true
    } else if quoted && !previous_quoted {
        begin_edit(state, None);
        state.doc.blocks_mut()[b].quoted = false;
        true
    } else if b > 0 {
        begin_edit(state, None);
        state.doc.join_with_previous(b);
        state.selection = Selection::collapsed(cursor - 1);
        true
    } else {
        false
    }
}

fn execute_delete_forward(state: &mut EditorState) -> bool {
    if !state.selection.is_collapsed() {
        begin_edit(state, None);
        delete_selection(state);
        return true;
    }
    let cursor = state.selection.head;
    if cursor >= state.doc.len_chars() {
        return false;
    }
    let (b, l) = state.doc.locate(cursor);
    if l >= state.doc.blocks()[b].len_chars() {
        begin_edit(state, None);
        state.doc.join_with_previous(b + 1);
        return true;
    }
    begin_edit(state, Some(EditGroup::DeletingForward { cursor }));
    state.doc.delete_range(cursor..cursor + 1);
    state.group = Some(EditGroup::DeletingForward { cursor });
    true
}

fn execute_toggle_mark(state: &mut EditorState, kind: MarkKind) -> bool {
    let command = EditorCommand::ToggleMark(kind);
    let before = state.snapshot();
    let stored_before = state.stored_marks.clone();
    state.group = None;

    if state.selection.is_collapsed() {
        let mut marks = state.active_marks();
        let on = !marks.has(kind);
        marks.set(kind, on);
        state.stored_marks = Some(marks);
        state.toggle_memo = Some(ToggleMemo {
            command,
            selection_after: state.selection,
            before,
            stored_before,
            recorded: false,
        });
        return false;
    }

    let range = state.selection.to_range();
    let on = !state.doc.range_has_mark_everywhere(range.clone(), kind);
    state.doc.update_marks(range, |m| m.set(kind, on));
    finish_toggle(state, command, before, stored_before)
}

fn execute_set_block_type(state: &mut EditorState, block: BlockType) -> bool {
    let command = EditorCommand::SetBlockType(block);
    let before = state.snapshot();
    let stored_before = state.stored_marks.clone();
    state.group = None;

    let range = state.doc.blocks_in_range(state.selection.to_range());
    let all_match = state.doc.blocks()[range.clone()]
        .iter()
        .all(|b| block_matches(b.kind, block));
    // Applying a type every block already has turns them back into paragraphs.
    let target = match block {
        BlockType::Paragraph => BlockKind::Paragraph,
        _ if all_match => BlockKind::Paragraph,
        BlockType::Heading(level) => BlockKind::heading(level),
        BlockType::BulletList => BlockKind::BulletItem,
        BlockType::OrderedList => BlockKind::OrderedItem,
    };
    for b in &mut state.doc.blocks_mut()[range] {
        b.kind = target;
    }

    if block == BlockType::Paragraph {
        return record_if_changed(state, before);
    }
    finish_toggle(state, command, before, stored_before)
}

fn execute_toggle_blockquote(state: &mut EditorState) -> bool {
    let before = state.snapshot();
    let stored_before = state.stored_marks.clone();
    state.group = None;

    let range = state.doc.blocks_in_range(state.selection.to_range());
    let all_quoted = state.doc.blocks()[range.clone()].iter().all(|b| b.quoted);
    for b in &mut state.doc.blocks_mut()[range] {
        b.quoted = !all_quoted;
    }
    finish_toggle(state, EditorCommand::ToggleBlockquote, before, stored_before)
}

fn execute_set_link(state: &mut EditorState, href: &str) -> bool {
    let href = href.trim();
    let before = state.snapshot();
    state.group = None;

    let range = if state.selection.is_collapsed() {
        match state.doc.link_range_at(state.selection.head) {
            Some((range, _)) => range,
            None => {
                // No text to link: the link applies to whatever is typed next.
                let mut marks = state.active_marks();
                marks.link = (!href.is_empty()).then(|| Link::new(href));
                state.stored_marks = Some(marks);
                return false;
            }
        }
    } else {
        state.selection.to_range()
    };

    let link = (!href.is_empty()).then(|| Link::new(href));
    state.doc.update_marks(range, |m| m.link = link.clone());
    record_if_changed(state, before)
}

/// Record a history step for a toggle that may have changed the document,
/// and remember it so an immediate repeat can revert it.
fn finish_toggle(
    state: &mut EditorState,
    command: EditorCommand,
    before: Snapshot,
    stored_before: Option<Marks>,
) -> bool {
    let changed = state.doc != before.doc;
    if changed {
        state.history.record(before.clone());
    }
    state.toggle_memo = Some(ToggleMemo {
        command,
        selection_after: state.selection,
        before,
        stored_before,
        recorded: changed,
    });
    changed
}

fn record_if_changed(state: &mut EditorState, before: Snapshot) -> bool {
    let changed = state.doc != before.doc;
    if changed {
        state.history.record(before);
    }
    changed
}
