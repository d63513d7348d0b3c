//! Editor commands and keyboard bindings.
//!
//! Commands are semantic operations on the document, decoupled from how
//! they're triggered (toolbar button, keyboard shortcut, text input).

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::types::{MarkKind, Selection};

/// Block-level formatting targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    /// Heading level, 1 to 6.
    Heading(u8),
    BulletList,
    OrderedList,
}

/// All editor commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    // === Text ===
    /// Insert text at the selection, replacing any selected content.
    InsertText(String),
    /// Insert a hard line break (Shift+Enter, `<br>`).
    InsertHardBreak,
    /// Split the current block (Enter).
    SplitBlock,
    /// Backspace.
    DeleteBackward,
    /// Delete key.
    DeleteForward,

    // === Selection ===
    SetSelection(Selection),
    SelectAll,

    // === Formatting ===
    /// Toggle an inline mark on the selection, or on the stored marks when collapsed.
    ToggleMark(MarkKind),
    /// Toggle the block type of every block in the selection.
    SetBlockType(BlockType),
    ToggleBlockquote,
    /// Set the link target on the selection. An empty href removes the link.
    SetLink { href: String },

    // === History ===
    Undo,
    Redo,
}

impl EditorCommand {
    /// Toggle commands that undo themselves when repeated.
    pub fn is_toggle(&self) -> bool {
        match self {
            Self::ToggleMark(_) | Self::ToggleBlockquote => true,
            Self::SetBlockType(block) => *block != BlockType::Paragraph,
            _ => false,
        }
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        Self {
            ctrl: !is_mac,
            meta: is_mac,
            ..Self::NONE
        }
    }

    /// Get the primary modifier + Shift for the platform.
    pub fn primary_shift(is_mac: bool) -> Self {
        Self {
            shift: true,
            ..Self::primary(is_mac)
        }
    }

    /// Get the primary modifier + Alt for the platform.
    pub fn primary_alt(is_mac: bool) -> Self {
        Self {
            alt: true,
            ..Self::primary(is_mac)
        }
    }
}

/// A key combination for triggering a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary_shift(is_mac),
        }
    }

    /// Character keys compare case-insensitively.
    fn normalized(&self) -> Self {
        match &self.key {
            Key::Character(s) => Self {
                key: Key::Character(SmolStr::new(s.to_lowercase())),
                modifiers: self.modifiers,
            },
            _ => self.clone(),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let the platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Keyboard shortcut table.
#[derive(Debug, Clone, Default)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorCommand>,
}

impl KeybindingConfig {
    /// The standard rich-text shortcuts for a platform.
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut config = Self::default();
        let primary = |k| KeyCombo::primary(k, is_mac);
        let primary_shift = |k| KeyCombo::primary_shift(k, is_mac);
        let primary_alt = |k| KeyCombo::with_modifiers(k, Modifiers::primary_alt(is_mac));

        config.bind(primary(ch("b")), EditorCommand::ToggleMark(MarkKind::Bold));
        config.bind(primary(ch("i")), EditorCommand::ToggleMark(MarkKind::Italic));
        config.bind(primary(ch("u")), EditorCommand::ToggleMark(MarkKind::Underline));
        config.bind(primary_shift(ch("s")), EditorCommand::ToggleMark(MarkKind::Strike));
        config.bind(primary(ch("e")), EditorCommand::ToggleMark(MarkKind::Code));
        for level in 1..=6u8 {
            config.bind(
                primary_alt(ch(&level.to_string())),
                EditorCommand::SetBlockType(BlockType::Heading(level)),
            );
        }
        config.bind(primary_alt(ch("0")), EditorCommand::SetBlockType(BlockType::Paragraph));
        config.bind(primary_shift(ch("8")), EditorCommand::SetBlockType(BlockType::BulletList));
        config.bind(primary_shift(ch("7")), EditorCommand::SetBlockType(BlockType::OrderedList));
        config.bind(primary_shift(ch("b")), EditorCommand::ToggleBlockquote);
        config.bind(primary(ch("z")), EditorCommand::Undo);
        config.bind(primary_shift(ch("z")), EditorCommand::Redo);
        config.bind(primary(ch("y")), EditorCommand::Redo);
        config.bind(primary(ch("a")), EditorCommand::SelectAll);
        config.bind(KeyCombo::new(Key::Enter), EditorCommand::SplitBlock);
        config.bind(KeyCombo::shift(Key::Enter), EditorCommand::InsertHardBreak);
        config.bind(KeyCombo::new(Key::Backspace), EditorCommand::DeleteBackward);
        config.bind(KeyCombo::new(Key::Delete), EditorCommand::DeleteForward);
        config
    }

    pub fn bind(&mut self, combo: KeyCombo, command: EditorCommand) {
        self.bindings.insert(combo.normalized(), command);
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&EditorCommand> {
        self.bindings.get(&combo.normalized())
    }
}

fn ch(s: &str) -> Key {
    Key::character(s)
}
