//! Core editor types: selection and inline marks.
//!
//! These types are framework-agnostic. All offsets are document character
//! offsets (see [`crate::document::RichDocument`] for the addressing scheme).

use std::ops::Range;

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Clamp both ends to `max`.
    pub fn clamp(self, max: usize) -> Self {
        Self {
            anchor: self.anchor.min(max),
            head: self.head.min(max),
        }
    }
}

/// Toggleable inline formatting.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

impl MarkKind {
    pub const ALL: [MarkKind; 5] = [
        MarkKind::Bold,
        MarkKind::Italic,
        MarkKind::Underline,
        MarkKind::Strike,
        MarkKind::Code,
    ];
}

/// Default `target` attribute for links.
pub const LINK_TARGET: &str = "_blank";
/// Default `rel` attribute for links.
pub const LINK_REL: &str = "noopener noreferrer nofollow";

/// Hyperlink mark attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub target: Option<String>,
    pub rel: Option<String>,
}

impl Link {
    /// A link with the editor's default target and rel.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            target: Some(LINK_TARGET.to_owned()),
            rel: Some(LINK_REL.to_owned()),
        }
    }
}

/// The set of marks carried by a run of text.
///
/// Stored as plain fields so equality is structural and the serialization
/// order is canonical.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub code: bool,
    pub link: Option<Link>,
}

impl Marks {
    pub fn has(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Underline => self.underline,
            MarkKind::Strike => self.strike,
            MarkKind::Code => self.code,
        }
    }

    pub fn set(&mut self, kind: MarkKind, on: bool) {
        match kind {
            MarkKind::Bold => self.bold = on,
            MarkKind::Italic => self.italic = on,
            MarkKind::Underline => self.underline = on,
            MarkKind::Strike => self.strike = on,
            MarkKind::Code => self.code = on,
        }
    }

    pub fn with(mut self, kind: MarkKind) -> Self {
        self.set(kind, true);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let sel = Selection::new(5, 10);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);

        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert_eq!(sel.len(), 5);
    }

    #[test]
    fn test_selection_collapsed() {
        let sel = Selection::collapsed(7);
        assert!(sel.is_collapsed());
        assert!(sel.is_empty());
        assert_eq!(sel.to_range(), 7..7);
    }

    #[test]
    fn test_selection_clamp() {
        let sel = Selection::new(3, 40).clamp(10);
        assert_eq!(sel, Selection::new(3, 10));
    }

    #[test]
    fn test_marks_set_and_has() {
        let mut marks = Marks::default();
        assert!(marks.is_plain());
        for kind in MarkKind::ALL {
            assert!(!marks.has(kind));
            marks.set(kind, true);
            assert!(marks.has(kind));
        }
        marks.set(MarkKind::Bold, false);
        assert!(!marks.bold);
        assert!(marks.italic);
    }

    #[test]
    fn test_link_defaults() {
        let link = Link::new("https://example.com");
        assert_eq!(link.target.as_deref(), Some("_blank"));
        assert_eq!(link.rel.as_deref(), Some(LINK_REL));
    }
}
