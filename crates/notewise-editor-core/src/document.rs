//! Rich document model: a flat sequence of textblocks carrying marked spans.
//!
//! Block structure that nests in HTML (lists, blockquotes) is stored flat:
//! each block records its own kind and whether it sits inside a blockquote,
//! and consecutive blocks are regrouped when the tree is derived.
//!
//! Addressing: document offsets count characters, with one extra position
//! between neighbouring blocks. Offset `block_start(i) + block.len_chars()`
//! is the end of block `i`; the next position is the start of block `i + 1`.
//! Hard line breaks are stored inline as [`HARD_BREAK`].

use std::ops::{Range, RangeInclusive};

use crate::types::{Link, MarkKind, Marks};

/// Inline hard line break (`<br>`).
pub const HARD_BREAK: char = '\n';

/// Textblock kinds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    /// Heading level, 1 to 6.
    Heading(u8),
    BulletItem,
    OrderedItem,
}

impl BlockKind {
    pub fn is_list_item(&self) -> bool {
        matches!(self, Self::BulletItem | Self::OrderedItem)
    }

    /// Heading with the level clamped into range.
    pub fn heading(level: u8) -> Self {
        Self::Heading(level.clamp(1, 6))
    }
}

/// A run of text sharing one set of marks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub marks: Marks,
}

impl Span {
    pub fn new(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Marks::default())
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// A textblock: paragraph, heading or list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Whether the block sits inside a blockquote.
    pub quoted: bool,
    spans: Vec<Span>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            quoted: false,
            spans: Vec::new(),
        }
    }

    pub fn paragraph() -> Self {
        Self::new(BlockKind::Paragraph)
    }

    /// Block with the given spans, normalized.
    pub fn with_spans(kind: BlockKind, spans: Vec<Span>) -> Self {
        let mut block = Self {
            kind,
            quoted: false,
            spans,
        };
        block.normalize();
        block
    }

    pub fn quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len_chars(&self) -> usize {
        self.spans.iter().map(Span::len_chars).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Append text at the end, merging with the last span when marks match.
    pub fn push_text(&mut self, text: &str, marks: &Marks) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.marks == *marks => last.text.push_str(text),
            _ => self.spans.push(Span::new(text, marks.clone())),
        }
    }

    /// Marks of the character starting at `offset`.
    pub fn marks_at(&self, offset: usize) -> Option<&Marks> {
        let mut pos = 0;
        for span in &self.spans {
            let len = span.len_chars();
            if offset < pos + len {
                return Some(&span.marks);
            }
            pos += len;
        }
        None
    }

    /// Per-character marks, in order.
    pub(crate) fn char_marks(&self) -> Vec<&Marks> {
        self.spans
            .iter()
            .flat_map(|s| std::iter::repeat_n(&s.marks, s.len_chars()))
            .collect()
    }

    pub(crate) fn insert(&mut self, offset: usize, text: &str, marks: &Marks) {
        if text.is_empty() {
            return;
        }
        let idx = self.split_at_char(offset);
        self.spans.insert(idx, Span::new(text, marks.clone()));
        self.normalize();
    }

    pub(crate) fn delete(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let start = self.split_at_char(range.start);
        let end = self.split_at_char(range.end);
        self.spans.drain(start..end);
        self.normalize();
    }

    /// Split the block's spans at `offset`, returning the tail.
    pub(crate) fn split_off(&mut self, offset: usize) -> Vec<Span> {
        let idx = self.split_at_char(offset);
        let tail = self.spans.split_off(idx);
        self.normalize();
        tail
    }

    pub(crate) fn append(&mut self, spans: Vec<Span>) {
        self.spans.extend(spans);
        self.normalize();
    }

    pub(crate) fn update_marks(&mut self, range: Range<usize>, mut f: impl FnMut(&mut Marks)) {
        if range.start >= range.end {
            return;
        }
        let start = self.split_at_char(range.start);
        let end = self.split_at_char(range.end);
        for span in &mut self.spans[start..end] {
            f(&mut span.marks);
        }
        self.normalize();
    }

    /// Ensure a span boundary at `offset`; returns the index of the span starting there.
    fn split_at_char(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.spans.len() {
            if offset == pos {
                return i;
            }
            let len = self.spans[i].len_chars();
            if offset < pos + len {
                let local = offset - pos;
                let byte = byte_index(&self.spans[i].text, local);
                let tail = self.spans[i].text.split_off(byte);
                let marks = self.spans[i].marks.clone();
                self.spans.insert(i + 1, Span::new(tail, marks));
                return i + 1;
            }
            pos += len;
        }
        self.spans.len()
    }

    /// Drop empty spans and merge neighbours with equal marks.
    fn normalize(&mut self) {
        let mut out: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if span.text.is_empty() {
                continue;
            }
            match out.last_mut() {
                Some(prev) if prev.marks == span.marks => prev.text.push_str(&span.text),
                _ => out.push(span),
            }
        }
        self.spans = out;
    }
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// The editable document. Always holds at least one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichDocument {
    blocks: Vec<Block>,
}

impl Default for RichDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl RichDocument {
    /// An empty document: one empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::paragraph()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            Self::new()
        } else {
            Self { blocks }
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Total length in document offsets.
    pub fn len_chars(&self) -> usize {
        let text: usize = self.blocks.iter().map(Block::len_chars).sum();
        text + self.blocks.len() - 1
    }

    /// True for a single empty paragraph.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1
            && self.blocks[0].kind == BlockKind::Paragraph
            && self.blocks[0].is_empty()
    }

    /// Document offset where block `idx` starts.
    pub fn block_start(&self, idx: usize) -> usize {
        self.blocks[..idx.min(self.blocks.len())]
            .iter()
            .map(|b| b.len_chars() + 1)
            .sum()
    }

    /// Map a document offset to `(block index, offset within block)`.
    ///
    /// Offsets past the end clamp to the end of the last block.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let mut pos = 0;
        for (i, block) in self.blocks.iter().enumerate() {
            let len = block.len_chars();
            if offset <= pos + len {
                return (i, offset.saturating_sub(pos));
            }
            pos += len + 1;
        }
        let last = self.blocks.len() - 1;
        (last, self.blocks[last].len_chars())
    }

    /// Indices of the blocks touched by a range.
    pub fn blocks_in_range(&self, range: Range<usize>) -> RangeInclusive<usize> {
        let (start, _) = self.locate(range.start);
        let (end, _) = self.locate(range.end.max(range.start));
        start..=end
    }

    /// Text of all blocks joined with `block_separator`.
    pub fn text_with_separator(&self, block_separator: &str) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join(block_separator)
    }

    /// Marks new text inherits when typed at `offset`.
    ///
    /// Follows the character before the cursor. Links are not inclusive: they
    /// only carry over when the cursor sits strictly inside one.
    pub fn marks_at(&self, offset: usize) -> Marks {
        let (b, l) = self.locate(offset);
        let block = &self.blocks[b];
        if l == 0 {
            let mut marks = block.marks_at(0).cloned().unwrap_or_default();
            marks.link = None;
            return marks;
        }
        let mut marks = block.marks_at(l - 1).cloned().unwrap_or_default();
        if marks.link.is_some() {
            let next_link = block.marks_at(l).and_then(|m| m.link.as_ref());
            if next_link != marks.link.as_ref() {
                marks.link = None;
            }
        }
        marks
    }

    /// Apply `f` to every block-local slice of `range`.
    fn for_each_block_slice(&self, range: Range<usize>, mut f: impl FnMut(usize, Range<usize>)) {
        if range.start >= range.end {
            return;
        }
        let (sb, sl) = self.locate(range.start);
        let (eb, el) = self.locate(range.end);
        for b in sb..=eb {
            let start = if b == sb { sl } else { 0 };
            let end = if b == eb {
                el
            } else {
                self.blocks[b].len_chars()
            };
            f(b, start..end);
        }
    }

    /// True when every character in `range` carries `kind`.
    ///
    /// Block separators are ignored. An empty range, or one covering no
    /// characters, is never fully marked.
    pub fn range_has_mark_everywhere(&self, range: Range<usize>, kind: MarkKind) -> bool {
        let mut seen = false;
        let mut all = true;
        self.for_each_block_slice(range, |b, local| {
            let marks = self.blocks[b].char_marks();
            for m in &marks[local.start.min(marks.len())..local.end.min(marks.len())] {
                seen = true;
                all &= m.has(kind);
            }
        });
        seen && all
    }

    /// The contiguous link span around `offset`, if the cursor touches one.
    pub fn link_range_at(&self, offset: usize) -> Option<(Range<usize>, Link)> {
        let (b, l) = self.locate(offset);
        let marks = self.blocks[b].char_marks();
        let probe = [Some(l), l.checked_sub(1)]
            .into_iter()
            .flatten()
            .find(|&i| marks.get(i).is_some_and(|m| m.link.is_some()))?;
        let link = marks[probe].link.clone()?;
        let same = |i: usize| marks[i].link.as_ref() == Some(&link);
        let mut start = probe;
        while start > 0 && same(start - 1) {
            start -= 1;
        }
        let mut end = probe + 1;
        while end < marks.len() && same(end) {
            end += 1;
        }
        let base = self.block_start(b);
        Some((base + start..base + end, link))
    }

    pub(crate) fn insert_text(&mut self, offset: usize, text: &str, marks: &Marks) {
        let (b, l) = self.locate(offset);
        self.blocks[b].insert(l, text, marks);
    }

    pub(crate) fn delete_range(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let (sb, sl) = self.locate(range.start);
        let (eb, el) = self.locate(range.end);
        if sb == eb {
            self.blocks[sb].delete(sl..el);
            return;
        }
        let tail = self.blocks[eb].split_off(el);
        let start_len = self.blocks[sb].len_chars();
        self.blocks[sb].delete(sl..start_len);
        self.blocks[sb].append(tail);
        self.blocks.drain(sb + 1..=eb);
    }

    /// Split the block containing `offset`. Returns the start offset of the new block.
    ///
    /// Splitting at the end of a heading starts a paragraph; everything else
    /// continues with the same kind.
    pub(crate) fn split_block(&mut self, offset: usize) -> usize {
        let (b, l) = self.locate(offset);
        let at_end = l >= self.blocks[b].len_chars();
        let tail = self.blocks[b].split_off(l);
        let kind = match self.blocks[b].kind {
            BlockKind::Heading(_) if at_end => BlockKind::Paragraph,
            kind => kind,
        };
        let new_block = Block::with_spans(kind, tail).quoted(self.blocks[b].quoted);
        self.blocks.insert(b + 1, new_block);
        self.block_start(b + 1)
    }

    /// Merge block `idx` into the block before it.
    pub(crate) fn join_with_previous(&mut self, idx: usize) {
        if idx == 0 || idx >= self.blocks.len() {
            return;
        }
        let block = self.blocks.remove(idx);
        self.blocks[idx - 1].append(block.spans);
    }

    pub(crate) fn update_marks(&mut self, range: Range<usize>, mut f: impl FnMut(&mut Marks)) {
        let mut slices = Vec::new();
        self.for_each_block_slice(range, |b, local| slices.push((b, local)));
        for (b, local) in slices {
            self.blocks[b].update_marks(local, &mut f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(paragraphs: &[&str]) -> RichDocument {
        RichDocument::from_blocks(
            paragraphs
                .iter()
                .map(|t| Block::with_spans(BlockKind::Paragraph, vec![Span::plain(*t)]))
                .collect(),
        )
    }

    #[test]
    fn test_empty_document() {
        let d = RichDocument::new();
        assert!(d.is_empty());
        assert_eq!(d.len_chars(), 0);
        assert_eq!(d.locate(0), (0, 0));
        assert_eq!(RichDocument::from_blocks(vec![]), d);
    }

    #[test]
    fn test_locate_across_blocks() {
        // "abc" | "de"
        let d = doc(&["abc", "de"]);
        assert_eq!(d.len_chars(), 6);
        assert_eq!(d.locate(3), (0, 3));
        assert_eq!(d.locate(4), (1, 0));
        assert_eq!(d.locate(6), (1, 2));
        assert_eq!(d.locate(99), (1, 2));
        assert_eq!(d.block_start(1), 4);
    }

    #[test]
    fn test_insert_and_merge_spans() {
        let mut d = doc(&["hello"]);
        d.insert_text(5, " world", &Marks::default());
        assert_eq!(d.blocks()[0].spans().len(), 1);
        assert_eq!(d.blocks()[0].text(), "hello world");

        d.insert_text(0, "¡", &Marks::default().with(MarkKind::Bold));
        assert_eq!(d.blocks()[0].spans().len(), 2);
        assert_eq!(d.blocks()[0].text(), "¡hello world");
    }

    #[test]
    fn test_delete_across_blocks_merges() {
        let mut d = doc(&["abc", "def", "ghi"]);
        // delete "c" .. "g" -> "ab" + "hi"
        d.delete_range(2..9);
        assert_eq!(d.blocks().len(), 1);
        assert_eq!(d.blocks()[0].text(), "abhi");
    }

    #[test]
    fn test_split_heading_at_end_makes_paragraph() {
        let mut d = RichDocument::from_blocks(vec![Block::with_spans(
            BlockKind::Heading(1),
            vec![Span::plain("Title")],
        )]);
        let next = d.split_block(5);
        assert_eq!(next, 6);
        assert_eq!(d.blocks()[0].kind, BlockKind::Heading(1));
        assert_eq!(d.blocks()[1].kind, BlockKind::Paragraph);

        let mut d = RichDocument::from_blocks(vec![Block::with_spans(
            BlockKind::Heading(2),
            vec![Span::plain("Title")],
        )]);
        d.split_block(2);
        assert_eq!(d.blocks()[1].kind, BlockKind::Heading(2));
        assert_eq!(d.blocks()[1].text(), "tle");
    }

    #[test]
    fn test_split_preserves_quote_and_list() {
        let mut d = RichDocument::from_blocks(vec![
            Block::with_spans(BlockKind::BulletItem, vec![Span::plain("one")]).quoted(true),
        ]);
        d.split_block(3);
        assert_eq!(d.blocks()[1].kind, BlockKind::BulletItem);
        assert!(d.blocks()[1].quoted);
    }

    #[test]
    fn test_range_has_mark_everywhere() {
        let bold = Marks::default().with(MarkKind::Bold);
        let d = RichDocument::from_blocks(vec![Block::with_spans(
            BlockKind::Paragraph,
            vec![Span::new("ab", bold.clone()), Span::plain("cd")],
        )]);
        assert!(d.range_has_mark_everywhere(0..2, MarkKind::Bold));
        assert!(!d.range_has_mark_everywhere(0..3, MarkKind::Bold));
        assert!(!d.range_has_mark_everywhere(1..1, MarkKind::Bold));
    }

    #[test]
    fn test_marks_at_excludes_link_at_edge() {
        let linked = Marks::default().with_link(Link::new("https://a.b"));
        let d = RichDocument::from_blocks(vec![Block::with_spans(
            BlockKind::Paragraph,
            vec![Span::new("link", linked), Span::plain(" after")],
        )]);
        assert!(d.marks_at(2).link.is_some());
        assert!(d.marks_at(4).link.is_none());
        assert!(d.marks_at(0).link.is_none());
    }

    #[test]
    fn test_link_range_at() {
        let linked = Marks::default().with_link(Link::new("https://a.b"));
        let d = RichDocument::from_blocks(vec![
            Block::paragraph(),
            Block::with_spans(
                BlockKind::Paragraph,
                vec![Span::plain("see "), Span::new("docs", linked), Span::plain("!")],
            ),
        ]);
        let (range, link) = d.link_range_at(7).unwrap();
        assert_eq!(range, 5..9);
        assert_eq!(link.href, "https://a.b");
        // just after the link still finds it
        assert_eq!(d.link_range_at(9).map(|(r, _)| r), Some(5..9));
        assert!(d.link_range_at(2).is_none());
    }

    #[test]
    fn test_update_marks_across_blocks() {
        let mut d = doc(&["abc", "def"]);
        d.update_marks(1..6, |m| m.italic = true);
        let first = &d.blocks()[0];
        assert_eq!(first.spans().len(), 2);
        assert!(first.spans()[1].marks.italic);
        assert_eq!(first.spans()[1].text, "bc");
        let second = &d.blocks()[1];
        assert_eq!(second.spans()[0].text, "de");
        assert!(second.spans()[0].marks.italic);
        assert!(!second.spans()[1].marks.italic);
    }
}
