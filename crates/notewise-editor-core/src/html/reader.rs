//! Tolerant HTML reader.
//!
//! Understands the tag set the editor writes (plus common aliases such as
//! `<b>`, `<i>`, `<div>`). Unknown tags are skipped but their text is kept,
//! `<script>`/`<style>` bodies are dropped, and malformed tails are ignored.

use std::borrow::Cow;

use crate::document::{Block, BlockKind, HARD_BREAK, RichDocument};
use crate::types::{Link, MarkKind, Marks};

/// Parse HTML into a document. Never fails; unparseable input yields an
/// empty document.
pub fn parse_html(html: &str) -> RichDocument {
    let mut reader = Reader::default();
    for token in Tokenizer::new(html) {
        reader.token(token);
    }
    reader.finish()
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Close {
        name: String,
    },
    Text(&'a str),
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Parse a tag starting at `self.pos` (which points at `<`).
    fn tag(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            self.pos += end;
            return None;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            self.pos += end;
            return None;
        }

        let closing = rest.starts_with("</");
        let name_start = if closing { 2 } else { 1 };
        let name_len = rest[name_start..]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len() - name_start);
        let name = rest[name_start..name_start + name_len].to_ascii_lowercase();

        let Some(end) = find_tag_end(&rest[name_start + name_len..]) else {
            // Unterminated tag: drop the remainder.
            self.pos = self.src.len();
            return None;
        };
        let attr_src = &rest[name_start + name_len..name_start + name_len + end];
        self.pos += name_start + name_len + end + 1;

        if closing {
            Some(Token::Close { name })
        } else {
            Some(Token::Open {
                name,
                attrs: parse_attrs(attr_src),
            })
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if let Some(stripped) = rest.strip_prefix('<') {
                let is_tag = stripped.starts_with(|c: char| {
                    c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?'
                });
                if is_tag {
                    match self.tag() {
                        Some(token) => return Some(token),
                        None => continue,
                    }
                }
                // A lone '<' is text.
                let end = stripped.find('<').map(|i| i + 1).unwrap_or(rest.len());
                self.pos += end;
                return Some(Token::Text(&rest[..end]));
            }
            let end = rest.find('<').unwrap_or(rest.len());
            self.pos += end;
            return Some(Token::Text(&rest[..end]));
        }
        None
    }
}

/// Index of the `>` closing a tag, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attrs(src: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() || c == '/' {
            chars.next();
            continue;
        }
        let mut name_end = src.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' || c == '/' {
                name_end = i;
                break;
            }
            chars.next();
        }
        let name = src[start..name_end].to_ascii_lowercase();
        while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
            chars.next();
        }
        let mut value = String::new();
        if chars.peek().is_some_and(|&(_, c)| c == '=') {
            chars.next();
            while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
                chars.next();
            }
            match chars.peek().map(|&(_, c)| c) {
                Some(q @ ('"' | '\'')) => {
                    chars.next();
                    for (_, c) in chars.by_ref() {
                        if c == q {
                            break;
                        }
                        value.push(c);
                    }
                }
                _ => {
                    while let Some(&(_, c)) = chars.peek() {
                        if c.is_whitespace() {
                            break;
                        }
                        value.push(c);
                        chars.next();
                    }
                }
            }
        }
        if !name.is_empty() {
            attrs.push((name, decode_entities(&value).into_owned()));
        }
    }
    attrs
}

/// Decode character references. Unknown references are kept literally.
pub(crate) fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|&i| i <= 10).and_then(|semi| {
            decode_entity(&tail[1..semi]).map(|c| (c, semi))
        }) {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => return None,
    })
}

/// Inline formatting a tag contributes.
#[derive(Debug, Clone)]
enum MarkEffect {
    Set(MarkKind),
    Link(Link),
    None,
}

struct OpenBlock {
    block: Block,
    /// Opened for loose content rather than by an explicit block tag.
    implicit: bool,
}

#[derive(Default)]
struct Reader {
    blocks: Vec<Block>,
    current: Option<OpenBlock>,
    marks: Vec<(String, MarkEffect)>,
    lists: Vec<BlockKind>,
    list_item_depth: usize,
    quote_depth: usize,
    /// Depth inside elements whose content is discarded.
    skip_depth: usize,
    pre_depth: usize,
    /// Collapsed whitespace waiting for the next word.
    pending_space: bool,
}

impl Reader {
    fn token(&mut self, token: Token<'_>) {
        match token {
            Token::Open { name, attrs } => self.open(name, attrs),
            Token::Close { name } => self.close(&name),
            Token::Text(text) => {
                if self.skip_depth == 0 {
                    self.text(&decode_entities(text));
                }
            }
        }
    }

    fn open(&mut self, name: String, attrs: Vec<(String, String)>) {
        if matches!(name.as_str(), "script" | "style" | "head" | "title") {
            self.skip_depth += 1;
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        match name.as_str() {
            "p" | "div" => self.start_block(BlockKind::Paragraph, false),
            "pre" => {
                self.pre_depth += 1;
                self.start_block(BlockKind::Paragraph, false);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name.as_bytes()[1] - b'0';
                self.finish_block();
                self.open_block(BlockKind::heading(level), false);
            }
            "ul" => {
                self.finish_block();
                self.lists.push(BlockKind::BulletItem);
            }
            "ol" => {
                self.finish_block();
                self.lists.push(BlockKind::OrderedItem);
            }
            "li" => {
                self.finish_block();
                self.list_item_depth += 1;
                self.start_block(BlockKind::Paragraph, true);
            }
            "blockquote" => {
                self.finish_block();
                self.quote_depth += 1;
            }
            "hr" => self.finish_block(),
            "br" => {
                self.ensure_block();
                self.pending_space = false;
                let marks = self.current_marks();
                if let Some(open) = &mut self.current {
                    open.block.push_text(&HARD_BREAK.to_string(), &marks);
                }
            }
            "strong" | "b" => self.marks.push((name, MarkEffect::Set(MarkKind::Bold))),
            "em" | "i" => self.marks.push((name, MarkEffect::Set(MarkKind::Italic))),
            "u" => self.marks.push((name, MarkEffect::Set(MarkKind::Underline))),
            "s" | "strike" | "del" => self.marks.push((name, MarkEffect::Set(MarkKind::Strike))),
            "code" => self.marks.push((name, MarkEffect::Set(MarkKind::Code))),
            "a" => {
                let attr = |key: &str| {
                    attrs
                        .iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.clone())
                };
                let effect = match attr("href") {
                    Some(href) => MarkEffect::Link(Link {
                        href,
                        target: attr("target"),
                        rel: attr("rel"),
                    }),
                    None => MarkEffect::None,
                };
                self.marks.push((name, effect));
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if matches!(name, "script" | "style" | "head" | "title") {
            self.skip_depth = self.skip_depth.saturating_sub(1);
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        match name {
            "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.finish_block(),
            "pre" => {
                self.finish_block();
                self.pre_depth = self.pre_depth.saturating_sub(1);
            }
            "li" => {
                self.finish_block();
                self.list_item_depth = self.list_item_depth.saturating_sub(1);
            }
            "ul" | "ol" => {
                self.finish_block();
                self.lists.pop();
            }
            "blockquote" => {
                self.finish_block();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            _ => {
                if let Some(idx) = self.marks.iter().rposition(|(n, _)| n == name) {
                    self.marks.remove(idx);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.pre_depth > 0 {
            self.ensure_block();
            let marks = self.current_marks();
            let text = text.replace("\r\n", "\n");
            if let Some(open) = &mut self.current {
                open.block.push_text(&text, &marks);
            }
            return;
        }

        for piece in split_whitespace_runs(text) {
            match piece {
                Piece::Soft => {
                    let has_text = self.current.as_ref().is_some_and(|o| !o.block.is_empty());
                    self.pending_space = has_text;
                }
                Piece::Text(word) => {
                    self.ensure_block();
                    let marks = self.current_marks();
                    let pending = std::mem::take(&mut self.pending_space);
                    if let Some(open) = &mut self.current {
                        if pending {
                            open.block.push_text(" ", &marks);
                        }
                        open.block.push_text(word, &marks);
                    }
                }
            }
        }
    }

    fn current_marks(&self) -> Marks {
        let mut marks = Marks::default();
        for (_, effect) in &self.marks {
            match effect {
                MarkEffect::Set(kind) => marks.set(*kind, true),
                MarkEffect::Link(link) => marks.link = Some(link.clone()),
                MarkEffect::None => {}
            }
        }
        marks
    }

    /// Kind for a block opened in the current context.
    fn context_kind(&self, kind: BlockKind) -> BlockKind {
        if self.list_item_depth > 0 && kind == BlockKind::Paragraph {
            self.lists.last().copied().unwrap_or(BlockKind::BulletItem)
        } else {
            kind
        }
    }

    fn start_block(&mut self, kind: BlockKind, implicit: bool) {
        self.finish_block();
        self.open_block(self.context_kind(kind), implicit);
    }

    fn open_block(&mut self, kind: BlockKind, implicit: bool) {
        self.pending_space = false;
        self.current = Some(OpenBlock {
            block: Block::new(kind).quoted(self.quote_depth > 0),
            implicit,
        });
    }

    fn ensure_block(&mut self) {
        if self.current.is_none() {
            self.open_block(self.context_kind(BlockKind::Paragraph), true);
        }
    }

    fn finish_block(&mut self) {
        self.pending_space = false;
        if let Some(open) = self.current.take() {
            if open.implicit && open.block.is_empty() {
                return;
            }
            self.blocks.push(open.block);
        }
    }

    fn finish(mut self) -> RichDocument {
        self.finish_block();
        RichDocument::from_blocks(self.blocks)
    }
}

enum Piece<'a> {
    /// Whitespace that collapses to at most one space.
    Soft,
    Text(&'a str),
}

/// Split text so runs of whitespace containing a line break or tab become
/// [`Piece::Soft`]; plain spaces stay inside text pieces.
fn split_whitespace_runs(text: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            let run_start = i;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let run = &bytes[run_start..i];
            if run.iter().any(|b| matches!(b, b'\n' | b'\r' | b'\t' | b'\x0c')) {
                if run_start > start {
                    out.push(Piece::Text(&text[start..run_start]));
                }
                out.push(Piece::Soft);
                start = i;
            }
        } else {
            i += 1;
        }
    }
    if start < text.len() {
        out.push(Piece::Text(&text[start..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::render_html;
    use crate::tree::Node;

    fn texts(doc: &RichDocument) -> Vec<String> {
        doc.blocks().iter().map(Block::text).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_html("").is_empty());
        assert!(parse_html("<p></p>").is_empty());
        assert!(parse_html("   \n ").is_empty());
    }

    #[test]
    fn test_plain_text_becomes_paragraph() {
        let doc = parse_html("hello world");
        assert_eq!(texts(&doc), vec!["hello world"]);
        assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_marks_and_aliases() {
        let doc = parse_html("<p><b>bold</b> <i>it</i> <strike>x</strike></p>");
        let spans = doc.blocks()[0].spans();
        assert!(spans[0].marks.bold);
        assert_eq!(spans[0].text, "bold");
        assert!(spans[2].marks.italic);
        assert!(spans[4].marks.strike);
    }

    #[test]
    fn test_formatted_whitespace_collapses() {
        let doc = parse_html("<ul>\n  <li>\n    <p>one</p>\n  </li>\n  <li>two\n  words</li>\n</ul>\n");
        assert_eq!(texts(&doc), vec!["one", "two words"]);
        assert!(doc.blocks().iter().all(|b| b.kind == BlockKind::BulletItem));
    }

    #[test]
    fn test_entities_decode() {
        let doc = parse_html("<p>a &amp; b &lt;c&gt; &#39;d&#x27; &bogus;</p>");
        assert_eq!(texts(&doc), vec!["a & b <c> 'd' &bogus;"]);
    }

    #[test]
    fn test_script_dropped_and_unknown_tags_keep_text() {
        let doc = parse_html("<script>alert(1)</script><section><span>kept</span></section>");
        assert_eq!(texts(&doc), vec!["kept"]);
    }

    #[test]
    fn test_unterminated_tag_is_dropped() {
        let doc = parse_html("<p>fine</p><p class=\"x");
        assert_eq!(texts(&doc), vec!["fine"]);
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let doc = parse_html("<p>1 < 2</p>");
        assert_eq!(texts(&doc), vec!["1 < 2"]);
    }

    #[test]
    fn test_link_attributes_read() {
        let doc = parse_html("<p><a href=\"https://a.b/?x=1&amp;y=2\" target=_blank>go</a></p>");
        let link = doc.blocks()[0].spans()[0].marks.link.clone().unwrap();
        assert_eq!(link.href, "https://a.b/?x=1&y=2");
        assert_eq!(link.target.as_deref(), Some("_blank"));
        assert_eq!(link.rel, None);
    }

    #[test]
    fn test_quote_and_headings() {
        let doc = parse_html("<h2>T</h2><blockquote><p>q</p><ol><li><p>i</p></li></ol></blockquote><p>after</p>");
        let blocks = doc.blocks();
        assert_eq!(blocks[0].kind, BlockKind::Heading(2));
        assert!(blocks[1].quoted);
        assert_eq!(blocks[2].kind, BlockKind::OrderedItem);
        assert!(blocks[2].quoted);
        assert!(!blocks[3].quoted);
    }

    #[test]
    fn test_own_output_reads_back() {
        let html = "<h1>Title</h1><p>Some <strong>bold <em>mixed</em></strong> text<br>next line</p>\
                    <ul><li><p>a</p></li><li><p>b</p></li></ul>\
                    <blockquote><p><a target=\"_blank\" rel=\"noopener noreferrer nofollow\" href=\"https://x.y\">link</a></p></blockquote>\
                    <p></p>";
        let doc = parse_html(html);
        assert_eq!(render_html(&Node::from_document(&doc)), html);
    }
}
