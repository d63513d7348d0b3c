//! Text helpers shared by command execution and state queries.

use std::ops::Range;

use crate::document::RichDocument;

/// Find the start of the word ending at `offset` within one block's chars.
pub fn find_word_start(chars: &[char], offset: usize) -> usize {
    let mut start = offset.min(chars.len());
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    start
}

/// Characters stripped from the end of an autolink candidate.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"'];

/// If `word` looks like a bare URL, return the href it should link to.
///
/// `www.` hosts get an `http://` scheme.
pub fn autolink_href(word: &str) -> Option<String> {
    if word.is_empty() || word.contains(char::is_whitespace) {
        return None;
    }
    for scheme in ["https://", "http://"] {
        if let Some(rest) = word.strip_prefix(scheme) {
            return (!rest.is_empty() && !rest.starts_with('/')).then(|| word.to_owned());
        }
    }
    let host = word.strip_prefix("www.")?;
    let dot = host.find('.')?;
    (dot > 0 && dot + 1 < host.len()).then(|| format!("http://{word}"))
}

/// The URL-like word that ends at document offset `end`, with trailing
/// punctuation trimmed. Returns the document range and the href.
pub fn autolink_candidate(doc: &RichDocument, end: usize) -> Option<(Range<usize>, String)> {
    let (b, local_end) = doc.locate(end);
    let chars: Vec<char> = doc.blocks()[b].text().chars().collect();
    let mut local_end = local_end.min(chars.len());
    let local_start = find_word_start(&chars, local_end);
    while local_end > local_start && TRAILING_PUNCTUATION.contains(&chars[local_end - 1]) {
        local_end -= 1;
    }
    let word: String = chars[local_start..local_end].iter().collect();
    let href = autolink_href(&word)?;
    let base = doc.block_start(b);
    Some((base + local_start..base + local_end, href))
}

/// Number of characters in a document, excluding block boundaries.
pub fn character_count(doc: &RichDocument) -> usize {
    doc.blocks().iter().map(|b| b.len_chars()).sum()
}

/// Number of whitespace-separated words. Hard breaks separate words too.
pub fn word_count(doc: &RichDocument) -> usize {
    doc.blocks()
        .iter()
        .map(|b| b.text().split_whitespace().count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::paragraph;

    #[test]
    fn test_autolink_href() {
        assert_eq!(autolink_href("https://a.io").as_deref(), Some("https://a.io"));
        assert_eq!(autolink_href("http://x/y?z").as_deref(), Some("http://x/y?z"));
        assert_eq!(
            autolink_href("www.example.com").as_deref(),
            Some("http://www.example.com")
        );
        assert_eq!(autolink_href("https://"), None);
        assert_eq!(autolink_href("www.com"), None);
        assert_eq!(autolink_href("www."), None);
        assert_eq!(autolink_href("example.com"), None);
        assert_eq!(autolink_href("ftp://files"), None);
    }

    #[test]
    fn test_autolink_candidate_trims_punctuation() {
        let doc = RichDocument::from_blocks(vec![
            paragraph("first"),
            paragraph("see https://a.io/x."),
        ]);
        // block 1 starts at 6; the word ends at 6 + 19
        let (range, href) = autolink_candidate(&doc, 25).unwrap();
        assert_eq!(href, "https://a.io/x");
        assert_eq!(range, 10..24);
        assert!(autolink_candidate(&doc, 9).is_none());
    }

    #[test]
    fn test_counts() {
        let doc = RichDocument::from_blocks(vec![
            paragraph("two words"),
            paragraph("three\nmore words"),
        ]);
        assert_eq!(character_count(&doc), 25);
        assert_eq!(word_count(&doc), 5);
        assert_eq!(word_count(&RichDocument::new()), 0);
    }
}
