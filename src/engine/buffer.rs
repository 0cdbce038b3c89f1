//! The input buffer. Holds the source text and offers position-anchored
//! matching, made its own type rather than passed around as a bare `&str`
//! since every rule method needs the same small set of anchored operations.

use regex::Regex;

use crate::span::Span;

/// The source text, addressed by byte position.
#[derive(Clone, Copy, Debug)]
pub struct Buffer<'a> {
    source: &'a str,
}

impl<'a> Buffer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn is_eof(&self, pos: usize) -> bool {
        pos >= self.source.len()
    }

    /// True at position 0, or when the previous character is a newline.
    pub fn is_bol(&self, pos: usize) -> bool {
        pos == 0 || self.source.as_bytes().get(pos - 1) == Some(&b'\n')
    }

    pub fn at(&self, pos: usize) -> Option<char> {
        self.source.get(pos..)?.chars().next()
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.source[span.into_range()]
    }

    /// Matches a literal string at exactly `pos`, with no whitespace
    /// skipping.
    pub fn match_literal(&self, pos: usize, literal: &str) -> Option<usize> {
        self.source
            .get(pos..)?
            .starts_with(literal)
            .then_some(pos + literal.len())
    }

    /// Matches a literal string at `pos`, ignoring ASCII case.
    pub fn match_literal_ci(&self, pos: usize, literal: &str) -> Option<usize> {
        let rest = self.source.get(pos..)?;
        let candidate = rest.get(..literal.len())?;
        candidate
            .eq_ignore_ascii_case(literal)
            .then_some(pos + literal.len())
    }

    /// Matches one character from the given predicate.
    pub fn match_char(&self, pos: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
        let c = self.at(pos)?;
        pred(c).then_some(pos + c.len_utf8())
    }

    /// Matches `re` anchored at exactly `pos` — the match must start at
    /// offset 0 of `source[pos..]`; no implicit whitespace skipping and no
    /// "search forward" behavior.
    pub fn match_regex(&self, pos: usize, re: &Regex) -> Option<(usize, &'a str)> {
        let rest = self.source.get(pos..)?;
        let m = re.find(rest)?;
        if m.start() == 0 {
            Some((pos + m.end(), &rest[..m.end()]))
        } else {
            None
        }
    }

    /// The byte offset of the next newline at or after `pos`, or the end of
    /// the source if none remains. Every block-level production needs its
    /// current line's bounds at least once, so this uses `memchr` rather
    /// than `str::find`.
    pub fn line_end(&self, pos: usize) -> usize {
        memchr::memchr(b'\n', self.source[pos..].as_bytes()).map_or(self.source.len(), |n| pos + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_regex_refuses_unanchored_hits() {
        let buf = Buffer::new("ab123");
        let re = Regex::new(r"[0-9]+").unwrap();
        assert_eq!(buf.match_regex(0, &re), None);
        assert_eq!(buf.match_regex(2, &re), Some((5, "123")));
    }

    #[test]
    fn is_bol_tracks_newlines() {
        let buf = Buffer::new("a\nb");
        assert!(buf.is_bol(0));
        assert!(!buf.is_bol(1));
        assert!(buf.is_bol(2));
    }
}
